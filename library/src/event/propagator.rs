//! Reverse-dataflow event propagation.

use std::collections::VecDeque;

use log::{trace, warn};

use crate::error::EngineError;
use crate::event::Event;
use crate::model::link::PropertyPath;
use crate::network::ProcessorNetwork;

/// Walk the event upstream from `entry` (normally a canvas sink), visiting
/// each reachable processor once in breadth-first order. Delivery stops as
/// soon as a handler marks the event used. Property changes made by handlers
/// are routed through the network so links and invalidation fire.
pub fn propagate_event(
    network: &mut ProcessorNetwork,
    entry: &str,
    event: &mut Event,
) -> Result<(), EngineError> {
    if network.processor(entry).is_none() {
        return Err(EngineError::ProcessorNotFound(entry.to_string()));
    }

    let mut queue = VecDeque::new();
    queue.push_back(entry.to_string());

    while let Some(identifier) = queue.pop_front() {
        if !event.mark_visited(&identifier) {
            continue;
        }
        trace!("delivering event to '{}'", identifier);
        let changes = match network.processor_mut(&identifier) {
            Some(processor) => processor.deliver_event(event),
            None => continue,
        };
        // A handler asking for an impossible write (bad path, read-only
        // target) must not abort the traversal with earlier changes already
        // applied.
        for (path, value) in changes {
            let path = PropertyPath::new(identifier.clone(), path);
            if let Err(e) = network.set_property(&path, value) {
                warn!("event handler update {} failed: {}", path, e);
            }
        }
        if event.has_been_used() {
            trace!("event consumed by '{}'", identifier);
            break;
        }
        for upstream in network.predecessors(&identifier) {
            queue.push_back(upstream);
        }
    }
    Ok(())
}

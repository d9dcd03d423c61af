//! The processor network: processors, connections and property links, plus
//! the invalidation and link propagation that keeps them consistent.
//!
//! The network is the single mutation point. Property writes go through
//! [`ProcessorNetwork::set_property`] so that range clamping, link
//! propagation and invalidation always fire together; topology edits go
//! through the `add_*`/`remove_*` methods so observers stay in sync.

pub mod evaluator;
pub mod lock;
pub mod observer;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use log::{debug, warn};

use crate::error::EngineError;
use crate::model::link::{
    IdentifierMatchCondition, IdentityConverter, LinkCondition, LinkConverter, NumericConverter,
    PropertyLink, PropertyPath, TypeMatchCondition,
};
use crate::model::port::{PortData, PortType};
use crate::model::property::{InvalidationLevel, Property, PropertyValue};
use crate::model::Connection;
use crate::processor::Processor;

pub use evaluator::{ContextManager, EvaluationSummary, NetworkEvaluator, NoContext};
pub use lock::NetworkLock;
pub use observer::NetworkObserver;

use observer::NetworkEvent;

/// A directed dataflow graph of processors.
pub struct ProcessorNetwork {
    processors: HashMap<String, Processor>,
    /// Insertion order of processor identifiers; the deterministic tie-break
    /// for topological sorting.
    order: Vec<String>,
    connections: Vec<Connection>,
    links: Vec<PropertyLink>,
    converters: Vec<Box<dyn LinkConverter>>,
    conditions: Vec<Box<dyn LinkCondition>>,
    observers: Vec<Arc<dyn NetworkObserver>>,
    locked: u32,
    pending: Vec<NetworkEvent>,
    evaluation_requested: bool,
    evaluating: bool,
}

impl Default for ProcessorNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorNetwork {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
            order: Vec::new(),
            connections: Vec::new(),
            links: Vec::new(),
            converters: vec![Box::new(IdentityConverter), Box::new(NumericConverter)],
            conditions: vec![Box::new(TypeMatchCondition)],
            observers: Vec::new(),
            locked: 0,
            pending: Vec::new(),
            evaluation_requested: false,
            evaluating: false,
        }
    }

    // ---- observers & link registries -------------------------------------

    pub fn add_observer(&mut self, observer: Arc<dyn NetworkObserver>) {
        self.observers.push(observer);
    }

    /// Converters are consulted in registration order; later registrations
    /// act as fallbacks.
    pub fn register_converter(&mut self, converter: Box<dyn LinkConverter>) {
        self.converters.push(converter);
    }

    /// A link is admitted if any registered condition approves it.
    pub fn register_condition(&mut self, condition: Box<dyn LinkCondition>) {
        self.conditions.push(condition);
    }

    // ---- processors ------------------------------------------------------

    pub fn add_processor(&mut self, processor: Processor) -> Result<(), EngineError> {
        let identifier = processor.identifier().to_string();
        if self.processors.contains_key(&identifier) {
            return Err(EngineError::DuplicateIdentifier(identifier));
        }
        debug!("adding processor '{}'", identifier);
        self.order.push(identifier.clone());
        self.processors.insert(identifier.clone(), processor);
        self.notify(NetworkEvent::ProcessorAdded(identifier));
        self.request_evaluate();
        Ok(())
    }

    /// Remove a processor, cascading removal of every connection and link
    /// touching it.
    pub fn remove_processor(&mut self, identifier: &str) -> Result<Processor, EngineError> {
        if !self.processors.contains_key(identifier) {
            return Err(EngineError::ProcessorNotFound(identifier.to_string()));
        }
        let stale: Vec<Connection> = self
            .connections
            .iter()
            .filter(|c| c.touches(identifier))
            .cloned()
            .collect();
        for connection in &stale {
            self.remove_connection(connection);
        }
        let stale_links: Vec<PropertyLink> = self
            .links
            .iter()
            .filter(|l| l.touches(identifier))
            .cloned()
            .collect();
        for link in &stale_links {
            self.remove_link(link);
        }
        self.order.retain(|id| id != identifier);
        let processor = self
            .processors
            .remove(identifier)
            .expect("presence checked above");
        debug!("removed processor '{}'", identifier);
        self.notify(NetworkEvent::ProcessorRemoved(identifier.to_string()));
        self.request_evaluate();
        Ok(processor)
    }

    pub fn processor(&self, identifier: &str) -> Option<&Processor> {
        self.processors.get(identifier)
    }

    pub(crate) fn processor_mut(&mut self, identifier: &str) -> Option<&mut Processor> {
        self.processors.get_mut(identifier)
    }

    /// Processors in creation order.
    pub fn processors(&self) -> impl Iterator<Item = &Processor> {
        self.order.iter().filter_map(|id| self.processors.get(id))
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    pub fn property(&self, path: &PropertyPath) -> Option<&Property> {
        self.processors
            .get(&path.processor)
            .and_then(|p| p.property(&path.property))
    }

    /// Remove every processor (and with them all connections and links).
    pub fn clear(&mut self) {
        let guard_needed = self.locked == 0;
        if guard_needed {
            self.lock_raw();
        }
        let identifiers = self.order.clone();
        for identifier in identifiers.iter().rev() {
            let _ = self.remove_processor(identifier);
        }
        if guard_needed {
            self.unlock_raw();
        }
    }

    // ---- connections -----------------------------------------------------

    /// Add a dataflow connection after validating existence, type
    /// compatibility, single-input occupancy and acyclicity. Adding an
    /// already-present connection is a no-op.
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), EngineError> {
        if self.connections.contains(&connection) {
            debug!("connection {} -> {} already present", connection.from, connection.to);
            return Ok(());
        }
        let from = &connection.from;
        let to = &connection.to;
        let src = self
            .processors
            .get(&from.processor)
            .ok_or_else(|| EngineError::ProcessorNotFound(from.processor.clone()))?;
        let dst = self
            .processors
            .get(&to.processor)
            .ok_or_else(|| EngineError::ProcessorNotFound(to.processor.clone()))?;
        let outport = src
            .outport(&from.port)
            .ok_or_else(|| EngineError::PortNotFound(from.to_string()))?;
        let inport = dst
            .inport(&to.port)
            .ok_or_else(|| EngineError::PortNotFound(to.to_string()))?;

        if !PortType::accepts(outport.port_type(), inport.port_type()) {
            return Err(EngineError::IncompatiblePort(
                from.to_string(),
                to.to_string(),
            ));
        }
        if !inport.is_multi() && self.connections.iter().any(|c| c.to == *to) {
            return Err(EngineError::PortOccupied(to.to_string()));
        }
        if from.processor == to.processor || self.reaches(&to.processor, &from.processor) {
            return Err(EngineError::CyclicConnection(
                from.processor.clone(),
                to.processor.clone(),
            ));
        }

        debug!("connecting {} -> {}", from, to);
        let to_processor = to.processor.clone();
        let to_port = to.port.clone();
        self.connections.push(connection.clone());
        if let Some(port) = self
            .processors
            .get_mut(&to_processor)
            .and_then(|p| p.inport_mut(&to_port))
        {
            port.set_changed(true);
        }
        let _ = self.invalidate(&to_processor, InvalidationLevel::InvalidOutput);
        self.notify(NetworkEvent::ConnectionAdded(connection));
        self.request_evaluate();
        Ok(())
    }

    /// Remove a connection; returns whether it existed. The destination is
    /// invalidated since its input set changed.
    pub fn remove_connection(&mut self, connection: &Connection) -> bool {
        let Some(index) = self.connections.iter().position(|c| c == connection) else {
            return false;
        };
        let removed = self.connections.remove(index);
        debug!("disconnecting {} -> {}", removed.from, removed.to);
        let to = removed.to.clone();
        if let Some(port) = self
            .processors
            .get_mut(&to.processor)
            .and_then(|p| p.inport_mut(&to.port))
        {
            port.set_changed(true);
        }
        let _ = self.invalidate(&to.processor, InvalidationLevel::InvalidOutput);
        self.notify(NetworkEvent::ConnectionRemoved(removed));
        self.request_evaluate();
        true
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Whether `to` is reachable from `from` along dataflow connections.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut queue = VecDeque::from([from.to_string()]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            for c in &self.connections {
                if c.from.processor == current {
                    queue.push_back(c.to.processor.clone());
                }
            }
        }
        false
    }

    /// Distinct upstream processors of `identifier`, in connection order.
    pub fn predecessors(&self, identifier: &str) -> Vec<String> {
        let mut result = Vec::new();
        for c in &self.connections {
            if c.to.processor == identifier && !result.contains(&c.from.processor) {
                result.push(c.from.processor.clone());
            }
        }
        result
    }

    /// Distinct downstream processors of `identifier`, in connection order.
    pub fn successors(&self, identifier: &str) -> Vec<String> {
        let mut result = Vec::new();
        for c in &self.connections {
            if c.from.processor == identifier && !result.contains(&c.to.processor) {
                result.push(c.to.processor.clone());
            }
        }
        result
    }

    // ---- property links --------------------------------------------------

    /// Add a directed property link. At least one registered condition must
    /// approve the pair; the source value is pushed through immediately so
    /// linked properties never start out of sync.
    pub fn add_link(&mut self, link: PropertyLink) -> Result<(), EngineError> {
        if self.links.contains(&link) {
            return Ok(());
        }
        if link.src == link.dst {
            return Err(EngineError::LinkNotAllowed(
                link.src.to_string(),
                link.dst.to_string(),
            ));
        }
        let src = self
            .property(&link.src)
            .ok_or_else(|| EngineError::PropertyNotFound(link.src.to_string()))?;
        let dst = self
            .property(&link.dst)
            .ok_or_else(|| EngineError::PropertyNotFound(link.dst.to_string()))?;
        if !self
            .conditions
            .iter()
            .any(|c| c.can_link(&link.src, src, &link.dst, dst))
        {
            return Err(EngineError::LinkNotAllowed(
                link.src.to_string(),
                link.dst.to_string(),
            ));
        }

        debug!("linking {} -> {}", link.src, link.dst);
        let initial = src.value().clone();
        self.links.push(link.clone());
        let mut visited = HashSet::from([link.src.clone()]);
        self.propagate_link_value(&link.src, &initial, &mut visited);
        self.notify(NetworkEvent::LinkAdded(link));
        self.request_evaluate();
        Ok(())
    }

    /// Remove a link; returns whether it existed. Values already propagated
    /// stay where they are.
    pub fn remove_link(&mut self, link: &PropertyLink) -> bool {
        let Some(index) = self.links.iter().position(|l| l == link) else {
            return false;
        };
        let removed = self.links.remove(index);
        debug!("unlinking {} -> {}", removed.src, removed.dst);
        self.notify(NetworkEvent::LinkRemoved(removed));
        true
    }

    pub fn links(&self) -> &[PropertyLink] {
        &self.links
    }

    /// Create bidirectional links between every pair of properties on the
    /// two processors whose identifiers match on the leaf segment and whose
    /// values are of the same kind. Returns the number of links created.
    pub fn auto_link(&mut self, src: &str, dst: &str) -> Result<usize, EngineError> {
        let src_paths = self.leaf_paths(src)?;
        let dst_paths = self.leaf_paths(dst)?;
        let condition = IdentifierMatchCondition;
        let mut created = 0;
        for sp in &src_paths {
            for dp in &dst_paths {
                let s_path = PropertyPath::new(src, sp.clone());
                let d_path = PropertyPath::new(dst, dp.clone());
                let (Some(s), Some(d)) = (self.property(&s_path), self.property(&d_path)) else {
                    continue;
                };
                if !condition.can_link(&s_path, s, &d_path, d) {
                    continue;
                }
                let forward = PropertyLink::new(s_path.clone(), d_path.clone());
                if !self.links.contains(&forward) && self.add_link(forward).is_ok() {
                    created += 1;
                }
                let backward = PropertyLink::new(d_path, s_path);
                if !self.links.contains(&backward) && self.add_link(backward).is_ok() {
                    created += 1;
                }
            }
        }
        Ok(created)
    }

    /// Sorted dotted paths of all serializable leaf properties.
    fn leaf_paths(&self, identifier: &str) -> Result<Vec<String>, EngineError> {
        let processor = self
            .processors
            .get(identifier)
            .ok_or_else(|| EngineError::ProcessorNotFound(identifier.to_string()))?;
        let mut values = HashMap::new();
        for property in processor.properties() {
            property.flatten_into("", &mut values);
        }
        let mut paths: Vec<String> = values.into_keys().collect();
        paths.sort_unstable();
        Ok(paths)
    }

    // ---- property mutation -----------------------------------------------

    /// Set a property value. This is the one write path: the value is
    /// clamped, linked properties are updated transitively, the owning
    /// processor is invalidated at the property's level and an evaluation is
    /// requested. Returns `false` without side effects if the stored value
    /// did not change.
    pub fn set_property(
        &mut self,
        path: &PropertyPath,
        value: PropertyValue,
    ) -> Result<bool, EngineError> {
        let (changed, level, new_value) = {
            let processor = self
                .processors
                .get_mut(&path.processor)
                .ok_or_else(|| EngineError::ProcessorNotFound(path.processor.clone()))?;
            let property = processor
                .property_mut(&path.property)
                .ok_or_else(|| EngineError::PropertyNotFound(path.to_string()))?;
            if property.is_read_only() {
                return Err(EngineError::ReadOnlyProperty(path.to_string()));
            }
            let changed = property.set_value(value);
            (changed, property.invalidation_level(), property.value().clone())
        };
        if !changed {
            return Ok(false);
        }
        self.invalidate(&path.processor, level)?;
        let mut visited = HashSet::from([path.clone()]);
        self.propagate_link_value(path, &new_value, &mut visited);
        self.request_evaluate();
        Ok(true)
    }

    /// Push a value across all links leaving `src`. Each property is visited
    /// at most once, which makes circular link chains (the common
    /// bidirectional pair included) terminate.
    fn propagate_link_value(
        &mut self,
        src: &PropertyPath,
        value: &PropertyValue,
        visited: &mut HashSet<PropertyPath>,
    ) {
        let targets: Vec<PropertyPath> = self
            .links
            .iter()
            .filter(|l| &l.src == src)
            .map(|l| l.dst.clone())
            .collect();
        for dst in targets {
            if !visited.insert(dst.clone()) {
                continue;
            }
            let Some(current) = self.property(&dst).map(|p| p.value().clone()) else {
                warn!("link target {} no longer exists", dst);
                continue;
            };
            let Some(converter) = self
                .converters
                .iter()
                .find(|c| c.can_convert(value, &current))
            else {
                debug!(
                    "no converter from {} to {} for link target {}",
                    value.kind_name(),
                    current.kind_name(),
                    dst
                );
                continue;
            };
            let converted = match converter.convert(value, &current) {
                Ok(v) => v,
                Err(e) => {
                    warn!("link conversion to {} failed: {}", dst, e);
                    continue;
                }
            };
            let (changed, level, propagated) = {
                let Some(property) = self
                    .processors
                    .get_mut(&dst.processor)
                    .and_then(|p| p.property_mut(&dst.property))
                else {
                    continue;
                };
                if property.is_read_only() {
                    debug!("link target {} is read-only, skipping", dst);
                    continue;
                }
                let changed = property.set_value(converted);
                (changed, property.invalidation_level(), property.value().clone())
            };
            if !changed {
                continue;
            }
            let _ = self.invalidate(&dst.processor, level);
            self.propagate_link_value(&dst, &propagated, visited);
        }
    }

    // ---- invalidation ----------------------------------------------------

    /// Raise the invalidation level of a processor and propagate
    /// `InvalidOutput` to everything downstream, marking the inports fed by
    /// the invalidated outports as changed. Propagation over a node stops
    /// when its level did not actually increase, so diamonds and repeated
    /// invalidations terminate.
    pub fn invalidate(
        &mut self,
        identifier: &str,
        level: InvalidationLevel,
    ) -> Result<(), EngineError> {
        if !self.processors.contains_key(identifier) {
            return Err(EngineError::ProcessorNotFound(identifier.to_string()));
        }
        let mut queue = VecDeque::from([(identifier.to_string(), level)]);
        while let Some((id, level)) = queue.pop_front() {
            let raised = self
                .processors
                .get_mut(&id)
                .map(|p| p.invalidate(level))
                .unwrap_or(false);
            if !raised {
                continue;
            }
            self.notify(NetworkEvent::ProcessorInvalidated(id.clone(), level));
            let downstream: Vec<(String, String)> = self
                .connections
                .iter()
                .filter(|c| c.from.processor == id)
                .map(|c| (c.to.processor.clone(), c.to.port.clone()))
                .collect();
            for (processor, port) in downstream {
                if let Some(inport) = self
                    .processors
                    .get_mut(&processor)
                    .and_then(|p| p.inport_mut(&port))
                {
                    inport.set_changed(true);
                }
                queue.push_back((processor, InvalidationLevel::InvalidOutput));
            }
        }
        Ok(())
    }

    // ---- scheduling ------------------------------------------------------

    /// Deterministic topological order: among all processors whose upstream
    /// edges are satisfied, the one created first goes next. Fails if the
    /// connection graph contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<String>, EngineError> {
        let mut indegree: HashMap<&str, usize> = self
            .order
            .iter()
            .map(|id| (id.as_str(), 0))
            .collect();
        for c in &self.connections {
            if let Some(d) = indegree.get_mut(c.to.processor.as_str()) {
                *d += 1;
            }
        }
        let mut remaining: Vec<&str> = self.order.iter().map(|s| s.as_str()).collect();
        let mut result = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let Some(pos) = remaining
                .iter()
                .position(|id| indegree.get(id).copied().unwrap_or(0) == 0)
            else {
                let stuck = remaining[0].to_string();
                let upstream = self
                    .predecessors(&stuck)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| stuck.clone());
                return Err(EngineError::CyclicConnection(upstream, stuck));
            };
            let id = remaining.remove(pos);
            for c in &self.connections {
                if c.from.processor == id {
                    if let Some(d) = indegree.get_mut(c.to.processor.as_str()) {
                        *d = d.saturating_sub(1);
                    }
                }
            }
            result.push(id.to_string());
        }
        Ok(result)
    }

    /// A processor is ready when every non-optional inport is connected and
    /// every connected inport sees data on all of its source outports.
    pub fn is_ready(&self, identifier: &str) -> bool {
        let Some(processor) = self.processors.get(identifier) else {
            return false;
        };
        processor.inports().iter().all(|inport| {
            let sources: Vec<&Connection> = self
                .connections
                .iter()
                .filter(|c| c.to.processor == identifier && c.to.port == inport.identifier())
                .collect();
            if sources.is_empty() {
                return inport.is_optional();
            }
            sources.iter().all(|c| {
                self.processors
                    .get(&c.from.processor)
                    .and_then(|p| p.outport(&c.from.port))
                    .map(|o| o.has_data())
                    .unwrap_or(false)
            })
        })
    }

    /// Data handles feeding each inport of `identifier`, in connection
    /// order. Handles are `Arc` clones of whatever the source outports hold.
    pub(crate) fn gather_inputs(
        &self,
        identifier: &str,
    ) -> HashMap<String, Vec<Arc<PortData>>> {
        let mut inputs: HashMap<String, Vec<Arc<PortData>>> = HashMap::new();
        for c in &self.connections {
            if c.to.processor != identifier {
                continue;
            }
            if let Some(data) = self
                .processors
                .get(&c.from.processor)
                .and_then(|p| p.outport(&c.from.port))
                .and_then(|o| o.data())
            {
                inputs
                    .entry(c.to.port.clone())
                    .or_default()
                    .push(Arc::clone(data));
            }
        }
        inputs
    }

    /// Flag the inports fed by `identifier` as carrying fresh data.
    pub(crate) fn mark_downstream_changed(&mut self, identifier: &str) {
        let downstream: Vec<(String, String)> = self
            .connections
            .iter()
            .filter(|c| c.from.processor == identifier)
            .map(|c| (c.to.processor.clone(), c.to.port.clone()))
            .collect();
        for (processor, port) in downstream {
            if let Some(inport) = self
                .processors
                .get_mut(&processor)
                .and_then(|p| p.inport_mut(&port))
            {
                inport.set_changed(true);
            }
        }
    }

    // ---- locking & notifications -----------------------------------------

    /// Batch modifications: notifications queue up while the guard lives and
    /// flush, deduplicated for evaluation requests, when it drops.
    pub fn lock(&mut self) -> NetworkLock<'_> {
        NetworkLock::new(self)
    }

    pub fn is_locked(&self) -> bool {
        self.locked > 0
    }

    pub(crate) fn lock_raw(&mut self) {
        self.locked += 1;
    }

    pub(crate) fn unlock_raw(&mut self) {
        debug_assert!(self.locked > 0, "unbalanced network unlock");
        self.locked = self.locked.saturating_sub(1);
        if self.locked == 0 {
            let pending = std::mem::take(&mut self.pending);
            for event in &pending {
                self.dispatch(event);
            }
        }
    }

    fn notify(&mut self, event: NetworkEvent) {
        if self.locked > 0 {
            if event == NetworkEvent::EvaluationRequested && self.pending.contains(&event) {
                return;
            }
            self.pending.push(event);
        } else {
            self.dispatch(&event);
        }
    }

    fn dispatch(&self, event: &NetworkEvent) {
        for observer in &self.observers {
            match event {
                NetworkEvent::ProcessorAdded(id) => observer.on_processor_added(id),
                NetworkEvent::ProcessorRemoved(id) => observer.on_processor_removed(id),
                NetworkEvent::ConnectionAdded(c) => observer.on_connection_added(c),
                NetworkEvent::ConnectionRemoved(c) => observer.on_connection_removed(c),
                NetworkEvent::LinkAdded(l) => observer.on_link_added(l),
                NetworkEvent::LinkRemoved(l) => observer.on_link_removed(l),
                NetworkEvent::ProcessorInvalidated(id, level) => {
                    observer.on_processor_invalidated(id, *level)
                }
                NetworkEvent::EvaluationRequested => observer.on_evaluation_requested(),
            }
        }
    }

    // ---- evaluation bookkeeping ------------------------------------------

    /// Ask for an evaluation pass. During a running pass only the flag is
    /// raised; the evaluator re-announces it when the pass finishes.
    pub fn request_evaluate(&mut self) {
        self.evaluation_requested = true;
        if !self.evaluating {
            self.notify(NetworkEvent::EvaluationRequested);
        }
    }

    pub fn evaluation_requested(&self) -> bool {
        self.evaluation_requested
    }

    pub(crate) fn begin_evaluation(&mut self) {
        self.evaluating = true;
        self.evaluation_requested = false;
    }

    /// Returns whether a new evaluation was requested during the pass.
    pub(crate) fn end_evaluation(&mut self) -> bool {
        self.evaluating = false;
        if self.evaluation_requested {
            self.notify(NetworkEvent::EvaluationRequested);
        }
        self.evaluation_requested
    }

    pub(crate) fn notify_evaluation_done(&self, summary: &EvaluationSummary) {
        for observer in &self.observers {
            observer.on_evaluation_done(summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::port::PortAddress;
    use crate::processor::basics;

    fn connection(from: (&str, &str), to: (&str, &str)) -> Connection {
        Connection::new(PortAddress::new(from.0, from.1), PortAddress::new(to.0, to.1))
    }

    #[test]
    fn topological_order_breaks_ties_by_creation_order() {
        let mut network = ProcessorNetwork::new();
        network.add_processor(basics::source("b")).unwrap();
        network.add_processor(basics::source("a")).unwrap();
        network.add_processor(basics::mix("m")).unwrap();
        network
            .add_connection(connection(("a", "out"), ("m", "in")))
            .unwrap();
        network
            .add_connection(connection(("b", "out"), ("m", "in")))
            .unwrap();
        // "b" was created before "a", so it sorts first despite the name.
        assert_eq!(network.topological_order().unwrap(), ["b", "a", "m"]);
    }

    #[test]
    fn cycle_is_rejected_at_connect_time() {
        let mut network = ProcessorNetwork::new();
        network.add_processor(basics::gain("g1")).unwrap();
        network.add_processor(basics::gain("g2")).unwrap();
        network
            .add_connection(connection(("g1", "out"), ("g2", "in")))
            .unwrap();
        let err = network
            .add_connection(connection(("g2", "out"), ("g1", "in")))
            .unwrap_err();
        assert!(matches!(err, EngineError::CyclicConnection(_, _)));
        // The failed attempt left no edge behind.
        assert_eq!(network.connections().len(), 1);
    }

    #[test]
    fn single_input_port_rejects_second_connection() {
        let mut network = ProcessorNetwork::new();
        network.add_processor(basics::source("s1")).unwrap();
        network.add_processor(basics::source("s2")).unwrap();
        network.add_processor(basics::gain("g")).unwrap();
        network
            .add_connection(connection(("s1", "out"), ("g", "in")))
            .unwrap();
        let err = network
            .add_connection(connection(("s2", "out"), ("g", "in")))
            .unwrap_err();
        assert!(matches!(err, EngineError::PortOccupied(_)));
    }
}

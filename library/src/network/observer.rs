//! Observer interface for network topology and evaluation notifications.

use crate::model::property::InvalidationLevel;
use crate::model::{Connection, PropertyLink};
use crate::network::evaluator::EvaluationSummary;

/// Callbacks fired by the network on structural changes and evaluation
/// milestones. All methods default to no-ops so observers implement only
/// what they care about.
///
/// While the network is locked, notifications are queued and delivered in
/// order when the outermost lock is released; repeated evaluation requests
/// collapse into one.
pub trait NetworkObserver: Send + Sync {
    fn on_processor_added(&self, _identifier: &str) {}
    fn on_processor_removed(&self, _identifier: &str) {}
    fn on_connection_added(&self, _connection: &Connection) {}
    fn on_connection_removed(&self, _connection: &Connection) {}
    fn on_link_added(&self, _link: &PropertyLink) {}
    fn on_link_removed(&self, _link: &PropertyLink) {}
    fn on_processor_invalidated(&self, _identifier: &str, _level: InvalidationLevel) {}
    /// Something made the network dirty; an evaluation pass should run.
    fn on_evaluation_requested(&self) {}
    fn on_evaluation_done(&self, _summary: &EvaluationSummary) {}
}

/// Queued notification, replayed on unlock.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NetworkEvent {
    ProcessorAdded(String),
    ProcessorRemoved(String),
    ConnectionAdded(Connection),
    ConnectionRemoved(Connection),
    LinkAdded(PropertyLink),
    LinkRemoved(PropertyLink),
    ProcessorInvalidated(String, InvalidationLevel),
    EvaluationRequested,
}

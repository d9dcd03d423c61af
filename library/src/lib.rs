//! Dataflow evaluation engine for processor networks.
//!
//! A network is a directed acyclic graph of [`processor::Processor`]s whose
//! ports exchange immutable, reference-counted data handles and whose
//! properties can be linked across processors. Changes invalidate exactly
//! the affected downstream region; [`network::NetworkEvaluator`] then brings
//! the network back to a valid state with one deterministic topological
//! pass, re-running only what became invalid.

pub mod app;
pub mod error;
pub mod event;
pub mod model;
pub mod network;
pub mod picking;
pub mod processor;
pub mod util;

pub use app::EngineContext;
pub use error::EngineError;
pub use model::workspace::WorkspaceDocument;
pub use network::{EvaluationSummary, NetworkEvaluator, ProcessorNetwork};

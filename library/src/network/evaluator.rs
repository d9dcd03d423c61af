//! Topological network evaluation.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::error::EngineError;
use crate::model::link::PropertyPath;
use crate::model::property::PropertyValue;
use crate::network::ProcessorNetwork;
use crate::util::{Dispatcher, WorkerPool};

/// Rendering-context hook invoked around each `process()` call. On a GPU
/// deployment the implementation makes the right context current before a
/// processor touches its resources; the engine itself never talks to a
/// graphics API.
pub trait ContextManager: Send {
    fn activate(&mut self, processor: &str) -> Result<(), EngineError>;
    /// Called once per pass after the last processor ran.
    fn release(&mut self) {}
}

/// Headless default: every activation succeeds and does nothing.
#[derive(Default)]
pub struct NoContext;

impl ContextManager for NoContext {
    fn activate(&mut self, _processor: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

/// What one evaluation pass did, per processor.
#[derive(Debug, Clone, Default)]
pub struct EvaluationSummary {
    /// The full topological order the pass walked.
    pub order: Vec<String>,
    /// Processors whose kernels ran and succeeded.
    pub processed: Vec<String>,
    /// Valid processors with unchanged inputs; their kernels did not run.
    pub skipped: Vec<String>,
    /// Invalid processors missing required input data.
    pub not_ready: Vec<String>,
    /// Processors whose kernels returned an error, with the message.
    pub failed: Vec<(String, String)>,
    /// Whether something during the pass requested another one.
    pub rerun_requested: bool,
}

impl EvaluationSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.not_ready.is_empty()
    }
}

/// Walks the network in topological order, runs invalid processors and
/// publishes their outputs. Owns the optional background-work runtime handed
/// to kernels.
pub struct NetworkEvaluator {
    context: Box<dyn ContextManager>,
    pool: Option<Arc<WorkerPool>>,
    dispatcher: Option<Arc<Dispatcher>>,
}

impl Default for NetworkEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkEvaluator {
    pub fn new() -> Self {
        Self {
            context: Box::new(NoContext),
            pool: None,
            dispatcher: None,
        }
    }

    pub fn with_context(mut self, context: Box<dyn ContextManager>) -> Self {
        self.context = context;
        self
    }

    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Run one evaluation pass.
    ///
    /// Each processor is visited once, after all of its upstream processors.
    /// Valid processors with unchanged inports are skipped without running
    /// their kernels. A failing kernel leaves its previous outport data in
    /// place and the processor invalid; the rest of the pass continues.
    /// Property updates deferred by kernels are applied after the walk, so
    /// they invalidate for the next pass instead of re-entering this one.
    pub fn evaluate(
        &mut self,
        network: &mut ProcessorNetwork,
    ) -> Result<EvaluationSummary, EngineError> {
        let order = network.topological_order()?;
        network.begin_evaluation();

        let mut summary = EvaluationSummary {
            order: order.clone(),
            ..Default::default()
        };
        let mut deferred: Vec<(String, String, PropertyValue)> = Vec::new();

        for identifier in &order {
            let (valid, changed) = match network.processor(identifier) {
                Some(p) => (p.is_valid(), p.has_changed_inports()),
                None => continue,
            };
            if valid && !changed {
                summary.skipped.push(identifier.clone());
                continue;
            }
            if !network.is_ready(identifier) {
                warn!("processor '{}' is not ready, skipping", identifier);
                summary.not_ready.push(identifier.clone());
                continue;
            }

            let inputs = network.gather_inputs(identifier);
            // A failed context activation is contained like a failing
            // kernel; aborting here would leave the network flagged as
            // mid-evaluation forever.
            if let Err(e) = self.context.activate(identifier) {
                error!("context activation for '{}' failed: {}", identifier, e);
                summary.failed.push((identifier.clone(), e.to_string()));
                continue;
            }
            debug!("processing '{}'", identifier);
            let outcome = network
                .processor_mut(identifier)
                .expect("identifier from topological order")
                .run(inputs, self.pool.as_deref(), self.dispatcher.as_ref());

            match outcome {
                Ok(result) => {
                    let processor = network
                        .processor_mut(identifier)
                        .expect("identifier from topological order");
                    for (port, data) in result.outputs {
                        match processor.outport_mut(&port) {
                            Some(outport) => outport.set_data(data),
                            None => warn!(
                                "processor '{}' wrote to unknown outport '{}'",
                                identifier, port
                            ),
                        }
                    }
                    processor.set_valid();
                    network.mark_downstream_changed(identifier);
                    summary.processed.push(identifier.clone());
                    for (path, value) in result.deferred {
                        deferred.push((identifier.clone(), path, value));
                    }
                }
                Err(e) => {
                    error!("processor '{}' failed: {}", identifier, e);
                    summary.failed.push((identifier.clone(), e.to_string()));
                }
            }
        }
        self.context.release();

        for (processor, path, value) in deferred {
            let path = PropertyPath::new(processor, path);
            if let Err(e) = network.set_property(&path, value) {
                warn!("deferred property update {} failed: {}", path, e);
            }
        }

        summary.rerun_requested = network.end_evaluation();
        network.notify_evaluation_done(&summary);
        info!(
            "evaluation pass: {} processed, {} skipped, {} not ready, {} failed",
            summary.processed.len(),
            summary.skipped.len(),
            summary.not_ready.len(),
            summary.failed.len()
        );
        Ok(summary)
    }
}

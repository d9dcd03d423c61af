//! Engine context: the long-lived services a host application wires up once.

use std::sync::Arc;

use log::debug;

use crate::error::EngineError;
use crate::network::{NetworkEvaluator, ProcessorNetwork};
use crate::processor::basics;
use crate::processor::factory::ProcessorFactory;
use crate::util::{Dispatcher, PoolConfig, WorkerPool};

/// Bundles the processor factory, the cross-thread dispatcher and the
/// optional worker pool. One context typically lives as long as the host
/// application; networks and evaluators are cheap to create against it.
pub struct EngineContext {
    factory: ProcessorFactory,
    dispatcher: Arc<Dispatcher>,
    pool: Option<Arc<WorkerPool>>,
}

impl EngineContext {
    /// Full runtime: built-in processors registered and a worker pool sized
    /// by `config`.
    pub fn new(config: PoolConfig) -> Self {
        let mut context = Self::headless();
        context.pool = Some(Arc::new(WorkerPool::new(config)));
        context
    }

    /// No worker pool; pool-backed processors fall back to synchronous
    /// computation. Useful for tests and batch tools.
    pub fn headless() -> Self {
        let mut factory = ProcessorFactory::new();
        basics::register_basics(&mut factory);
        Self {
            factory,
            dispatcher: Arc::new(Dispatcher::new()),
            pool: None,
        }
    }

    pub fn factory(&self) -> &ProcessorFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ProcessorFactory {
        &mut self.factory
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn pool(&self) -> Option<&Arc<WorkerPool>> {
        self.pool.as_ref()
    }

    /// An evaluator wired to this context's dispatcher and pool.
    pub fn evaluator(&self) -> NetworkEvaluator {
        let mut evaluator = NetworkEvaluator::new().with_dispatcher(Arc::clone(&self.dispatcher));
        if let Some(pool) = &self.pool {
            evaluator = evaluator.with_pool(Arc::clone(pool));
        }
        evaluator
    }

    /// Evaluate repeatedly, draining dispatched background results between
    /// passes, until the network stops requesting evaluations or
    /// `max_passes` is reached. Does not wait for in-flight pool jobs; the
    /// caller decides when (and whether) to poll again.
    pub fn run_until_settled(
        &self,
        evaluator: &mut NetworkEvaluator,
        network: &mut ProcessorNetwork,
        max_passes: usize,
    ) -> Result<crate::network::EvaluationSummary, EngineError> {
        let mut summary = evaluator.evaluate(network)?;
        for pass in 1..max_passes {
            self.dispatcher.drain(network);
            if !network.evaluation_requested() {
                break;
            }
            debug!("network still dirty, starting pass {}", pass + 1);
            summary = evaluator.evaluate(network)?;
        }
        Ok(summary)
    }
}

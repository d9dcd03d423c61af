//! Processors: the computational nodes of the network.
//!
//! Concrete processor kinds implement [`ProcessorKernel`]; the [`Processor`]
//! container composes a kernel with the state every kind shares (ports,
//! property tree, invalidation level). There is no inheritance hierarchy —
//! reusable behavior lives in the container, per-kind behavior in the
//! kernel.

pub mod basics;
pub mod factory;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::event::Event;
use crate::model::port::{Inport, Outport, PortData};
use crate::model::property::{
    find_property, find_property_mut, InvalidationLevel, Property, PropertyValue,
};
use crate::util::{Dispatcher, WorkerPool};

/// Development maturity of a processor kind.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodeState {
    Experimental,
    Stable,
    Deprecated,
}

/// Static descriptor of a processor kind, used by the factory and the
/// workspace serializer.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorInfo {
    /// Reverse-DNS class identifier, e.g. `"org.flowvis.gain"`.
    pub class_identifier: String,
    pub display_name: String,
    pub category: String,
    pub code_state: CodeState,
    pub tags: Vec<String>,
}

impl ProcessorInfo {
    pub fn new(
        class_identifier: impl Into<String>,
        display_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            class_identifier: class_identifier.into(),
            display_name: display_name.into(),
            category: category.into(),
            code_state: CodeState::Stable,
            tags: Vec::new(),
        }
    }

    pub fn with_code_state(mut self, code_state: CodeState) -> Self {
        self.code_state = code_state;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Everything a kernel may touch during `process()`.
///
/// Inputs are cloned `Arc` handles gathered from connected outports before
/// the call; outputs and property updates are collected and applied by the
/// evaluator afterwards. Property updates are deliberately deferred: a
/// processor mutating properties mid-pass schedules the *next* pass instead
/// of recursing into the current one.
pub struct ProcessContext<'a> {
    identifier: &'a str,
    inputs: HashMap<String, Vec<Arc<PortData>>>,
    properties: &'a [Property],
    outputs: Vec<(String, Arc<PortData>)>,
    deferred: Vec<(String, PropertyValue)>,
    pool: Option<&'a WorkerPool>,
    dispatcher: Option<&'a Arc<Dispatcher>>,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(
        identifier: &'a str,
        inputs: HashMap<String, Vec<Arc<PortData>>>,
        properties: &'a [Property],
        pool: Option<&'a WorkerPool>,
        dispatcher: Option<&'a Arc<Dispatcher>>,
    ) -> Self {
        Self {
            identifier,
            inputs,
            properties,
            outputs: Vec::new(),
            deferred: Vec::new(),
            pool,
            dispatcher,
        }
    }

    pub fn identifier(&self) -> &str {
        self.identifier
    }

    /// First data handle on the given inport, if any.
    pub fn input(&self, port: &str) -> Option<&Arc<PortData>> {
        self.inputs.get(port).and_then(|v| v.first())
    }

    /// All data handles on a multi-inport, in connection order.
    pub fn inputs(&self, port: &str) -> &[Arc<PortData>] {
        self.inputs.get(port).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn property(&self, path: &str) -> Option<&PropertyValue> {
        find_property(self.properties, path).map(|p| p.value())
    }

    pub fn property_f64(&self, path: &str) -> Option<f64> {
        self.property(path).and_then(|v| v.as_f64())
    }

    pub fn property_i64(&self, path: &str) -> Option<i64> {
        self.property(path).and_then(|v| v.as_i64())
    }

    pub fn property_bool(&self, path: &str) -> Option<bool> {
        self.property(path).and_then(|v| v.as_bool())
    }

    /// Publish freshly computed data on an outport.
    pub fn set_output(&mut self, port: impl Into<String>, data: PortData) {
        self.outputs.push((port.into(), Arc::new(data)));
    }

    /// Publish an already-shared handle (pass-through without copying).
    pub fn set_output_handle(&mut self, port: impl Into<String>, data: Arc<PortData>) {
        self.outputs.push((port.into(), data));
    }

    /// Request a property change on this processor, applied after the pass.
    pub fn set_property_deferred(&mut self, path: impl Into<String>, value: PropertyValue) {
        self.deferred.push((path.into(), value));
    }

    pub fn pool(&self) -> Option<&'a WorkerPool> {
        self.pool
    }

    pub fn dispatcher(&self) -> Option<Arc<Dispatcher>> {
        self.dispatcher.map(Arc::clone)
    }

    fn into_outcome(self) -> ProcessOutcome {
        ProcessOutcome {
            outputs: self.outputs,
            deferred: self.deferred,
        }
    }
}

/// What a single `process()` call produced.
pub(crate) struct ProcessOutcome {
    pub outputs: Vec<(String, Arc<PortData>)>,
    pub deferred: Vec<(String, PropertyValue)>,
}

/// Property access handed to event handlers. Changes are collected and
/// routed through the network afterwards so links and invalidation fire.
pub struct EventContext<'a> {
    properties: &'a [Property],
    changes: Vec<(String, PropertyValue)>,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(properties: &'a [Property]) -> Self {
        Self {
            properties,
            changes: Vec::new(),
        }
    }

    pub fn property(&self, path: &str) -> Option<&PropertyValue> {
        find_property(self.properties, path).map(|p| p.value())
    }

    pub fn set_property(&mut self, path: impl Into<String>, value: PropertyValue) {
        self.changes.push((path.into(), value));
    }

    pub(crate) fn into_changes(self) -> Vec<(String, PropertyValue)> {
        self.changes
    }
}

/// The per-kind behavior of a processor.
pub trait ProcessorKernel: Send {
    /// Read inport data and property values, compute, publish outport data.
    fn process(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError>;

    /// Rebuild expensive resources. Called before `process()` when the
    /// processor was invalidated at `InvalidResources`.
    fn initialize_resources(&mut self, _ctx: &mut ProcessContext) -> Result<(), EngineError> {
        Ok(())
    }

    /// Handle an interaction event routed backwards through the network.
    /// Mark the event used to stop further propagation.
    fn on_event(&mut self, _event: &mut Event, _ctx: &mut EventContext<'_>) {}
}

/// A node in the network: identifier, owned ports and properties, an
/// invalidation state, and the kernel doing the actual work.
pub struct Processor {
    identifier: String,
    info: ProcessorInfo,
    inports: Vec<Inport>,
    outports: Vec<Outport>,
    properties: Vec<Property>,
    invalidation: InvalidationLevel,
    kernel: Box<dyn ProcessorKernel>,
}

impl Processor {
    pub fn new(
        identifier: impl Into<String>,
        info: ProcessorInfo,
        kernel: Box<dyn ProcessorKernel>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            info,
            inports: Vec::new(),
            outports: Vec::new(),
            properties: Vec::new(),
            // A fresh processor has never run: resources and output are both
            // missing.
            invalidation: InvalidationLevel::InvalidResources,
            kernel,
        }
    }

    pub fn with_inport(mut self, port: Inport) -> Self {
        self.inports.push(port);
        self
    }

    pub fn with_outport(mut self, port: Outport) -> Self {
        self.outports.push(port);
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn info(&self) -> &ProcessorInfo {
        &self.info
    }

    pub fn inports(&self) -> &[Inport] {
        &self.inports
    }

    pub fn outports(&self) -> &[Outport] {
        &self.outports
    }

    pub fn inport(&self, identifier: &str) -> Option<&Inport> {
        self.inports.iter().find(|p| p.identifier() == identifier)
    }

    pub fn outport(&self, identifier: &str) -> Option<&Outport> {
        self.outports.iter().find(|p| p.identifier() == identifier)
    }

    pub(crate) fn inport_mut(&mut self, identifier: &str) -> Option<&mut Inport> {
        self.inports
            .iter_mut()
            .find(|p| p.identifier() == identifier)
    }

    pub(crate) fn outport_mut(&mut self, identifier: &str) -> Option<&mut Outport> {
        self.outports
            .iter_mut()
            .find(|p| p.identifier() == identifier)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, path: &str) -> Option<&Property> {
        find_property(&self.properties, path)
    }

    /// Mutable property access. Only reachable while the processor is not
    /// yet owned by a network; afterwards all mutation goes through
    /// `ProcessorNetwork::set_property` so links and invalidation fire.
    pub fn property_mut(&mut self, path: &str) -> Option<&mut Property> {
        find_property_mut(&mut self.properties, path)
    }

    pub fn invalidation_level(&self) -> InvalidationLevel {
        self.invalidation
    }

    pub fn is_valid(&self) -> bool {
        self.invalidation == InvalidationLevel::Valid
    }

    /// A processor with no outports is a sink (canvas-like).
    pub fn is_sink(&self) -> bool {
        self.outports.is_empty()
    }

    /// Whether any inport saw fresh upstream data since the last validation.
    pub fn has_changed_inports(&self) -> bool {
        self.inports.iter().any(|p| p.is_changed())
    }

    /// Raise the invalidation state to `max(current, level)`. Returns `true`
    /// if the state actually increased; the monotonic max-merge is what
    /// terminates propagation over diamonds.
    pub(crate) fn invalidate(&mut self, level: InvalidationLevel) -> bool {
        if level <= self.invalidation {
            return false;
        }
        self.invalidation = level;
        for port in &mut self.outports {
            port.invalidate();
        }
        true
    }

    /// Mark this processor (and only this processor) as up to date.
    pub(crate) fn set_valid(&mut self) {
        self.invalidation = InvalidationLevel::Valid;
        for port in &mut self.inports {
            port.set_changed(false);
        }
        for port in &mut self.outports {
            port.set_valid();
        }
    }

    /// Run the kernel against pre-gathered inputs. Resources are rebuilt
    /// first when the invalidation level demands it.
    pub(crate) fn run(
        &mut self,
        inputs: HashMap<String, Vec<Arc<PortData>>>,
        pool: Option<&WorkerPool>,
        dispatcher: Option<&Arc<Dispatcher>>,
    ) -> Result<ProcessOutcome, EngineError> {
        let mut ctx = ProcessContext::new(
            &self.identifier,
            inputs,
            &self.properties,
            pool,
            dispatcher,
        );
        if self.invalidation == InvalidationLevel::InvalidResources {
            self.kernel.initialize_resources(&mut ctx)?;
        }
        self.kernel.process(&mut ctx)?;
        Ok(ctx.into_outcome())
    }

    /// Hand an event to the kernel; returns the property changes it
    /// requested.
    pub(crate) fn deliver_event(&mut self, event: &mut Event) -> Vec<(String, PropertyValue)> {
        let mut ctx = EventContext::new(&self.properties);
        self.kernel.on_event(event, &mut ctx);
        ctx.into_changes()
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("identifier", &self.identifier)
            .field("class", &self.info.class_identifier)
            .field("invalidation", &self.invalidation)
            .finish()
    }
}

//! Built-in processor kinds.
//!
//! These are deliberately small: a constant source, a gain stage, a mixer,
//! a canvas sink and a pool-backed async source. They exist so the CLI,
//! the workspace round-trip and the tests have factory-creatable types;
//! real visualization processors live in external modules and register
//! themselves the same way.

use crate::error::EngineError;
use crate::event::{Event, EventKind};
use crate::model::link::PropertyPath;
use crate::model::port::{Inport, Outport, PortData, PortType};
use crate::model::property::{InvalidationLevel, Property, PropertySerializationMode};
use crate::processor::factory::ProcessorFactory;
use crate::processor::{EventContext, ProcessContext, Processor, ProcessorInfo, ProcessorKernel};

pub const SOURCE_CLASS: &str = "org.flowvis.source";
pub const GAIN_CLASS: &str = "org.flowvis.gain";
pub const MIX_CLASS: &str = "org.flowvis.mix";
pub const CANVAS_CLASS: &str = "org.flowvis.canvas";
pub const ASYNC_SOURCE_CLASS: &str = "org.flowvis.asyncsource";

/// Register all built-in processor kinds.
pub fn register_basics(factory: &mut ProcessorFactory) {
    factory.register(SOURCE_CLASS, |id| source(id));
    factory.register(GAIN_CLASS, |id| gain(id));
    factory.register(MIX_CLASS, |id| mix(id));
    factory.register(CANVAS_CLASS, |id| canvas(id));
    factory.register(ASYNC_SOURCE_CLASS, |id| async_source(id));
}

/// Emits the value of its `value` property.
struct SourceKernel;

impl ProcessorKernel for SourceKernel {
    fn process(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError> {
        let value = ctx.property_f64("value").unwrap_or(0.0);
        ctx.set_output("out", PortData::Scalar(value));
        Ok(())
    }
}

pub fn source(identifier: &str) -> Processor {
    Processor::new(
        identifier,
        ProcessorInfo::new(SOURCE_CLASS, "Constant Source", "Sources"),
        Box::new(SourceKernel),
    )
    .with_outport(Outport::new("out", PortType::Scalar))
    .with_property(Property::new("value", "Value", 0.0))
}

/// Scales its input; the exponent is a resource-level property so changing
/// it forces `initialize_resources` before the next process.
struct GainKernel {
    exponent: f64,
}

impl ProcessorKernel for GainKernel {
    fn initialize_resources(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError> {
        self.exponent = ctx.property_f64("exponent").unwrap_or(1.0);
        Ok(())
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError> {
        let input = ctx
            .input("in")
            .and_then(|d| d.as_scalar())
            .ok_or_else(|| EngineError::process(ctx.identifier(), "no scalar input"))?;
        let gain = ctx.property_f64("gain").unwrap_or(1.0);
        ctx.set_output("out", PortData::Scalar((input * gain).powf(self.exponent)));
        Ok(())
    }

    fn on_event(&mut self, event: &mut Event, ctx: &mut EventContext<'_>) {
        if let EventKind::Wheel { delta, .. } = event.kind() {
            let delta = *delta;
            let gain = ctx.property("gain").and_then(|v| v.as_f64()).unwrap_or(1.0);
            ctx.set_property("gain", (gain + delta * 0.1).into());
            event.mark_used();
        }
    }
}

pub fn gain(identifier: &str) -> Processor {
    Processor::new(
        identifier,
        ProcessorInfo::new(GAIN_CLASS, "Gain", "Filters"),
        Box::new(GainKernel { exponent: 1.0 }),
    )
    .with_inport(Inport::new("in", PortType::Scalar))
    .with_outport(Outport::new("out", PortType::Scalar))
    .with_property(Property::new("gain", "Gain", 1.0))
    .with_property(
        Property::new("exponent", "Exponent", 1.0)
            .with_invalidation_level(InvalidationLevel::InvalidResources),
    )
}

/// Sums all handles on its multi-inport.
struct MixKernel;

impl ProcessorKernel for MixKernel {
    fn process(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError> {
        let sum: f64 = ctx
            .inputs("in")
            .iter()
            .filter_map(|d| d.as_scalar())
            .sum();
        ctx.set_output("out", PortData::Scalar(sum));
        Ok(())
    }
}

pub fn mix(identifier: &str) -> Processor {
    Processor::new(
        identifier,
        ProcessorInfo::new(MIX_CLASS, "Mix", "Filters"),
        Box::new(MixKernel),
    )
    .with_inport(Inport::new("in", PortType::Scalar).multi())
    .with_outport(Outport::new("out", PortType::Scalar))
}

/// End of the line: keeps the last handle it saw so a frontend can show it.
struct CanvasKernel {
    seen: Option<std::sync::Arc<PortData>>,
}

impl ProcessorKernel for CanvasKernel {
    fn process(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError> {
        self.seen = ctx.input("in").cloned();
        Ok(())
    }
}

pub fn canvas(identifier: &str) -> Processor {
    Processor::new(
        identifier,
        ProcessorInfo::new(CANVAS_CLASS, "Canvas", "Sinks"),
        Box::new(CanvasKernel { seen: None }),
    )
    .with_inport(Inport::new("in", PortType::Any))
}

/// Pool-backed source: computes `value * factor` on a worker thread and
/// publishes the result through the dispatcher, participating in the next
/// evaluation pass like any other processor.
struct AsyncSourceKernel {
    in_flight: Option<f64>,
}

impl ProcessorKernel for AsyncSourceKernel {
    fn process(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError> {
        let value = ctx.property_f64("value").unwrap_or(0.0);
        let factor = ctx.property_f64("factor").unwrap_or(2.0);

        // A finished computation for the current input is published as-is.
        if ctx.property_f64("result_for") == Some(value) {
            if let Some(result) = ctx.property_f64("result") {
                self.in_flight = None;
                ctx.set_output("out", PortData::Scalar(result));
                return Ok(());
            }
        }

        // A job for this input is already running; the outport keeps its
        // previous data until the result lands.
        if self.in_flight == Some(value) {
            return Ok(());
        }

        let identifier = ctx.identifier().to_string();
        match (ctx.pool(), ctx.dispatcher()) {
            (Some(pool), Some(dispatcher)) => {
                self.in_flight = Some(value);
                pool.submit(move |stop| {
                    if stop.is_stopped() {
                        return;
                    }
                    let computed = value * factor;
                    dispatcher.post(move |network| {
                        let _ = network.set_property(
                            &PropertyPath::new(identifier.clone(), "result"),
                            computed.into(),
                        );
                        let _ = network
                            .set_property(&PropertyPath::new(identifier, "result_for"), value.into());
                    });
                })?;
            }
            // No runtime wired up: degrade to a synchronous computation.
            _ => ctx.set_output("out", PortData::Scalar(value * factor)),
        }
        Ok(())
    }
}

pub fn async_source(identifier: &str) -> Processor {
    Processor::new(
        identifier,
        ProcessorInfo::new(ASYNC_SOURCE_CLASS, "Async Source", "Sources"),
        Box::new(AsyncSourceKernel { in_flight: None }),
    )
    .with_outport(Outport::new("out", PortType::Scalar))
    .with_property(Property::new("value", "Value", 0.0))
    .with_property(Property::new("factor", "Factor", 2.0))
    .with_property(
        Property::new("result", "Result", f64::NAN)
            .with_serialization(PropertySerializationMode::None),
    )
    .with_property(
        Property::new("result_for", "Result For", f64::NAN)
            .with_serialization(PropertySerializationMode::None),
    )
}

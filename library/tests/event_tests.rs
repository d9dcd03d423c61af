use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flowvis::error::EngineError;
use flowvis::event::{propagate_event, Event, EventKind};
use flowvis::model::link::PropertyPath;
use flowvis::model::port::{Outport, PortAddress, PortData, PortType};
use flowvis::model::Connection;
use flowvis::network::ProcessorNetwork;
use flowvis::processor::{
    basics, EventContext, ProcessContext, Processor, ProcessorInfo, ProcessorKernel,
};

fn connect(network: &mut ProcessorNetwork, from: (&str, &str), to: (&str, &str)) {
    network
        .add_connection(Connection::new(
            PortAddress::new(from.0, from.1),
            PortAddress::new(to.0, to.1),
        ))
        .unwrap();
}

#[test]
fn wheel_event_reaches_the_upstream_gain() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("src")).unwrap();
    network.add_processor(basics::gain("amp")).unwrap();
    network.add_processor(basics::canvas("view")).unwrap();
    connect(&mut network, ("src", "out"), ("amp", "in"));
    connect(&mut network, ("amp", "out"), ("view", "in"));

    let mut event = Event::wheel(1.0, (0.5, 0.5));
    propagate_event(&mut network, "view", &mut event).unwrap();

    assert!(event.has_been_used());
    let gain = network
        .property(&PropertyPath::new("amp", "gain"))
        .unwrap()
        .value()
        .as_f64()
        .unwrap();
    assert!((gain - 1.1).abs() < 1e-9);
    // Propagation stopped at the consumer; the source was never visited.
    assert!(event.has_visited("view"));
    assert!(event.has_visited("amp"));
    assert!(!event.has_visited("src"));
}

#[test]
fn consumed_event_invalidates_for_the_next_pass() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("src")).unwrap();
    network.add_processor(basics::gain("amp")).unwrap();
    connect(&mut network, ("src", "out"), ("amp", "in"));
    flowvis::NetworkEvaluator::new().evaluate(&mut network).unwrap();
    assert!(network.processor("amp").unwrap().is_valid());

    let mut event = Event::wheel(2.0, (0.0, 0.0));
    propagate_event(&mut network, "amp", &mut event).unwrap();
    assert!(!network.processor("amp").unwrap().is_valid());
    assert!(network.evaluation_requested());
}

struct CountingKernel {
    events: Arc<AtomicUsize>,
}

impl ProcessorKernel for CountingKernel {
    fn process(&mut self, ctx: &mut ProcessContext) -> Result<(), EngineError> {
        ctx.set_output("out", PortData::Scalar(0.0));
        Ok(())
    }

    fn on_event(&mut self, _event: &mut Event, _ctx: &mut EventContext<'_>) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }
}

fn counting_source(identifier: &str, events: Arc<AtomicUsize>) -> Processor {
    Processor::new(
        identifier,
        ProcessorInfo::new("test.counting", "Counting", "Test"),
        Box::new(CountingKernel { events }),
    )
    .with_outport(Outport::new("out", PortType::Scalar))
}

#[test]
fn diamond_delivers_the_event_once_per_processor() {
    let events = Arc::new(AtomicUsize::new(0));
    let mut network = ProcessorNetwork::new();
    network
        .add_processor(counting_source("src", Arc::clone(&events)))
        .unwrap();
    network.add_processor(basics::mix("left")).unwrap();
    network.add_processor(basics::mix("right")).unwrap();
    network.add_processor(basics::mix("join")).unwrap();
    network.add_processor(basics::canvas("view")).unwrap();
    connect(&mut network, ("src", "out"), ("left", "in"));
    connect(&mut network, ("src", "out"), ("right", "in"));
    connect(&mut network, ("left", "out"), ("join", "in"));
    connect(&mut network, ("right", "out"), ("join", "in"));
    connect(&mut network, ("join", "out"), ("view", "in"));

    let mut event = Event::new(EventKind::Key {
        key: "r".to_string(),
        pressed: true,
    });
    propagate_event(&mut network, "view", &mut event).unwrap();

    // Both branches lead to src, but the visited set deduplicates delivery.
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert!(!event.has_been_used());
}

struct SloppyKernel;

impl ProcessorKernel for SloppyKernel {
    fn process(&mut self, _ctx: &mut ProcessContext) -> Result<(), EngineError> {
        Ok(())
    }

    fn on_event(&mut self, _event: &mut Event, ctx: &mut EventContext<'_>) {
        // References a property that does not exist on this processor.
        ctx.set_property("no_such_property", 1.0.into());
    }
}

#[test]
fn bad_handler_write_does_not_abort_the_traversal() {
    let events = Arc::new(AtomicUsize::new(0));
    let mut network = ProcessorNetwork::new();
    network
        .add_processor(counting_source("src", Arc::clone(&events)))
        .unwrap();
    network
        .add_processor(
            Processor::new(
                "sloppy",
                ProcessorInfo::new("test.sloppy", "Sloppy", "Test"),
                Box::new(SloppyKernel),
            )
            .with_inport(flowvis::model::port::Inport::new(
                "in",
                PortType::Scalar,
            )),
        )
        .unwrap();
    connect(&mut network, ("src", "out"), ("sloppy", "in"));

    let mut event = Event::new(EventKind::Key {
        key: "x".to_string(),
        pressed: true,
    });
    propagate_event(&mut network, "sloppy", &mut event).unwrap();

    // The rejected write was logged and dropped; propagation went on
    // upstream.
    assert_eq!(events.load(Ordering::SeqCst), 1);
}

#[test]
fn unknown_entry_processor_is_an_error() {
    let mut network = ProcessorNetwork::new();
    let mut event = Event::wheel(1.0, (0.0, 0.0));
    let err = propagate_event(&mut network, "ghost", &mut event).unwrap_err();
    assert!(matches!(err, EngineError::ProcessorNotFound(_)));
}

use flowvis::error::EngineError;
use flowvis::model::link::{PropertyLink, PropertyPath};
use flowvis::model::property::PropertyValue;
use flowvis::model::Property;
use flowvis::network::ProcessorNetwork;
use flowvis::processor::{basics, ProcessContext, Processor, ProcessorInfo, ProcessorKernel};

struct NoopKernel;

impl ProcessorKernel for NoopKernel {
    fn process(&mut self, _ctx: &mut ProcessContext) -> Result<(), EngineError> {
        Ok(())
    }
}

fn with_properties(identifier: &str, properties: Vec<Property>) -> Processor {
    let mut processor = Processor::new(
        identifier,
        ProcessorInfo::new("test.holder", "Holder", "Test"),
        Box::new(NoopKernel),
    );
    for property in properties {
        processor = processor.with_property(property);
    }
    processor
}

fn link(src: (&str, &str), dst: (&str, &str)) -> PropertyLink {
    PropertyLink::new(
        PropertyPath::new(src.0, src.1),
        PropertyPath::new(dst.0, dst.1),
    )
}

fn value_f64(network: &ProcessorNetwork, processor: &str, property: &str) -> Option<f64> {
    network
        .property(&PropertyPath::new(processor, property))
        .and_then(|p| p.value().as_f64())
}

#[test]
fn adding_a_link_pushes_the_source_value() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    network.add_processor(basics::source("b")).unwrap();
    network
        .set_property(&PropertyPath::new("a", "value"), 5.0.into())
        .unwrap();

    network.add_link(link(("a", "value"), ("b", "value"))).unwrap();
    assert_eq!(value_f64(&network, "b", "value"), Some(5.0));
}

#[test]
fn links_propagate_transitively() {
    let mut network = ProcessorNetwork::new();
    for id in ["a", "b", "c"] {
        network.add_processor(basics::source(id)).unwrap();
    }
    network.add_link(link(("a", "value"), ("b", "value"))).unwrap();
    network.add_link(link(("b", "value"), ("c", "value"))).unwrap();

    network
        .set_property(&PropertyPath::new("a", "value"), 7.0.into())
        .unwrap();
    assert_eq!(value_f64(&network, "b", "value"), Some(7.0));
    assert_eq!(value_f64(&network, "c", "value"), Some(7.0));
}

#[test]
fn bidirectional_links_terminate_and_stay_in_sync() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    network.add_processor(basics::source("b")).unwrap();
    network.add_link(link(("a", "value"), ("b", "value"))).unwrap();
    network.add_link(link(("b", "value"), ("a", "value"))).unwrap();

    network
        .set_property(&PropertyPath::new("b", "value"), 9.0.into())
        .unwrap();
    assert_eq!(value_f64(&network, "a", "value"), Some(9.0));

    network
        .set_property(&PropertyPath::new("a", "value"), 1.5.into())
        .unwrap();
    assert_eq!(value_f64(&network, "b", "value"), Some(1.5));
}

#[test]
fn setting_the_same_value_is_a_no_op() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    assert!(network
        .set_property(&PropertyPath::new("a", "value"), 2.0.into())
        .unwrap());
    assert!(!network
        .set_property(&PropertyPath::new("a", "value"), 2.0.into())
        .unwrap());
}

#[test]
fn numeric_values_convert_across_kind_boundaries() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    network
        .add_processor(with_properties(
            "b",
            vec![Property::new("steps", "Steps", 0i64)],
        ))
        .unwrap();
    network.add_link(link(("a", "value"), ("b", "steps"))).unwrap();

    network
        .set_property(&PropertyPath::new("a", "value"), 2.6.into())
        .unwrap();
    assert_eq!(
        network
            .property(&PropertyPath::new("b", "steps"))
            .unwrap()
            .value(),
        &PropertyValue::Integer(3)
    );
}

#[test]
fn read_only_link_targets_are_skipped_not_failed() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    network
        .add_processor(with_properties(
            "b",
            vec![Property::new("display", "Display", 0.0).read_only()],
        ))
        .unwrap();
    network.add_link(link(("a", "value"), ("b", "display"))).unwrap();

    network
        .set_property(&PropertyPath::new("a", "value"), 4.0.into())
        .unwrap();
    assert_eq!(value_f64(&network, "b", "display"), Some(0.0));
}

#[test]
fn direct_write_to_read_only_property_fails() {
    let mut network = ProcessorNetwork::new();
    network
        .add_processor(with_properties(
            "b",
            vec![Property::new("display", "Display", 0.0).read_only()],
        ))
        .unwrap();
    let err = network
        .set_property(&PropertyPath::new("b", "display"), 1.0.into())
        .unwrap_err();
    assert!(matches!(err, EngineError::ReadOnlyProperty(_)));
}

#[test]
fn mismatched_kinds_without_condition_approval_are_rejected() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    network
        .add_processor(with_properties(
            "b",
            vec![Property::new("label", "Label", "hello")],
        ))
        .unwrap();
    let err = network
        .add_link(link(("a", "value"), ("b", "label")))
        .unwrap_err();
    assert!(matches!(err, EngineError::LinkNotAllowed(_, _)));
}

#[test]
fn self_link_is_rejected() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    let err = network
        .add_link(link(("a", "value"), ("a", "value")))
        .unwrap_err();
    assert!(matches!(err, EngineError::LinkNotAllowed(_, _)));
}

#[test]
fn auto_link_pairs_matching_leaf_identifiers() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::gain("g1")).unwrap();
    network.add_processor(basics::gain("g2")).unwrap();

    // "gain" and "exponent" both match by leaf, each linked in both
    // directions.
    let created = network.auto_link("g1", "g2").unwrap();
    assert_eq!(created, 4);
    assert_eq!(network.links().len(), 4);

    network
        .set_property(&PropertyPath::new("g1", "gain"), 2.5.into())
        .unwrap();
    assert_eq!(value_f64(&network, "g2", "gain"), Some(2.5));
    network
        .set_property(&PropertyPath::new("g2", "exponent"), 3.0.into())
        .unwrap();
    assert_eq!(value_f64(&network, "g1", "exponent"), Some(3.0));
}

#[test]
fn removed_link_stops_propagating() {
    let mut network = ProcessorNetwork::new();
    network.add_processor(basics::source("a")).unwrap();
    network.add_processor(basics::source("b")).unwrap();
    let l = link(("a", "value"), ("b", "value"));
    network.add_link(l.clone()).unwrap();
    assert!(network.remove_link(&l));

    network
        .set_property(&PropertyPath::new("a", "value"), 8.0.into())
        .unwrap();
    assert_eq!(value_f64(&network, "b", "value"), Some(0.0));
}

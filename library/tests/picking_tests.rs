use std::sync::{Arc, Mutex};

use flowvis::error::EngineError;
use flowvis::event::{Event, EventKind, MouseButton, PressState};
use flowvis::network::ProcessorNetwork;
use flowvis::picking::{
    color_from_index, index_from_color, PickingController, PickingManager, PickingState,
};
use flowvis::processor::{
    EventContext, ProcessContext, Processor, ProcessorInfo, ProcessorKernel,
};

type PickLog = Arc<Mutex<Vec<(PickingState, u32)>>>;

struct PickableKernel {
    log: PickLog,
}

impl ProcessorKernel for PickableKernel {
    fn process(&mut self, _ctx: &mut ProcessContext) -> Result<(), EngineError> {
        Ok(())
    }

    fn on_event(&mut self, event: &mut Event, _ctx: &mut EventContext<'_>) {
        if let EventKind::Picking {
            state, local_index, ..
        } = event.kind()
        {
            self.log.lock().unwrap().push((*state, *local_index));
            event.mark_used();
        }
    }
}

fn pickable(identifier: &str, log: PickLog) -> Processor {
    Processor::new(
        identifier,
        ProcessorInfo::new("test.pickable", "Pickable", "Test"),
        Box::new(PickableKernel { log }),
    )
}

fn setup() -> (ProcessorNetwork, PickingManager, PickLog) {
    let log: PickLog = Arc::new(Mutex::new(Vec::new()));
    let mut network = ProcessorNetwork::new();
    network
        .add_processor(pickable("mesh", Arc::clone(&log)))
        .unwrap();
    let mut manager = PickingManager::new();
    manager.register("mesh", 8).unwrap();
    (network, manager, log)
}

#[test]
fn hover_lifecycle_is_started_updated_finished() {
    let (mut network, manager, log) = setup();
    let mut controller = PickingController::new();

    let moves = [
        (Some(2), PickingState::Started),
        (Some(2), PickingState::Updated),
    ];
    for (picked, _) in moves {
        controller
            .pointer_event(
                &mut network,
                &manager,
                picked,
                MouseButton::None,
                PressState::Move,
                (0.4, 0.4),
            )
            .unwrap();
    }
    // Moving onto the background ends the interaction.
    controller
        .pointer_event(
            &mut network,
            &manager,
            None,
            MouseButton::None,
            PressState::Move,
            (0.9, 0.9),
        )
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            (PickingState::Started, 2),
            (PickingState::Updated, 2),
            (PickingState::Finished, 2),
        ]
    );
}

#[test]
fn pressed_object_keeps_the_interaction_while_dragging_off() {
    let (mut network, manager, log) = setup();
    let mut controller = PickingController::new();

    // Hover onto object 1, press, drag off it, release, move away.
    let steps = [
        (Some(1), MouseButton::None, PressState::Move),
        (Some(1), MouseButton::Left, PressState::Press),
        (None, MouseButton::Left, PressState::Move),
        (None, MouseButton::Left, PressState::Release),
        (None, MouseButton::None, PressState::Move),
    ];
    for (picked, button, state) in steps {
        controller
            .pointer_event(&mut network, &manager, picked, button, state, (0.1, 0.1))
            .unwrap();
    }

    let states: Vec<PickingState> = log.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(
        states,
        vec![
            PickingState::Started,
            PickingState::Updated,
            PickingState::Updated,
            PickingState::Updated,
            PickingState::Finished,
        ]
    );
    assert!(log.lock().unwrap().iter().all(|(_, index)| *index == 1));
}

#[test]
fn background_pointer_events_dispatch_nothing() {
    let (mut network, manager, log) = setup();
    let mut controller = PickingController::new();
    let dispatched = controller
        .pointer_event(
            &mut network,
            &manager,
            None,
            MouseButton::None,
            PressState::Move,
            (0.0, 0.0),
        )
        .unwrap();
    assert!(!dispatched);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn unregistered_indices_are_ignored() {
    let (mut network, manager, log) = setup();
    let mut controller = PickingController::new();
    // Index 50 is outside the registered range of 8.
    let dispatched = controller
        .pointer_event(
            &mut network,
            &manager,
            Some(50),
            MouseButton::None,
            PressState::Move,
            (0.0, 0.0),
        )
        .unwrap();
    assert!(!dispatched);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn id_buffer_colors_survive_the_round_trip() {
    for index in [0u32, 1, 255, 256, 65535, 1_000_000] {
        let color = color_from_index(index);
        assert_eq!(index_from_color(color), Some(index));
    }
}

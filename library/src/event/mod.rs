//! Interaction events routed through the network in reverse-dataflow order.

pub mod propagator;

use std::collections::HashSet;

use crate::picking::PickingState;

pub use propagator::propagate_event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    None,
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Press,
    Move,
    Release,
}

/// Event payload. Positions are normalized device coordinates of the canvas
/// the event entered through.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Mouse {
        button: MouseButton,
        state: PressState,
        pos: (f64, f64),
    },
    Wheel {
        delta: f64,
        pos: (f64, f64),
    },
    Key {
        key: String,
        pressed: bool,
    },
    Touch {
        points: Vec<(f64, f64)>,
    },
    /// Synthesized by the picking controller for the processor owning the
    /// picked color range.
    Picking {
        state: PickingState,
        local_index: u32,
        pressed: bool,
        pos: (f64, f64),
    },
    Resize {
        width: u32,
        height: u32,
    },
}

/// An event plus its propagation bookkeeping: a used flag that stops the
/// traversal, and the set of processors already visited so diamonds in the
/// graph are handled once.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    used: bool,
    visited: HashSet<String>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            used: false,
            visited: HashSet::new(),
        }
    }

    pub fn mouse(button: MouseButton, state: PressState, pos: (f64, f64)) -> Self {
        Self::new(EventKind::Mouse { button, state, pos })
    }

    pub fn wheel(delta: f64, pos: (f64, f64)) -> Self {
        Self::new(EventKind::Wheel { delta, pos })
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn mark_used(&mut self) {
        self.used = true;
    }

    pub fn has_been_used(&self) -> bool {
        self.used
    }

    /// Record a visit; returns `false` if the processor was seen before.
    pub(crate) fn mark_visited(&mut self, processor: &str) -> bool {
        self.visited.insert(processor.to_string())
    }

    pub fn has_visited(&self, processor: &str) -> bool {
        self.visited.contains(processor)
    }
}

//! Translates raw pointer input plus an id-buffer readback into picking
//! events delivered to the owning processors.

use log::{debug, trace};

use crate::error::EngineError;
use crate::event::{propagate_event, Event, EventKind, MouseButton, PressState};
use crate::network::ProcessorNetwork;
use crate::picking::{PickingManager, PickingState};

/// Per-canvas picking state machine.
///
/// Feed it every pointer event together with the global picking index read
/// from the id buffer under the cursor. It tracks which object the
/// interaction currently belongs to, keeps events flowing to a pressed
/// object while the cursor drags off it, and synthesizes the
/// started/updated/finished lifecycle for the owners.
#[derive(Debug, Default)]
pub struct PickingController {
    /// Object the previous pointer event belonged to.
    previous: Option<u32>,
    /// Object a button went down on; it captures events until release.
    pressed: Option<u32>,
    press_pos: Option<(f64, f64)>,
}

impl PickingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global index of the object currently owning the interaction.
    pub fn active(&self) -> Option<u32> {
        self.pressed.or(self.previous)
    }

    /// Process one pointer event. `picked` is the global index decoded from
    /// the id buffer at the cursor, or `None` over the background. Returns
    /// `true` if any picking event was dispatched.
    pub fn pointer_event(
        &mut self,
        network: &mut ProcessorNetwork,
        manager: &PickingManager,
        picked: Option<u32>,
        button: MouseButton,
        state: PressState,
        pos: (f64, f64),
    ) -> Result<bool, EngineError> {
        // While a button is held, the pressed object keeps the interaction
        // even when the cursor drags off it.
        let current = self.pressed.or(picked);
        let mut dispatched = false;

        if self.previous != current {
            if let Some(prev) = self.previous {
                dispatched |=
                    self.send(network, manager, prev, PickingState::Finished, pos)?;
            }
            if let Some(index) = current {
                dispatched |=
                    self.send(network, manager, index, PickingState::Started, pos)?;
            }
        } else if let Some(index) = current {
            dispatched |= self.send(network, manager, index, PickingState::Updated, pos)?;
        }

        match state {
            PressState::Press if button != MouseButton::None => {
                self.pressed = picked;
                self.press_pos = Some(pos);
                trace!("picking press on {:?} at {:?}", picked, pos);
            }
            PressState::Release => {
                self.pressed = None;
                self.press_pos = None;
            }
            _ => {}
        }
        self.previous = current;
        Ok(dispatched)
    }

    fn send(
        &self,
        network: &mut ProcessorNetwork,
        manager: &PickingManager,
        index: u32,
        state: PickingState,
        pos: (f64, f64),
    ) -> Result<bool, EngineError> {
        let Some((owner, local_index)) = manager.owner_of(index) else {
            debug!("picking index {} has no registered owner", index);
            return Ok(false);
        };
        let owner = owner.to_string();
        let mut event = Event::new(EventKind::Picking {
            state,
            local_index,
            pressed: self.pressed.is_some(),
            pos,
        });
        propagate_event(network, &owner, &mut event)?;
        Ok(true)
    }
}

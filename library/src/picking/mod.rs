//! Picking: stable object-under-cursor identification via an id color layer.
//!
//! Processors that draw pickable objects register a contiguous index range;
//! each global index maps to a unique 24-bit color they render into an id
//! buffer. Reading that buffer back under the cursor yields the global
//! index, which the [`PickingManager`] resolves to the owning processor and
//! its range-local index.

pub mod controller;

use log::debug;

use crate::error::EngineError;
use crate::model::property::Color;

pub use controller::PickingController;

/// Largest usable global index: color 0 is reserved for "nothing picked"
/// and the id buffer carries 24 bits.
pub const MAX_PICKING_INDEX: u32 = 0x00FF_FFFE;

/// Lifecycle of an interaction with one pickable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickingState {
    /// Cursor moved onto the object.
    Started,
    /// Cursor moved while over (or dragging) the object.
    Updated,
    /// Cursor moved off the object.
    Finished,
}

/// Global index -> id-buffer color. Index `i` becomes the 24-bit value
/// `i + 1` laid out little-endian across the RGB channels, leaving black
/// for the background.
pub fn color_from_index(index: u32) -> Color {
    let value = index + 1;
    Color {
        r: (value & 0xFF) as u8,
        g: ((value >> 8) & 0xFF) as u8,
        b: ((value >> 16) & 0xFF) as u8,
        a: 255,
    }
}

/// Id-buffer color -> global index. Black means nothing was picked.
pub fn index_from_color(color: Color) -> Option<u32> {
    let value = color.r as u32 | (color.g as u32) << 8 | (color.b as u32) << 16;
    value.checked_sub(1)
}

#[derive(Debug, Clone)]
struct PickingRange {
    owner: String,
    start: u32,
    size: u32,
}

/// Allocates global picking index ranges to processors.
///
/// Ranges are handed out first-fit into the gaps left by released ranges,
/// so indices stay small and colors stay stable across re-registrations
/// elsewhere in the network.
#[derive(Debug, Default)]
pub struct PickingManager {
    /// Sorted by `start`, non-overlapping.
    ranges: Vec<PickingRange>,
}

impl PickingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `size` consecutive global indices for `owner` and return the
    /// first one. A processor may hold several ranges.
    pub fn register(&mut self, owner: &str, size: u32) -> Result<u32, EngineError> {
        if size == 0 {
            return Err(EngineError::Picking(
                "range size must be positive".to_string(),
            ));
        }
        let mut start = 0u32;
        let mut insert_at = self.ranges.len();
        for (i, range) in self.ranges.iter().enumerate() {
            if range.start - start >= size {
                insert_at = i;
                break;
            }
            start = range.start + range.size;
        }
        if start.saturating_add(size - 1) > MAX_PICKING_INDEX {
            return Err(EngineError::Picking(format!(
                "index space exhausted (requested {} at {})",
                size, start
            )));
        }
        debug!("picking range [{}, {}) -> '{}'", start, start + size, owner);
        self.ranges.insert(
            insert_at,
            PickingRange {
                owner: owner.to_string(),
                start,
                size,
            },
        );
        Ok(start)
    }

    /// Release every range held by `owner`; their indices become available
    /// for future registrations.
    pub fn release(&mut self, owner: &str) {
        self.ranges.retain(|r| r.owner != owner);
    }

    /// Resolve a global index to its owner and the index local to the
    /// owner's range.
    pub fn owner_of(&self, index: u32) -> Option<(&str, u32)> {
        self.ranges
            .iter()
            .find(|r| index >= r.start && index < r.start + r.size)
            .map(|r| (r.owner.as_str(), index - r.start))
    }

    /// Total number of reserved indices.
    pub fn reserved(&self) -> u32 {
        self.ranges.iter().map(|r| r.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_round_trip_and_reserve_black() {
        assert_eq!(index_from_color(Color { r: 0, g: 0, b: 0, a: 255 }), None);
        assert_eq!(color_from_index(0), Color { r: 1, g: 0, b: 0, a: 255 });
        // 0x01_02_03 - 1 = index 66050
        let c = color_from_index(66050);
        assert_eq!((c.r, c.g, c.b), (3, 2, 1));
        assert_eq!(index_from_color(c), Some(66050));
    }

    #[test]
    fn released_ranges_are_reused_first_fit() {
        let mut manager = PickingManager::new();
        assert_eq!(manager.register("a", 10).unwrap(), 0);
        assert_eq!(manager.register("b", 5).unwrap(), 10);
        assert_eq!(manager.register("c", 3).unwrap(), 15);
        manager.release("b");
        // The 5-wide hole at 10 fits a request of 4.
        assert_eq!(manager.register("d", 4).unwrap(), 10);
        // But not one of 6, which goes after the last range.
        assert_eq!(manager.register("e", 6).unwrap(), 18);
    }

    #[test]
    fn impossible_requests_report_picking_errors() {
        let mut manager = PickingManager::new();
        assert!(matches!(
            manager.register("a", 0),
            Err(EngineError::Picking(_))
        ));
        manager.register("a", MAX_PICKING_INDEX + 1).unwrap();
        assert!(matches!(
            manager.register("b", 1),
            Err(EngineError::Picking(_))
        ));
    }

    #[test]
    fn owner_resolution_yields_local_index() {
        let mut manager = PickingManager::new();
        manager.register("mesh", 8).unwrap();
        manager.register("axes", 4).unwrap();
        assert_eq!(manager.owner_of(9), Some(("axes", 1)));
        assert_eq!(manager.owner_of(7), Some(("mesh", 7)));
        assert_eq!(manager.owner_of(12), None);
    }
}

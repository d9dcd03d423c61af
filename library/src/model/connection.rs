//! Connection model: directed data edges between an outport and an inport.

use serde::{Deserialize, Serialize};

use super::port::PortAddress;

/// An edge in the data-flow graph. The network owns the connection relation;
/// neither endpoint owns the other.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Source (outport)
    pub from: PortAddress,
    /// Destination (inport)
    pub to: PortAddress,
}

impl Connection {
    pub fn new(from: PortAddress, to: PortAddress) -> Self {
        Self { from, to }
    }

    pub fn touches(&self, processor: &str) -> bool {
        self.from.processor == processor || self.to.processor == processor
    }
}

//! RAII guard for batching network modifications.

use crate::network::ProcessorNetwork;

/// Holds the network locked for the lifetime of the guard. Nested guards
/// stack; notifications queued while any guard is alive flush when the last
/// one drops. Obtained via [`ProcessorNetwork::lock`].
pub struct NetworkLock<'a> {
    network: &'a mut ProcessorNetwork,
}

impl<'a> NetworkLock<'a> {
    pub(crate) fn new(network: &'a mut ProcessorNetwork) -> Self {
        network.lock_raw();
        Self { network }
    }
}

impl std::ops::Deref for NetworkLock<'_> {
    type Target = ProcessorNetwork;

    fn deref(&self) -> &Self::Target {
        self.network
    }
}

impl std::ops::DerefMut for NetworkLock<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.network
    }
}

impl Drop for NetworkLock<'_> {
    fn drop(&mut self) {
        self.network.unlock_raw();
    }
}

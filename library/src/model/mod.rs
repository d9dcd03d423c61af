//! Data model for the processor network: properties, ports, connections,
//! links, and the persisted workspace document.

pub mod connection;
pub mod link;
pub mod port;
pub mod property;
pub mod workspace;

pub use connection::Connection;
pub use link::{PropertyLink, PropertyPath};
pub use port::{PortAddress, PortData, PortType};
pub use property::{InvalidationLevel, Property, PropertyValue};

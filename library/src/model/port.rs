//! Ports: typed connection endpoints on a processor.
//!
//! An outport owns a reference-counted, effectively-immutable data handle
//! that is swapped wholesale on process; inports never own data, they read
//! the handles of the outports they are connected to. Fan-out therefore
//! shares one `Arc`, never copies.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::property::{Color, Vec2};

/// Data type carried by a port (socket type).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    Scalar,
    Integer,
    Boolean,
    String,
    Vec2,
    Color,
    Image,
    Volume,
    Mesh,
    /// Accepts any type (generic sink).
    Any,
}

impl PortType {
    /// Whether data flowing out of `from` may enter `to`.
    pub fn accepts(from: PortType, to: PortType) -> bool {
        to == PortType::Any || from == PortType::Any || from == to
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VolumeData {
    pub dimensions: [u32; 3],
    pub voxels: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Payload stored in an outport. Immutable once published; replaced, never
/// mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub enum PortData {
    Scalar(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    Vec2(Vec2),
    Color(Color),
    Image(ImageData),
    Volume(VolumeData),
    Mesh(MeshData),
}

impl PortData {
    pub fn port_type(&self) -> PortType {
        match self {
            PortData::Scalar(_) => PortType::Scalar,
            PortData::Integer(_) => PortType::Integer,
            PortData::Boolean(_) => PortType::Boolean,
            PortData::String(_) => PortType::String,
            PortData::Vec2(_) => PortType::Vec2,
            PortData::Color(_) => PortType::Color,
            PortData::Image(_) => PortType::Image,
            PortData::Volume(_) => PortType::Volume,
            PortData::Mesh(_) => PortType::Mesh,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PortData::Scalar(v) => Some(*v),
            PortData::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// Identifies a specific port on a specific processor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortAddress {
    pub processor: String,
    pub port: String,
}

impl PortAddress {
    pub fn new(processor: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for PortAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.processor, self.port)
    }
}

/// Input endpoint. Holds no data; the network tracks which outports feed it.
#[derive(Debug)]
pub struct Inport {
    identifier: String,
    port_type: PortType,
    optional: bool,
    multi: bool,
    changed: bool,
}

impl Inport {
    pub fn new(identifier: impl Into<String>, port_type: PortType) -> Self {
        Self {
            identifier: identifier.into(),
            port_type,
            optional: false,
            multi: false,
            changed: false,
        }
    }

    /// Not required for the owning processor to be ready.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Accepts more than one connection.
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn port_type(&self) -> PortType {
        self.port_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Whether upstream published fresh data since the owner last validated.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }
}

/// Output endpoint owning the current data handle.
#[derive(Debug)]
pub struct Outport {
    identifier: String,
    port_type: PortType,
    data: Option<Arc<PortData>>,
    valid: bool,
}

impl Outport {
    pub fn new(identifier: impl Into<String>, port_type: PortType) -> Self {
        Self {
            identifier: identifier.into(),
            port_type,
            data: None,
            valid: false,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn port_type(&self) -> PortType {
        self.port_type
    }

    pub fn data(&self) -> Option<&Arc<PortData>> {
        self.data.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Swap in a freshly produced handle. Consumers holding the previous
    /// `Arc` keep reading the old data untouched.
    pub(crate) fn set_data(&mut self, data: Arc<PortData>) {
        self.data = Some(data);
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    pub(crate) fn set_valid(&mut self) {
        self.valid = true;
    }
}

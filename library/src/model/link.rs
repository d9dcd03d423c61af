//! Property links: directed value-propagation edges between two properties.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::property::{Property, PropertyValue};

/// Identifies a property on a processor by dotted path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    pub processor: String,
    pub property: String,
}

impl PropertyPath {
    pub fn new(processor: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            property: property.into(),
        }
    }

    /// Last segment of the dotted property path.
    pub fn leaf(&self) -> &str {
        self.property.rsplit('.').next().unwrap_or(&self.property)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.processor, self.property)
    }
}

/// A directed propagation edge in the property-level graph.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyLink {
    pub src: PropertyPath,
    pub dst: PropertyPath,
}

impl PropertyLink {
    pub fn new(src: PropertyPath, dst: PropertyPath) -> Self {
        Self { src, dst }
    }

    pub fn touches(&self, processor: &str) -> bool {
        self.src.processor == processor || self.dst.processor == processor
    }
}

/// Converts a source property value into something the destination accepts.
///
/// Converters are consulted in registration order; the first one whose
/// `can_convert` approves the type pair is used.
pub trait LinkConverter: Send + Sync {
    fn id(&self) -> &'static str;
    fn can_convert(&self, from: &PropertyValue, to: &PropertyValue) -> bool;
    fn convert(
        &self,
        from: &PropertyValue,
        to: &PropertyValue,
    ) -> Result<PropertyValue, EngineError>;
}

/// Passes identically-typed values through unchanged.
pub struct IdentityConverter;

impl LinkConverter for IdentityConverter {
    fn id(&self) -> &'static str {
        "identity"
    }

    fn can_convert(&self, from: &PropertyValue, to: &PropertyValue) -> bool {
        from.same_kind(to)
    }

    fn convert(
        &self,
        from: &PropertyValue,
        _to: &PropertyValue,
    ) -> Result<PropertyValue, EngineError> {
        Ok(from.clone())
    }
}

/// Coerces between the numeric variants (number, integer, boolean).
pub struct NumericConverter;

impl LinkConverter for NumericConverter {
    fn id(&self) -> &'static str {
        "numeric"
    }

    fn can_convert(&self, from: &PropertyValue, to: &PropertyValue) -> bool {
        let numeric = |v: &PropertyValue| {
            matches!(
                v,
                PropertyValue::Number(_) | PropertyValue::Integer(_) | PropertyValue::Boolean(_)
            )
        };
        numeric(from) && numeric(to)
    }

    fn convert(
        &self,
        from: &PropertyValue,
        to: &PropertyValue,
    ) -> Result<PropertyValue, EngineError> {
        let v = match from {
            PropertyValue::Number(n) => n.into_inner(),
            PropertyValue::Integer(i) => *i as f64,
            PropertyValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => {
                return Err(EngineError::Conversion(format!(
                    "cannot convert {} numerically",
                    other.kind_name()
                )));
            }
        };
        Ok(match to {
            PropertyValue::Number(_) => PropertyValue::Number(OrderedFloat(v)),
            PropertyValue::Integer(_) => PropertyValue::Integer(v.round() as i64),
            PropertyValue::Boolean(_) => PropertyValue::Boolean(v != 0.0),
            other => {
                return Err(EngineError::Conversion(format!(
                    "no numeric conversion to {}",
                    other.kind_name()
                )));
            }
        })
    }
}

/// Decides whether a link between two properties may be created at all.
/// `add_link` rejects the link unless at least one registered condition
/// approves it.
pub trait LinkCondition: Send + Sync {
    fn id(&self) -> &'static str;
    fn can_link(
        &self,
        src_path: &PropertyPath,
        src: &Property,
        dst_path: &PropertyPath,
        dst: &Property,
    ) -> bool;
}

/// Approves links between properties holding the same value variant.
pub struct TypeMatchCondition;

impl LinkCondition for TypeMatchCondition {
    fn id(&self) -> &'static str {
        "type-match"
    }

    fn can_link(
        &self,
        _src_path: &PropertyPath,
        src: &Property,
        _dst_path: &PropertyPath,
        dst: &Property,
    ) -> bool {
        src.value().same_kind(dst.value())
    }
}

/// Approves links whose property identifiers match on the leaf segment,
/// e.g. `volume.camera.fov` to `slice.camera.fov`. Used by auto-linking.
pub struct IdentifierMatchCondition;

impl LinkCondition for IdentifierMatchCondition {
    fn id(&self) -> &'static str {
        "identifier-match"
    }

    fn can_link(
        &self,
        src_path: &PropertyPath,
        src: &Property,
        dst_path: &PropertyPath,
        dst: &Property,
    ) -> bool {
        src_path.leaf() == dst_path.leaf() && src.value().same_kind(dst.value())
    }
}

//! Property cells: observable, typed values owned by a processor.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Severity marker describing what a change forces downstream.
///
/// Levels are ordered; propagation always takes the maximum of the current
/// and incoming level and only `set_valid()` resets to `Valid`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InvalidationLevel {
    Valid,
    /// Output data must be recomputed.
    InvalidOutput,
    /// Resources (e.g. GPU programs) must be rebuilt before recomputing.
    InvalidResources,
}

impl Default for InvalidationLevel {
    fn default() -> Self {
        InvalidationLevel::Valid
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Vec2 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Variant value held by a [`Property`].
///
/// `Eq` so that setting a property to the value it already holds is an exact
/// no-op (value-equality short-circuit).
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Hash)]
#[serde(untagged)]
pub enum PropertyValue {
    // Integer precedes Number so untagged deserialization keeps whole JSON
    // numbers integral.
    Integer(i64),
    Number(OrderedFloat<f64>),
    Boolean(bool),
    String(String),
    Vec2(Vec2),
    Color(Color),
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(OrderedFloat(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<Vec2> for PropertyValue {
    fn from(value: Vec2) -> Self {
        PropertyValue::Vec2(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        PropertyValue::Color(value)
    }
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(v) => Some(v.into_inner()),
            PropertyValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(v) => Some(*v),
            PropertyValue::Number(v) => {
                if v.fract().abs() < f64::EPSILON {
                    Some(v.into_inner() as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Whether two values are of the same variant.
    pub fn same_kind(&self, other: &PropertyValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Number(_) => "number",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::String(_) => "string",
            PropertyValue::Vec2(_) => "vec2",
            PropertyValue::Color(_) => "color",
        }
    }
}

/// Controls whether a property value ends up in the saved workspace.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertySerializationMode {
    All,
    None,
}

impl Default for PropertySerializationMode {
    fn default() -> Self {
        PropertySerializationMode::All
    }
}

/// A named, observable value cell owned by exactly one processor.
///
/// Properties form a composite tree: a group property has children and no
/// value of its own is required. Leaves carry the current value plus the
/// invalidation level a change triggers on the owning processor.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    identifier: String,
    display_name: String,
    value: PropertyValue,
    invalidation_level: InvalidationLevel,
    read_only: bool,
    serialization: PropertySerializationMode,
    min: Option<PropertyValue>,
    max: Option<PropertyValue>,
    children: Vec<Property>,
}

impl Property {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            value: value.into(),
            invalidation_level: InvalidationLevel::InvalidOutput,
            read_only: false,
            serialization: PropertySerializationMode::All,
            min: None,
            max: None,
            children: Vec::new(),
        }
    }

    /// A group property holding sub-properties. The group itself carries a
    /// placeholder boolean so path lookups stay uniform.
    pub fn group(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        children: Vec<Property>,
    ) -> Self {
        let mut p = Property::new(identifier, display_name, true);
        p.serialization = PropertySerializationMode::None;
        p.children = children;
        p
    }

    pub fn with_invalidation_level(mut self, level: InvalidationLevel) -> Self {
        self.invalidation_level = level;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_serialization(mut self, mode: PropertySerializationMode) -> Self {
        self.serialization = mode;
        self
    }

    pub fn with_range(
        mut self,
        min: impl Into<PropertyValue>,
        max: impl Into<PropertyValue>,
    ) -> Self {
        self.min = Some(min.into());
        self.max = Some(max.into());
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn invalidation_level(&self) -> InvalidationLevel {
        self.invalidation_level
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn serialization(&self) -> PropertySerializationMode {
        self.serialization
    }

    pub fn children(&self) -> &[Property] {
        &self.children
    }

    /// Set the value, clamping numerics to the configured range.
    ///
    /// Returns `true` only if the stored value actually changed; setting a
    /// property to the value it already holds is a no-op.
    pub fn set_value(&mut self, value: impl Into<PropertyValue>) -> bool {
        let value = self.clamp(value.into());
        if value == self.value {
            return false;
        }
        self.value = value;
        true
    }

    fn clamp(&self, value: PropertyValue) -> PropertyValue {
        match value {
            PropertyValue::Number(v) => {
                let mut v = v.into_inner();
                if let Some(min) = self.min.as_ref().and_then(|m| m.as_f64()) {
                    v = v.max(min);
                }
                if let Some(max) = self.max.as_ref().and_then(|m| m.as_f64()) {
                    v = v.min(max);
                }
                PropertyValue::Number(OrderedFloat(v))
            }
            PropertyValue::Integer(v) => {
                let mut v = v;
                if let Some(min) = self.min.as_ref().and_then(|m| m.as_i64()) {
                    v = v.max(min);
                }
                if let Some(max) = self.max.as_ref().and_then(|m| m.as_i64()) {
                    v = v.min(max);
                }
                PropertyValue::Integer(v)
            }
            other => other,
        }
    }

    /// Resolve a dotted path (`"camera.fov"`) within this property's subtree.
    /// An empty remainder resolves to the property itself.
    pub fn find(&self, path: &str) -> Option<&Property> {
        match path.split_once('.') {
            None => self.children.iter().find(|c| c.identifier == path),
            Some((head, rest)) => self
                .children
                .iter()
                .find(|c| c.identifier == head)
                .and_then(|c| c.find(rest)),
        }
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Property> {
        match path.split_once('.') {
            None => self.children.iter_mut().find(|c| c.identifier == path),
            Some((head, rest)) => self
                .children
                .iter_mut()
                .find(|c| c.identifier == head)
                .and_then(|c| c.find_mut(rest)),
        }
    }

    /// Collect `(path, value)` pairs for every serializable leaf below (and
    /// including) this property.
    pub fn flatten_into(&self, prefix: &str, out: &mut HashMap<String, PropertyValue>) {
        let path = if prefix.is_empty() {
            self.identifier.clone()
        } else {
            format!("{}.{}", prefix, self.identifier)
        };
        if self.children.is_empty() {
            if self.serialization == PropertySerializationMode::All {
                out.insert(path, self.value.clone());
            }
        } else {
            for child in &self.children {
                child.flatten_into(&path, out);
            }
        }
    }
}

/// Look up a property by dotted path in an ordered property list.
pub fn find_property<'a>(properties: &'a [Property], path: &str) -> Option<&'a Property> {
    match path.split_once('.') {
        None => properties.iter().find(|p| p.identifier() == path),
        Some((head, rest)) => properties
            .iter()
            .find(|p| p.identifier() == head)
            .and_then(|p| p.find(rest)),
    }
}

pub fn find_property_mut<'a>(
    properties: &'a mut [Property],
    path: &str,
) -> Option<&'a mut Property> {
    match path.split_once('.') {
        None => properties.iter_mut().find(|p| p.identifier() == path),
        Some((head, rest)) => properties
            .iter_mut()
            .find(|p| p.identifier() == head)
            .and_then(|p| p.find_mut(rest)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_short_circuits_on_equal_value() {
        let mut p = Property::new("gain", "Gain", 2.0);
        assert!(!p.set_value(2.0));
        assert!(p.set_value(3.0));
        assert!(!p.set_value(3.0));
    }

    #[test]
    fn set_value_clamps_to_range() {
        let mut p = Property::new("opacity", "Opacity", 0.5).with_range(0.0, 1.0);
        assert!(p.set_value(4.0));
        assert_eq!(p.value().as_f64(), Some(1.0));
        assert!(p.set_value(-2.0));
        assert_eq!(p.value().as_f64(), Some(0.0));
    }

    #[test]
    fn dotted_path_resolves_into_groups() {
        let camera = Property::group(
            "camera",
            "Camera",
            vec![
                Property::new("fov", "Field of View", 60.0),
                Property::new("near", "Near Plane", 0.1),
            ],
        );
        let props = vec![camera, Property::new("gain", "Gain", 1.0)];
        assert_eq!(
            find_property(&props, "camera.fov").map(|p| p.identifier()),
            Some("fov")
        );
        assert!(find_property(&props, "camera.far").is_none());
        assert!(find_property(&props, "gain").is_some());
    }

    #[test]
    fn invalidation_levels_are_ordered() {
        assert!(InvalidationLevel::Valid < InvalidationLevel::InvalidOutput);
        assert!(InvalidationLevel::InvalidOutput < InvalidationLevel::InvalidResources);
    }
}

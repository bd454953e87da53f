use std::collections::BTreeMap;

use crate::foundation::core::{Rgba8, Vec2};

/// Attribute keys whose mutation invalidates a node's cached transform.
pub const TRANSFORM_ATTRS: [&str; 7] = [
    "x", "y", "rotation", "scaleX", "scaleY", "offsetX", "offsetY",
];

/// Whether `key` participates in the node's local transform.
pub fn is_transform_attr(key: &str) -> bool {
    TRANSFORM_ATTRS.contains(&key)
}

/// Dynamically typed attribute value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AttrValue {
    /// Scalar number (positions, radii, opacities, ...).
    Number(f64),
    /// Free-form text.
    Text(String),
    /// RGBA color.
    Color(Rgba8),
    /// 2D point.
    Point(Vec2),
    /// Flat numeric list (e.g. polyline coordinates).
    List(Vec<f64>),
    /// Boolean flag.
    Flag(bool),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<Rgba8> for AttrValue {
    fn from(v: Rgba8) -> Self {
        Self::Color(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        Self::List(v)
    }
}

impl From<Vec2> for AttrValue {
    fn from(v: Vec2) -> Self {
        Self::Point(v)
    }
}

/// String-keyed attribute bag owned by every node.
///
/// Reads of unset attributes return a type-appropriate default so drawing
/// code never observes a missing value. Values are stored as-is; domain
/// validation (e.g. negative radius) is the concrete shape's concern.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Attrs {
    values: BTreeMap<String, AttrValue>,
}

fn default_number(key: &str) -> f64 {
    match key {
        "scaleX" | "scaleY" | "opacity" | "shadowOpacity" => 1.0,
        "strokeWidth" => 2.0,
        _ => 0.0,
    }
}

fn default_flag(key: &str) -> bool {
    matches!(key, "visible" | "listening")
}

impl Attrs {
    /// Empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Raw lookup without defaulting.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    /// Remove `key`, returning its value if it was set.
    pub fn unset(&mut self, key: &str) -> Option<AttrValue> {
        self.values.remove(key)
    }

    /// Numeric read with per-key default (`scaleX`/`scaleY`/`opacity` → 1.0,
    /// everything else → 0.0).
    pub fn number(&self, key: &str) -> f64 {
        match self.values.get(key) {
            Some(AttrValue::Number(n)) => *n,
            _ => default_number(key),
        }
    }

    /// Boolean read with per-key default (`visible`/`listening` → true).
    pub fn flag(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(AttrValue::Flag(f)) => *f,
            _ => default_flag(key),
        }
    }

    /// Color read; unset keys are `None` (no paint), not a default color.
    pub fn color(&self, key: &str) -> Option<Rgba8> {
        match self.values.get(key) {
            Some(AttrValue::Color(c)) => Some(*c),
            _ => None,
        }
    }

    /// Numeric-list read; unset keys read as empty.
    pub fn list(&self, key: &str) -> &[f64] {
        match self.values.get(key) {
            Some(AttrValue::List(v)) => v,
            _ => &[],
        }
    }

    /// Text read; unset keys read as empty.
    pub fn text(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(AttrValue::Text(t)) => t,
            _ => "",
        }
    }

    /// Iterate over set keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

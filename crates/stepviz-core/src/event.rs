//! Events recorded from a running algorithm.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single typed datum in an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Position or direction
    Vec3([f64; 3]),
    /// Rotation quaternion (x, y, z, w)
    Quat([f64; 4]),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::Vec3(v)
    }
}

impl From<[f64; 4]> for Value {
    fn from(v: [f64; 4]) -> Self {
        Value::Quat(v)
    }
}

/// A stored payload attribute.
///
/// Consumers tell scalars from lists by shape: storing one value always
/// yields `Scalar`, storing several always yields `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Scalar(Value),
    List(Vec<Value>),
}

impl Attribute {
    /// Get the scalar value, if this attribute is one.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Attribute::Scalar(v) => Some(v),
            Attribute::List(_) => None,
        }
    }

    /// Get the list of values, if this attribute is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Attribute::Scalar(_) => None,
            Attribute::List(values) => Some(values),
        }
    }
}

/// A noteworthy moment in the algorithm's execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    kind: String,
    starting_time: u64,
    execution_duration: u64,
    rendering_duration: u64,
    attributes: BTreeMap<String, Attribute>,
}

impl Event {
    /// Create a new event.
    ///
    /// Durations are in execution units; `rendering_duration` shorter than
    /// `execution_duration` is allowed.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        starting_time: u64,
        execution_duration: i64,
        rendering_duration: i64,
    ) -> Result<Self> {
        let execution_duration = non_negative("execution_duration", execution_duration)?;
        let rendering_duration = non_negative("rendering_duration", rendering_duration)?;
        Ok(Self {
            name: name.into(),
            kind: kind.into(),
            starting_time,
            execution_duration,
            rendering_duration,
            attributes: BTreeMap::new(),
        })
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    #[must_use]
    pub fn with_attribute<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.set_attribute(name, values);
        self
    }

    /// Store values under `name`, replacing any prior value.
    ///
    /// Zero values is a no-op, one value is stored as a scalar, more are
    /// stored as an ordered list.
    pub fn set_attribute<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let attribute = match values.len() {
            0 => return,
            1 => Attribute::Scalar(values.remove(0)),
            _ => Attribute::List(values),
        };
        self.attributes.insert(name.to_string(), attribute);
    }

    /// Look up an attribute.
    pub fn attribute(&self, name: &str) -> Result<&Attribute> {
        self.attributes
            .get(name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_string()))
    }

    /// Look up a scalar attribute.
    pub fn scalar(&self, name: &str) -> Result<&Value> {
        self.attribute(name)?
            .as_scalar()
            .ok_or_else(|| shape(name, "scalar"))
    }

    /// Look up a list attribute.
    pub fn list(&self, name: &str) -> Result<&[Value]> {
        self.attribute(name)?
            .as_list()
            .ok_or_else(|| shape(name, "list"))
    }

    /// Look up a scalar 3-vector.
    pub fn vec3(&self, name: &str) -> Result<[f64; 3]> {
        match self.scalar(name)? {
            Value::Vec3(v) => Ok(*v),
            _ => Err(shape(name, "vec3")),
        }
    }

    /// Look up a scalar number. Integers are widened.
    pub fn f64(&self, name: &str) -> Result<f64> {
        match self.scalar(name)? {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            _ => Err(shape(name, "number")),
        }
    }

    /// Look up a scalar string.
    pub fn text(&self, name: &str) -> Result<&str> {
        match self.scalar(name)? {
            Value::Text(v) => Ok(v),
            _ => Err(shape(name, "text")),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag selecting how the event is visualized.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Scheduled time, in event time units.
    pub fn starting_time(&self) -> u64 {
        self.starting_time
    }

    pub fn execution_duration(&self) -> u64 {
        self.execution_duration
    }

    pub fn rendering_duration(&self) -> u64 {
        self.rendering_duration
    }

    /// Iterate attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::InvalidDuration { field, value })
}

fn shape(name: &str, expected: &'static str) -> Error {
    Error::AttributeShape {
        name: name.to_string(),
        expected,
    }
}

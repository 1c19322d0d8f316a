use crate::errors::TreeError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

/// A single attribute value of an observation.
///
/// Exactly one representation is active at a time. Values are only ordered
/// against values of the same representation; mixing them is an error rather
/// than a silent coercion.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Float(f64),
    Str(String),
}

impl Value {
    /// Name of the active representation, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    /// Total order between two values of the same representation.
    ///
    /// Floats are ordered with [`f64::total_cmp`], so the order stays total
    /// even in the presence of NaN. `-0.0` and `0.0` compare equal.
    pub fn cmp_value(&self, other: &Value) -> Result<Ordering, TreeError> {
        match (self, other) {
            (Value::Bool(l), Value::Bool(r)) => Ok(l.cmp(r)),
            // adding 0.0 turns -0.0 into 0.0 and leaves every other value as is
            (Value::Float(l), Value::Float(r)) => Ok((l + 0.0).total_cmp(&(r + 0.0))),
            (Value::Str(l), Value::Str(r)) => Ok(l.cmp(r)),
            (l, r) => Err(TreeError::Comparison {
                left: l.type_name(),
                right: r.type_name(),
            }),
        }
    }

    pub fn lt(&self, other: &Value) -> Result<bool, TreeError> {
        Ok(self.cmp_value(other)? == Ordering::Less)
    }

    pub fn eq_value(&self, other: &Value) -> Result<bool, TreeError> {
        Ok(self.cmp_value(other)? == Ordering::Equal)
    }

    pub fn gt(&self, other: &Value) -> Result<bool, TreeError> {
        Ok(self.cmp_value(other)? == Ordering::Greater)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Same equality as [`Value::eq_value`]; values of different representations
/// are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.cmp_value(other), Ok(Ordering::Equal))
    }
}

impl Eq for Value {}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:.6}", v),
            Value::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Float(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

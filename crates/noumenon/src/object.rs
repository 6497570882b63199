//! The public value type.
//!
//! [`Object`] is the owned, plain-data mirror of the interpreter's internal
//! value representation: it can be freely cloned, compared, and stored by
//! embedders without touching runtime internals. Program results and
//! host-function arguments cross the API boundary as `Object`s.

use std::{collections::BTreeMap, fmt, rc::Rc};

use crate::value::{float_to_string, Function, Value};

/// A Noumenon value that can be passed to or returned from the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Object>),
    Object(BTreeMap<String, Object>),
    /// A function value, described by its parameter names. Functions carry
    /// no environment, and an `Object` cannot hold a body, so converting
    /// one back into the interpreter produces Null.
    Function { parameters: Vec<String> },
}

impl Object {
    /// The empty Object a program yields when it runs off the end.
    #[must_use]
    pub fn empty() -> Self {
        Self::Object(BTreeMap::new())
    }
}

impl From<&Value> for Object {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(*value),
            Value::Int(value) => Self::Int(*value),
            Value::Float(value) => Self::Float(*value),
            Value::Str(value) => Self::Str(value.to_string()),
            Value::Array(values) => Self::Array(values.borrow().iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Object(
                entries
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.to_string(), Self::from(value)))
                    .collect(),
            ),
            Value::Function(Function::User(def)) => Self::Function {
                parameters: def.parameters.iter().map(ToString::to_string).collect(),
            },
            Value::Function(_) => Self::Function { parameters: vec![] },
        }
    }
}

impl Object {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::Int(*value),
            Self::Float(value) => Value::Float(*value),
            Self::Str(value) => Value::Str(Rc::from(value.as_str())),
            Self::Array(values) => Value::array(values.iter().map(Self::to_value).collect()),
            Self::Object(entries) => Value::object(
                entries
                    .iter()
                    .map(|(key, value)| (Rc::from(key.as_str()), value.to_value()))
                    .collect(),
            ),
            Self::Function { .. } => Value::Null,
        }
    }
}

/// Rendering identical to what `print` produces for the same value.
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => f.write_str(if *value { "true" } else { "false" }),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&float_to_string(*value)),
            Self::Str(value) => f.write_str(value),
            Self::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Function { parameters } => {
                f.write_str("function(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(parameter)?;
                }
                f.write_str(")")
            }
        }
    }
}

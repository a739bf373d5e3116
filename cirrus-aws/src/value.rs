//! Dynamically typed arguments and results.

use crate::error::InvocationError;
use crate::invoker::DynamicObject;
use cirrus_container::Bean;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Argument or return value of a dynamic call.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Duration(Duration),
    List(Vec<Value>),
    /// Another dynamically invocable object, e.g. a nested builder.
    Object(Arc<dyn DynamicObject>),
    /// An opaque container-managed object.
    Bean(Bean),
}

impl Value {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::Duration(_) => "duration",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Bean(_) => "bean",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn DynamicObject>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Container view of the value. Objects and beans keep their identity,
    /// scalars are not beans.
    pub fn to_bean(&self) -> Option<Bean> {
        match self {
            Self::Object(object) => Some(object.clone().into_bean()),
            Self::Bean(bean) => Some(bean.clone()),
            _ => None,
        }
    }

    /// Downcast an object or bean value to a concrete type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.to_bean()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => write!(f, "Bool({value})"),
            Self::Int(value) => write!(f, "Int({value})"),
            Self::Str(value) => write!(f, "Str({value:?})"),
            Self::Duration(value) => write!(f, "Duration({value:?})"),
            Self::List(values) => f.debug_tuple("List").field(values).finish(),
            Self::Object(object) => write!(f, "Object({})", object.type_name()),
            Self::Bean(_) => f.write_str("Bean(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Self::Bean(a), Self::Bean(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<Arc<dyn DynamicObject>> for Value {
    fn from(value: Arc<dyn DynamicObject>) -> Self {
        Self::Object(value)
    }
}

/// Argument at `index`, or an `InvalidArgument` error naming the operation.
pub fn arg<'a>(operation: &str, args: &'a [Value], index: usize) -> Result<&'a Value, InvocationError> {
    args.get(index).ok_or_else(|| {
        InvocationError::invalid_argument(
            operation,
            format!("expected at least {} argument(s), got {}", index + 1, args.len()),
        )
    })
}

/// Reject an argument of the wrong kind.
pub fn expect_kind<'a, T>(
    operation: &str,
    value: &'a Value,
    expected: &str,
    extract: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<T, InvocationError> {
    extract(value).ok_or_else(|| {
        InvocationError::invalid_argument(
            operation,
            format!("expected {}, got {}", expected, value.kind()),
        )
    })
}

//! Native values exchanged between the converter layer and fixtures.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use time::{Date, PrimitiveDateTime, Time};

/// A native value produced by inbound conversion or returned by a fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value. Renders as the void token, or `null` inside a list.
    Void,
    /// Plain text.
    Str(String),
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Calendar date.
    Date(Date),
    /// Time of day with microsecond precision.
    Time(Time),
    /// Date and time without an offset.
    DateTime(PrimitiveDateTime),
    /// Ordered values, possibly nested.
    List(Vec<Value>),
    /// Ordered key/value pairs.
    Hash(Vec<(String, String)>),
    /// A user-defined type.
    Custom(CustomValue),
}

impl Value {
    /// Returns the declared type this value satisfies.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Void | Self::Str(_) => ValueType::Str,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Date(_) => ValueType::Date,
            Self::Time(_) => ValueType::Time,
            Self::DateTime(_) => ValueType::DateTime,
            Self::List(_) => ValueType::List,
            Self::Hash(_) => ValueType::Hash,
            Self::Custom(custom) => ValueType::Custom(Arc::clone(&custom.type_name)),
        }
    }

    /// Builds a list of strings.
    pub fn str_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::Str(v.into())).collect())
    }

    /// Short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Void => "void".to_owned(),
            other => other.value_type().to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
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

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Void
    }
}

impl From<Vec<Self>> for Value {
    fn from(values: Vec<Self>) -> Self {
        Self::List(values)
    }
}

/// A value of a user-registered type.
///
/// Equality is identity: two custom values are equal when they share the type
/// name and the same allocation.
#[derive(Clone)]
pub struct CustomValue {
    type_name: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    /// Wraps `value` under the given type name.
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            inner: Arc::new(value),
        }
    }

    /// Name the value was registered under.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrows the payload as `T`, if it has that type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Declared type of a fixture parameter, and the key converters are
/// registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Accept the wire value as is: text becomes [`Value::Str`], nested lists
    /// become [`Value::List`].
    Any,
    /// Text.
    Str,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Floating-point number.
    Float,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// Nested list of text.
    List,
    /// Hash table.
    Hash,
    /// User-registered type, by name.
    Custom(Arc<str>),
}

impl ValueType {
    /// Declares a user-registered type.
    pub fn custom(name: impl Into<Arc<str>>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            Self::Any => "any",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::List => "list",
            Self::Hash => "hash",
            Self::Custom(name) => name,
        };
        f.write_str(name)
    }
}

//! Bidirectional conversion between wire strings and native values.
//!
//! A [`ConverterRegistry`] maps each [`ValueType`] to a [`Converter`]. Inbound
//! conversion is selected by the declared parameter type of the method being
//! called; outbound conversion by the runtime type of the returned value.
//! Callers may pass [`ConversionOverrides`] to use a different rule for one
//! call without touching the shared registry.

mod defaults;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use slim_protocol::Item;
use slim_protocol::response::{NULL, VOID};
use thiserror::Error;

use crate::value::{Value, ValueType};

pub use self::defaults::{
    BoolConverter, DateConverter, DateTimeConverter, FloatConverter, HashConverter, IntConverter,
    StrConverter, TimeConverter, YesNoConverter,
};

/// Errors raised while converting a single value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// The wire text is not valid for the target type.
    #[error("cannot convert {value:?} to {target}: {reason}")]
    Unparsable {
        /// Target type.
        target: String,
        /// Offending wire text.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
    /// A converter was handed a value of another type.
    #[error("{converter} converter cannot render a {actual} value")]
    UnexpectedValue {
        /// Type the converter handles.
        converter: String,
        /// Type of the value it received.
        actual: String,
    },
    /// No rule is registered for a user-defined type.
    #[error("no converter registered for {target}")]
    NoConverter {
        /// Type without a rule.
        target: String,
    },
    /// A nested list arrived where a scalar was declared.
    #[error("expected text for {target}, got a list")]
    ExpectedText {
        /// Declared type.
        target: String,
    },
}

impl ConversionError {
    /// Builds an [`ConversionError::Unparsable`] error.
    pub fn unparsable(target: &ValueType, value: &str, reason: impl fmt::Display) -> Self {
        Self::Unparsable {
            target: target.to_string(),
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Builds an [`ConversionError::UnexpectedValue`] error.
    #[must_use]
    pub fn unexpected(converter: &ValueType, actual: &Value) -> Self {
        Self::UnexpectedValue {
            converter: converter.to_string(),
            actual: actual.describe(),
        }
    }
}

/// A paired string/native transformation rule.
pub trait Converter: Send + Sync {
    /// Parses wire text into a native value.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when `wire` is not valid for the rule.
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError>;

    /// Renders a native value as wire text.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when `value` is not of the rule's type.
    fn to_wire(&self, value: &Value) -> Result<String, ConversionError>;
}

type FromWire = dyn Fn(&str) -> Result<Value, ConversionError> + Send + Sync;
type ToWire = dyn Fn(&Value) -> Result<String, ConversionError> + Send + Sync;

/// A [`Converter`] assembled from two closures.
pub struct FnConverter {
    from_wire: Box<FromWire>,
    to_wire: Box<ToWire>,
}

impl FnConverter {
    /// Pairs a parser and a renderer.
    pub fn new<F, T>(from_wire: F, to_wire: T) -> Self
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
        T: Fn(&Value) -> Result<String, ConversionError> + Send + Sync + 'static,
    {
        Self {
            from_wire: Box::new(from_wire),
            to_wire: Box::new(to_wire),
        }
    }
}

impl Converter for FnConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        (self.from_wire)(wire)
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        (self.to_wire)(value)
    }
}

impl fmt::Debug for FnConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter").finish_non_exhaustive()
    }
}

/// Converters that apply to a single call only.
#[derive(Clone, Default)]
pub struct ConversionOverrides {
    rules: HashMap<ValueType, Arc<dyn Converter>>,
}

impl ConversionOverrides {
    /// Creates an empty override table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, replacing any earlier one for the same type.
    #[must_use]
    pub fn with(mut self, value_type: ValueType, converter: Arc<dyn Converter>) -> Self {
        self.rules.insert(value_type, converter);
        self
    }

    /// Looks up the override for `value_type`.
    #[must_use]
    pub fn get(&self, value_type: &ValueType) -> Option<Arc<dyn Converter>> {
        self.rules.get(value_type).cloned()
    }

    /// Returns `true` when no overrides are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for ConversionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rules.keys()).finish()
    }
}

/// Process-wide table of conversion rules.
///
/// Lookups take a read lock and registration a write lock, so sessions on
/// different threads may convert while another registers. A poisoned lock is
/// recovered: rules are replaced whole, so a panicking writer cannot leave a
/// half-written entry behind.
#[derive(Default)]
pub struct ConverterRegistry {
    rules: RwLock<HashMap<ValueType, Arc<dyn Converter>>>,
}

impl ConverterRegistry {
    /// Creates a registry with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the default rules for the built-in types.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for (value_type, converter) in defaults::builtin_rules() {
            registry.register(value_type, converter);
        }
        registry
    }

    /// Registers `converter` for `value_type`, replacing any existing rule.
    pub fn register(&self, value_type: ValueType, converter: Arc<dyn Converter>) {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        rules.insert(value_type, converter);
    }

    /// Registers a rule built from two closures.
    pub fn register_fn<F, T>(&self, value_type: ValueType, from_wire: F, to_wire: T)
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
        T: Fn(&Value) -> Result<String, ConversionError> + Send + Sync + 'static,
    {
        self.register(value_type, Arc::new(FnConverter::new(from_wire, to_wire)));
    }

    /// Returns `true` when a rule is registered for `value_type`.
    #[must_use]
    pub fn contains(&self, value_type: &ValueType) -> bool {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(value_type)
    }

    fn lookup(
        &self,
        value_type: &ValueType,
        overrides: Option<&ConversionOverrides>,
    ) -> Option<Arc<dyn Converter>> {
        overrides
            .and_then(|table| table.get(value_type))
            .or_else(|| {
                self.rules
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(value_type)
                    .cloned()
            })
    }

    /// Converts a wire item to a native value of the declared type.
    ///
    /// Types without a rule fall back to string identity, except user types,
    /// which have no sensible fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when the rule rejects the text, when a
    /// list arrives for a scalar type, or when a user type has no rule.
    pub fn convert_in(
        &self,
        item: &Item,
        target: &ValueType,
        overrides: Option<&ConversionOverrides>,
    ) -> Result<Value, ConversionError> {
        match (item, target) {
            (Item::List(items), ValueType::Any | ValueType::List) => Ok(Value::List(
                items
                    .iter()
                    .map(|nested| self.convert_in(nested, &ValueType::Any, overrides))
                    .collect::<Result<_, _>>()?,
            )),
            (Item::List(_), _) => Err(ConversionError::ExpectedText {
                target: target.to_string(),
            }),
            (Item::Text(text), _) => match self.lookup(target, overrides) {
                Some(converter) => converter.from_wire(text),
                None if matches!(target, ValueType::Custom(_)) => {
                    Err(ConversionError::NoConverter {
                        target: target.to_string(),
                    })
                }
                None => Ok(Value::Str(text.clone())),
            },
        }
    }

    /// Converts a native value to a wire item.
    ///
    /// A top-level [`Value::Void`] renders as the void token; inside a list it
    /// renders as `null`. Built-in types without a registered rule use their
    /// default rendering.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when a rule rejects the value or a user
    /// type has no rule.
    pub fn convert_out(
        &self,
        value: &Value,
        overrides: Option<&ConversionOverrides>,
    ) -> Result<Item, ConversionError> {
        match value {
            Value::Void => Ok(Item::from(VOID)),
            Value::List(values) => values
                .iter()
                .map(|element| match element {
                    Value::Void => Ok(Item::from(NULL)),
                    other => self.convert_out(other, overrides),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Item::List),
            scalar => self.render(scalar, overrides).map(Item::Text),
        }
    }

    /// Renders a non-list value as wire text.
    ///
    /// # Errors
    ///
    /// As for [`ConverterRegistry::convert_out`].
    pub fn render(
        &self,
        value: &Value,
        overrides: Option<&ConversionOverrides>,
    ) -> Result<String, ConversionError> {
        let value_type = value.value_type();
        if let Some(converter) = self.lookup(&value_type, overrides) {
            return converter.to_wire(value);
        }
        match defaults::builtin_rule(&value_type) {
            Some(converter) => converter.to_wire(value),
            None => Err(ConversionError::NoConverter {
                target: value_type.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ConverterRegistry")
            .field("types", &rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests;

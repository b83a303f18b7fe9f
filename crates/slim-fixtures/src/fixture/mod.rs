//! The capability contract fixtures implement.
//!
//! A fixture class is described by a [`FixtureClass`]: a name, a constructor
//! and a table of methods. Each constructor and method declares the
//! [`ValueType`] of its parameters so the converter layer can turn wire
//! strings into [`Value`]s before the call. Classes are usually assembled with
//! [`ClassBuilder`] from closures over a concrete Rust type:
//!
//! ```ignore
//! let class = FixtureClass::builder::<Counter>("Counter")
//!     .default_constructor()
//!     .method("add", [ValueType::Int], |counter, args| {
//!         counter.total += args.int(0)?;
//!         Ok(())
//!     })
//!     .method("total", [], |counter, _| Ok(counter.total))
//!     .build();
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;
use time::{Date, PrimitiveDateTime, Time};

use crate::convert::ConversionOverrides;
use crate::naming::method_aliases;
use crate::value::{Value, ValueType};

/// Failure raised by fixture code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FixtureError {
    message: String,
    stop_test: bool,
}

impl FixtureError {
    /// Creates an ordinary failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stop_test: false,
        }
    }

    /// Creates a failure that asks the harness to abandon the current test.
    pub fn stop_test(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stop_test: true,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the harness should stop the current test.
    #[must_use]
    pub const fn is_stop_test(&self) -> bool {
        self.stop_test
    }
}

/// Builds the error reported when the wire argument count does not match the
/// declared parameters.
#[must_use]
pub fn arity_error(expected: usize, actual: usize) -> FixtureError {
    FixtureError::new(format!("expected {expected} argument(s), got {actual}"))
}

/// Converted positional arguments handed to a constructor or method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
}

macro_rules! typed_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $output:ty, $type_name:literal) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns [`FixtureError`] when the argument is missing or has
        /// another type.
        pub fn $name(&self, index: usize) -> Result<$output, FixtureError> {
            match self.get(index)? {
                Value::$variant(inner) => Ok(inner.clone()),
                other => Err(Self::mismatch(index, $type_name, other)),
            }
        }
    };
}

impl Args {
    /// Wraps converted values.
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrows the argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when there is no such argument.
    pub fn get(&self, index: usize) -> Result<&Value, FixtureError> {
        self.values
            .get(index)
            .ok_or_else(|| FixtureError::new(format!("missing argument {index}")))
    }

    /// Borrows a text argument.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the argument is missing or not text.
    pub fn str(&self, index: usize) -> Result<&str, FixtureError> {
        match self.get(index)? {
            Value::Str(text) => Ok(text),
            other => Err(Self::mismatch(index, "str", other)),
        }
    }

    typed_accessor!(
        /// Reads a boolean argument.
        bool, Bool, bool, "bool"
    );
    typed_accessor!(
        /// Reads an integer argument.
        int, Int, i64, "int"
    );
    typed_accessor!(
        /// Reads a floating-point argument.
        float, Float, f64, "float"
    );
    typed_accessor!(
        /// Reads a date argument.
        date, Date, Date, "date"
    );
    typed_accessor!(
        /// Reads a time argument.
        time, Time, Time, "time"
    );
    typed_accessor!(
        /// Reads a date-time argument.
        datetime, DateTime, PrimitiveDateTime, "datetime"
    );

    /// Borrows a list argument.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the argument is missing or not a list.
    pub fn list(&self, index: usize) -> Result<&[Value], FixtureError> {
        match self.get(index)? {
            Value::List(values) => Ok(values),
            other => Err(Self::mismatch(index, "list", other)),
        }
    }

    /// Borrows a hash-table argument.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the argument is missing or not a hash.
    pub fn hash(&self, index: usize) -> Result<&[(String, String)], FixtureError> {
        match self.get(index)? {
            Value::Hash(pairs) => Ok(pairs),
            other => Err(Self::mismatch(index, "hash", other)),
        }
    }

    /// Borrows the payload of a user-typed argument.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the argument is missing, not a custom
    /// value, or holds another Rust type.
    pub fn custom<T: Any>(&self, index: usize) -> Result<&T, FixtureError> {
        match self.get(index)? {
            Value::Custom(custom) => custom.downcast_ref::<T>().ok_or_else(|| {
                FixtureError::new(format!(
                    "argument {index}: {} value has an unexpected payload",
                    custom.type_name()
                ))
            }),
            other => Err(Self::mismatch(index, std::any::type_name::<T>(), other)),
        }
    }

    /// Consumes the arguments, returning the values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn mismatch(index: usize, expected: &str, actual: &Value) -> FixtureError {
        FixtureError::new(format!(
            "argument {index}: expected {expected}, got {}",
            actual.describe()
        ))
    }
}

type Factory = dyn Fn(Args) -> Result<Box<dyn Any + Send>, FixtureError> + Send + Sync;
type Invoker = dyn Fn(&mut dyn Any, Args) -> Result<Value, FixtureError> + Send + Sync;

/// A callable method and the types of its parameters.
pub struct MethodDescriptor {
    name: String,
    params: Vec<ValueType>,
    overrides: Option<ConversionOverrides>,
    invoker: Box<Invoker>,
}

impl MethodDescriptor {
    /// Registered method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, in order.
    #[must_use]
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Converters to use for this method instead of the shared registry.
    #[must_use]
    pub const fn overrides(&self) -> Option<&ConversionOverrides> {
        self.overrides.as_ref()
    }

    fn invoke(&self, target: &mut dyn Any, args: Args) -> Result<Value, FixtureError> {
        if args.len() != self.params.len() {
            return Err(arity_error(self.params.len(), args.len()));
        }
        (self.invoker)(target, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

struct Constructor {
    params: Vec<ValueType>,
    factory: Box<Factory>,
}

/// Descriptor for a fixture class.
pub struct FixtureClass {
    name: String,
    constructor: Constructor,
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl FixtureClass {
    /// Starts describing a class backed by the Rust type `T`.
    pub fn builder<T: Any + Send>(name: impl Into<String>) -> ClassBuilder<T> {
        ClassBuilder::new(name)
    }

    /// Registered class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared constructor parameter types.
    #[must_use]
    pub fn constructor_params(&self) -> &[ValueType] {
        &self.constructor.params
    }

    /// Looks up a method by its registered name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(name).cloned()
    }

    /// Looks up a method by name, trying the exact name, then its
    /// lowerCamelCase and snake_case spellings.
    #[must_use]
    pub fn find_method(&self, requested: &str) -> Option<Arc<MethodDescriptor>> {
        method_aliases(requested)
            .iter()
            .find_map(|alias| self.method(alias))
    }

    /// Registered method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs the constructor.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the argument count is wrong or the
    /// constructor fails.
    pub fn instantiate(self: &Arc<Self>, args: Args) -> Result<FixtureInstance, FixtureError> {
        let expected = self.constructor.params.len();
        if args.len() != expected {
            return Err(arity_error(expected, args.len()));
        }
        let state = (self.constructor.factory)(args)?;
        Ok(FixtureInstance {
            class: Arc::clone(self),
            state,
        })
    }
}

impl fmt::Debug for FixtureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureClass")
            .field("name", &self.name)
            .field("constructor_params", &self.constructor.params)
            .field("methods", &self.method_names())
            .finish()
    }
}

/// A live fixture object.
pub struct FixtureInstance {
    class: Arc<FixtureClass>,
    state: Box<dyn Any + Send>,
}

impl FixtureInstance {
    /// The class this instance was made from.
    #[must_use]
    pub fn class(&self) -> &Arc<FixtureClass> {
        &self.class
    }

    /// Name of the class this instance was made from.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Resolves a method on this instance's class.
    #[must_use]
    pub fn find_method(&self, requested: &str) -> Option<Arc<MethodDescriptor>> {
        self.class.find_method(requested)
    }

    /// Invokes `method` with already converted arguments.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the argument count is wrong or the
    /// method fails.
    pub fn invoke(&mut self, method: &MethodDescriptor, args: Args) -> Result<Value, FixtureError> {
        method.invoke(&mut *self.state, args)
    }

    /// Borrows the underlying Rust value.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }
}

impl fmt::Debug for FixtureInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureInstance")
            .field("class", &self.class.name)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`FixtureClass`] from closures over `T`.
pub struct ClassBuilder<T> {
    name: String,
    constructor: Option<Constructor>,
    methods: HashMap<String, Arc<MethodDescriptor>>,
    marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send> ClassBuilder<T> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            methods: HashMap::new(),
            marker: PhantomData,
        }
    }

    /// Sets the constructor and its parameter types.
    #[must_use]
    pub fn constructor<P, F>(mut self, params: P, factory: F) -> Self
    where
        P: IntoIterator<Item = ValueType>,
        F: Fn(Args) -> Result<T, FixtureError> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            params: params.into_iter().collect(),
            factory: Box::new(move |args: Args| {
                factory(args).map(|state| Box::new(state) as Box<dyn Any + Send>)
            }),
        });
        self
    }

    /// Uses `T::default()` as a no-argument constructor.
    #[must_use]
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor([], |_| Ok(T::default()))
    }

    /// Adds a method, replacing any earlier one with the same name.
    #[must_use]
    pub fn method<P, F, R>(self, name: impl Into<String>, params: P, body: F) -> Self
    where
        P: IntoIterator<Item = ValueType>,
        F: Fn(&mut T, Args) -> Result<R, FixtureError> + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.insert_method(name.into(), params, None, body)
    }

    /// Adds a method whose arguments and result use `overrides` in
    /// preference to the shared converter registry.
    #[must_use]
    pub fn method_with_overrides<P, F, R>(
        self,
        name: impl Into<String>,
        params: P,
        overrides: ConversionOverrides,
        body: F,
    ) -> Self
    where
        P: IntoIterator<Item = ValueType>,
        F: Fn(&mut T, Args) -> Result<R, FixtureError> + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.insert_method(name.into(), params, Some(overrides), body)
    }

    fn insert_method<P, F, R>(
        mut self,
        name: String,
        params: P,
        overrides: Option<ConversionOverrides>,
        body: F,
    ) -> Self
    where
        P: IntoIterator<Item = ValueType>,
        F: Fn(&mut T, Args) -> Result<R, FixtureError> + Send + Sync + 'static,
        R: Into<Value>,
    {
        let class = self.name.clone();
        let invoker = move |target: &mut dyn Any, args: Args| -> Result<Value, FixtureError> {
            let state = target.downcast_mut::<T>().ok_or_else(|| {
                FixtureError::new(format!("instance is not a {class}"))
            })?;
            body(state, args).map(Into::into)
        };
        let descriptor = MethodDescriptor {
            name: name.clone(),
            params: params.into_iter().collect(),
            overrides,
            invoker: Box::new(invoker),
        };
        self.methods.insert(name, Arc::new(descriptor));
        self
    }

    /// Finishes the class. Without a constructor, instantiation fails.
    #[must_use]
    pub fn build(self) -> FixtureClass {
        let class = self.name.clone();
        let constructor = self.constructor.unwrap_or_else(|| Constructor {
            params: Vec::new(),
            factory: Box::new(move |_: Args| {
                Err(FixtureError::new(format!("{class} has no constructor")))
            }),
        });
        FixtureClass {
            name: self.name,
            constructor,
            methods: self.methods,
        }
    }
}

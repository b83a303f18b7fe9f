//! Fixture contract, type conversion, and class lookup for Slim servers.
//!
//! Fixtures are ordinary Rust types described to the server through a
//! [`FixtureClass`]. The server never inspects fixture code: it resolves a
//! class by name in a [`FixtureCatalog`], converts wire strings into
//! [`Value`]s with a [`ConverterRegistry`] according to each method's declared
//! parameter types, and converts the returned [`Value`] back to wire text.

pub mod catalog;
pub mod convert;
pub mod fixture;
pub mod naming;
pub mod value;

pub use self::catalog::{CatalogError, FixtureCatalog};
pub use self::convert::{
    BoolConverter, ConversionError, ConversionOverrides, Converter, ConverterRegistry,
    DateConverter, DateTimeConverter, FloatConverter, FnConverter, HashConverter, IntConverter,
    StrConverter, TimeConverter, YesNoConverter,
};
pub use self::fixture::{
    Args, ClassBuilder, FixtureClass, FixtureError, FixtureInstance, MethodDescriptor,
    arity_error,
};
pub use self::value::{CustomValue, Value, ValueType};

#[cfg(test)]
mod tests;

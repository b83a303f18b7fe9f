//! Session symbol table and `$name` substitution.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use slim_protocol::Item;
use thiserror::Error;

static SYMBOL_REFERENCE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z]\w*)"));

/// Errors raised while substituting symbol references.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SymbolError {
    /// A `$name` reference has no binding.
    #[error("${name}")]
    Unresolved {
        /// Referenced symbol, without the `$`.
        name: String,
    },
    /// The reference pattern failed to compile.
    #[error("symbol pattern is invalid: {message}")]
    Pattern {
        /// Compiler diagnostic.
        message: String,
    },
}

/// Name to wire-string bindings for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    values: HashMap<String, String>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any earlier value.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every binding.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Replaces every `$name` reference in `text` with its bound value.
    ///
    /// Substituted values are not scanned again.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::Unresolved`] for the first reference without a
    /// binding.
    pub fn substitute(&self, text: &str) -> Result<String, SymbolError> {
        let pattern = SYMBOL_REFERENCE
            .as_ref()
            .map_err(|error| SymbolError::Pattern {
                message: error.to_string(),
            })?;
        let mut resolved = String::with_capacity(text.len());
        let mut copied = 0;
        for captures in pattern.captures_iter(text) {
            let (Some(reference), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = self
                .get(name.as_str())
                .ok_or_else(|| SymbolError::Unresolved {
                    name: name.as_str().to_owned(),
                })?;
            resolved.push_str(text.get(copied..reference.start()).unwrap_or_default());
            resolved.push_str(value);
            copied = reference.end();
        }
        resolved.push_str(text.get(copied..).unwrap_or_default());
        Ok(resolved)
    }

    /// Substitutes references in an argument, recursing into nested lists.
    ///
    /// # Errors
    ///
    /// As for [`SymbolTable::substitute`].
    pub fn substitute_item(&self, item: &Item) -> Result<Item, SymbolError> {
        match item {
            Item::Text(text) => self.substitute(text).map(Item::Text),
            Item::List(items) => self.substitute_all(items).map(Item::List),
        }
    }

    /// Substitutes references in every argument, in order.
    ///
    /// # Errors
    ///
    /// As for [`SymbolTable::substitute`].
    pub fn substitute_all(&self, items: &[Item]) -> Result<Vec<Item>, SymbolError> {
        items.iter().map(|item| self.substitute_item(item)).collect()
    }
}

//! Registry of fixture classes, grouped by package.
//!
//! Packages play the role of search paths: a session imports a package name
//! and may then refer to that package's classes by their short names. Lookups
//! never fail for a structurally valid name that is simply absent; they return
//! [`CatalogError::ClassNotFound`] so the caller can answer in band.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use crate::fixture::FixtureClass;
use crate::naming::normalise_class_name;

const CATALOG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::catalog");

/// Errors raised by catalogue lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No class matched the requested name.
    #[error("{name} not found in {}", describe_paths(.searched))]
    ClassNotFound {
        /// Name as requested.
        name: String,
        /// Qualified names that were tried.
        searched: Vec<String>,
    },
    /// The requested name is empty after trimming.
    #[error("class name is empty")]
    EmptyName,
}

fn describe_paths(searched: &[String]) -> String {
    if searched.is_empty() {
        "any package".to_owned()
    } else {
        searched.join(", ")
    }
}

type Package = HashMap<String, Arc<FixtureClass>>;

/// Thread-safe map from package name to fixture classes.
#[derive(Debug, Default)]
pub struct FixtureCatalog {
    packages: RwLock<HashMap<String, Package>>,
}

impl FixtureCatalog {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class` under `package`, replacing any class of the same
    /// name, and returns the shared descriptor.
    pub fn register_class(&self, package: &str, class: FixtureClass) -> Arc<FixtureClass> {
        let shared = Arc::new(class);
        let mut packages = self.packages.write().unwrap_or_else(PoisonError::into_inner);
        packages
            .entry(package.to_owned())
            .or_default()
            .insert(shared.name().to_owned(), Arc::clone(&shared));
        debug!(
            target: CATALOG_TARGET,
            package,
            class = shared.name(),
            "registered fixture class"
        );
        shared
    }

    /// Returns `true` when at least one class was registered under `path`.
    #[must_use]
    pub fn contains_package(&self, path: &str) -> bool {
        self.packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    /// Registered package names, sorted.
    #[must_use]
    pub fn packages(&self) -> Vec<String> {
        let packages = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = packages.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Resolves a class name.
    ///
    /// A qualified name (`package.Class`) is tried as is first. The name is
    /// then tried relative to each entry of `search_paths`, in order. Names
    /// containing spaces are folded to UpperCamelCase before lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ClassNotFound`] listing every qualified name
    /// tried, or [`CatalogError::EmptyName`] for a blank name.
    pub fn resolve<S: AsRef<str>>(
        &self,
        name: &str,
        search_paths: &[S],
    ) -> Result<Arc<FixtureClass>, CatalogError> {
        let normalised = normalise_class_name(name);
        if normalised.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let candidates = std::iter::once(normalised.clone()).chain(
            search_paths
                .iter()
                .map(|path| format!("{}.{normalised}", path.as_ref())),
        );
        let packages = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        let mut searched = Vec::new();
        for candidate in candidates {
            let Some((package, class)) = candidate.rsplit_once('.') else {
                continue;
            };
            if let Some(found) = packages.get(package).and_then(|classes| classes.get(class)) {
                return Ok(Arc::clone(found));
            }
            searched.push(candidate);
        }
        Err(CatalogError::ClassNotFound {
            name: name.to_owned(),
            searched,
        })
    }
}

#[cfg(test)]
mod tests;

//! Per-session execution state.

use std::collections::HashMap;

use slim_fixtures::FixtureInstance;

use super::symbols::SymbolTable;

const LIBRARY_PREFIX: &str = "library";

/// Everything one session has built up: symbols, live fixture instances and
/// fixture search paths.
///
/// A context is owned by a single session and never shared.
#[derive(Debug, Default)]
pub struct SessionContext {
    symbols: SymbolTable,
    instances: HashMap<String, FixtureInstance>,
    libraries: Vec<String>,
    initial_paths: Vec<String>,
    search_paths: Vec<String>,
}

impl SessionContext {
    /// Creates an empty context whose search paths start with
    /// `initial_paths`.
    #[must_use]
    pub fn new(initial_paths: Vec<String>) -> Self {
        Self {
            search_paths: initial_paths.clone(),
            initial_paths,
            ..Self::default()
        }
    }

    /// The symbol table.
    #[must_use]
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Binds a symbol to a wire string.
    pub fn bind_symbol(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.symbols.bind(name, value);
    }

    /// Search paths in resolution order.
    #[must_use]
    pub fn search_paths(&self) -> &[String] {
        &self.search_paths
    }

    /// Appends a search path unless it is already present.
    pub fn add_search_path(&mut self, path: &str) {
        if !self.search_paths.iter().any(|known| known == path) {
            self.search_paths.push(path.to_owned());
        }
    }

    /// Binds an instance, replacing any earlier one of the same name.
    ///
    /// Instances whose name starts with `library` (in any case) are also
    /// remembered as libraries, most recent last.
    pub fn insert_instance(&mut self, name: &str, instance: FixtureInstance) {
        self.libraries.retain(|library| library != name);
        if is_library_name(name) {
            self.libraries.push(name.to_owned());
        }
        self.instances.insert(name.to_owned(), instance);
    }

    /// Borrows an instance.
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&FixtureInstance> {
        self.instances.get(name)
    }

    /// Borrows an instance mutably.
    pub fn instance_mut(&mut self, name: &str) -> Option<&mut FixtureInstance> {
        self.instances.get_mut(name)
    }

    /// Library instance names, most recently made first.
    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.libraries.iter().rev().map(String::as_str)
    }

    /// Number of live instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Returns the context to its freshly created state.
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.instances.clear();
        self.libraries.clear();
        self.search_paths.clone_from(&self.initial_paths);
    }
}

fn is_library_name(name: &str) -> bool {
    name.get(..LIBRARY_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(LIBRARY_PREFIX))
}

//! Fixtures compiled into the server.
//!
//! `slim.fixtures` holds the utility fixtures and is always searched.
//! `slim.examples` carries the classic table examples so a harness can be
//! pointed at a fresh server and exercised end to end.

mod examples;

use slim_fixtures::{FixtureCatalog, FixtureClass, ValueType};

/// Package searched by every session.
pub const BUILTIN_PACKAGE: &str = "slim.fixtures";

/// Package holding the example table fixtures.
pub const EXAMPLES_PACKAGE: &str = "slim.examples";

/// Registers every built-in fixture class.
pub fn register_builtin_fixtures(catalog: &FixtureCatalog) {
    catalog.register_class(BUILTIN_PACKAGE, echo_fixture());
    examples::register(catalog);
}

#[derive(Debug, Default)]
struct EchoFixture;

/// Returns its argument unchanged: text stays text, nested lists stay
/// nested.
fn echo_fixture() -> FixtureClass {
    FixtureClass::builder::<EchoFixture>("EchoFixture")
        .default_constructor()
        .method("echo", [ValueType::Any], |_, args| {
            args.get(0).cloned()
        })
        .build()
}

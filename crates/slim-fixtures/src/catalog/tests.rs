//! Tests for class resolution.

use rstest::{fixture, rstest};

use super::*;

#[derive(Default)]
struct Milk;

fn class(name: &str) -> FixtureClass {
    FixtureClass::builder::<Milk>(name).default_constructor().build()
}

#[fixture]
fn catalog() -> FixtureCatalog {
    let catalog = FixtureCatalog::new();
    catalog.register_class("slim.examples", class("ShouldIBuyMilk"));
    catalog.register_class("slim.fixtures", class("EchoFixture"));
    catalog.register_class("other", class("EchoFixture"));
    catalog
}

#[rstest]
fn resolves_fully_qualified_names(catalog: FixtureCatalog) {
    let found = catalog
        .resolve::<&str>("slim.examples.ShouldIBuyMilk", &[])
        .expect("qualified lookup");
    assert_eq!(found.name(), "ShouldIBuyMilk");
}

#[rstest]
#[case::short("ShouldIBuyMilk")]
#[case::spaced("should I buy milk")]
fn resolves_short_names_through_search_paths(catalog: FixtureCatalog, #[case] name: &str) {
    let found = catalog
        .resolve(name, &["slim.fixtures", "slim.examples"])
        .expect("short lookup");
    assert_eq!(found.name(), "ShouldIBuyMilk");
}

#[rstest]
fn search_paths_are_tried_in_order(catalog: FixtureCatalog) {
    let from_other = catalog
        .resolve("EchoFixture", &["other", "slim.fixtures"])
        .expect("lookup");
    let from_builtin = catalog
        .resolve("EchoFixture", &["slim.fixtures", "other"])
        .expect("lookup");
    assert!(!Arc::ptr_eq(&from_other, &from_builtin));
    let again = catalog
        .resolve::<&str>("other.EchoFixture", &[])
        .expect("qualified lookup");
    assert!(Arc::ptr_eq(&from_other, &again));
}

#[rstest]
fn missing_classes_report_every_candidate(catalog: FixtureCatalog) {
    let error = catalog
        .resolve("Nope", &["slim.examples"])
        .expect_err("absent");
    assert_eq!(
        error,
        CatalogError::ClassNotFound {
            name: "Nope".to_owned(),
            searched: vec!["slim.examples.Nope".to_owned()],
        }
    );
    assert_eq!(error.to_string(), "Nope not found in slim.examples.Nope");
}

#[rstest]
fn blank_names_are_rejected(catalog: FixtureCatalog) {
    assert_eq!(
        catalog.resolve::<&str>("   ", &[]).expect_err("blank"),
        CatalogError::EmptyName
    );
}

#[rstest]
fn packages_are_listed(catalog: FixtureCatalog) {
    assert!(catalog.contains_package("slim.examples"));
    assert!(!catalog.contains_package("slim"));
    assert_eq!(
        catalog.packages(),
        vec!["other", "slim.examples", "slim.fixtures"]
    );
}

#[test]
fn re_registration_replaces_the_class() {
    let catalog = FixtureCatalog::new();
    let first = catalog.register_class("pkg", class("Thing"));
    let second = catalog.register_class("pkg", class("Thing"));
    let found = catalog.resolve::<&str>("pkg.Thing", &[]).expect("lookup");
    assert!(!Arc::ptr_eq(&first, &found));
    assert!(Arc::ptr_eq(&second, &found));
}

//! Behavioural tests for the converter registry.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use slim_protocol::Item;

use crate::{ConversionError, ConverterRegistry, CustomValue, Value, ValueType};

// -----------------------------------------------------------------------------
// Test World
// -----------------------------------------------------------------------------

#[derive(Default)]
struct ConversionWorld {
    registry: Option<ConverterRegistry>,
    outcome: Option<Result<Value, ConversionError>>,
}

impl ConversionWorld {
    fn registry(&self) -> &ConverterRegistry {
        self.registry.as_ref().expect("registry configured")
    }

    fn value(&self) -> &Value {
        match self.outcome.as_ref().expect("conversion attempted") {
            Ok(value) => value,
            Err(error) => panic!("conversion failed: {error}"),
        }
    }
}

#[fixture]
fn world() -> RefCell<ConversionWorld> {
    RefCell::new(ConversionWorld::default())
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

fn value_type(name: &str) -> ValueType {
    match name {
        "int" => ValueType::Int,
        "float" => ValueType::Float,
        "date" => ValueType::Date,
        "bool" => ValueType::Bool,
        "str" => ValueType::Str,
        other => ValueType::custom(other),
    }
}

// -----------------------------------------------------------------------------
// Steps
// -----------------------------------------------------------------------------

#[given("a registry with the default converters")]
fn given_default_registry(world: &RefCell<ConversionWorld>) {
    world.borrow_mut().registry = Some(ConverterRegistry::with_defaults());
}

#[given("a converter for the {name} type")]
fn given_custom_converter(world: &RefCell<ConversionWorld>, name: String) {
    let type_name = strip_quotes(&name).to_owned();
    let target = ValueType::custom(type_name.as_str());
    let expected = target.clone();
    world.borrow().registry().register_fn(
        target,
        move |wire| Ok(Value::Custom(CustomValue::new(type_name.as_str(), wire.to_owned()))),
        move |value| match value {
            Value::Custom(custom) => custom
                .downcast_ref::<String>()
                .cloned()
                .ok_or_else(|| ConversionError::unexpected(&expected, value)),
            other => Err(ConversionError::unexpected(&expected, other)),
        },
    );
}

#[when("{wire} is converted to {target}")]
fn when_converted(world: &RefCell<ConversionWorld>, wire: String, target: String) {
    let item = Item::from(strip_quotes(&wire));
    let target_type = value_type(strip_quotes(&target));
    let outcome = world.borrow().registry().convert_in(&item, &target_type, None);
    world.borrow_mut().outcome = Some(outcome);
}

#[then("the value renders as {expected}")]
fn then_renders_as(world: &RefCell<ConversionWorld>, expected: String) {
    let state = world.borrow();
    let rendered = state
        .registry()
        .render(state.value(), None)
        .expect("render value");
    assert_eq!(rendered, strip_quotes(&expected));
}

#[then("conversion fails mentioning {fragment}")]
fn then_conversion_fails(world: &RefCell<ConversionWorld>, fragment: String) {
    let state = world.borrow();
    let error = state
        .outcome
        .as_ref()
        .expect("conversion attempted")
        .as_ref()
        .expect_err("conversion should fail");
    let fragment = strip_quotes(&fragment);
    assert!(
        error.to_string().contains(fragment),
        "expected {fragment:?} in {error}"
    );
}

// -----------------------------------------------------------------------------
// Scenarios
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/value_conversion.feature",
    name = "Integers survive a round trip"
)]
fn integers_round_trip(world: RefCell<ConversionWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/value_conversion.feature",
    name = "Floats keep a decimal point"
)]
fn floats_keep_decimal_point(world: RefCell<ConversionWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/value_conversion.feature",
    name = "Dates use the ISO calendar format"
)]
fn dates_use_iso_format(world: RefCell<ConversionWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/value_conversion.feature",
    name = "Unparsable text is rejected"
)]
fn unparsable_text_is_rejected(world: RefCell<ConversionWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/value_conversion.feature",
    name = "User types need a registered rule"
)]
fn user_types_need_a_rule(world: RefCell<ConversionWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/value_conversion.feature",
    name = "A registered rule converts a user type"
)]
fn registered_rule_converts_user_type(world: RefCell<ConversionWorld>) {
    drop(world);
}

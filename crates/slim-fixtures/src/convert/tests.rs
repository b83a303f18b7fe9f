//! Tests for the converter registry and default rules.

use std::sync::Arc;

use rstest::{fixture, rstest};
use slim_protocol::Item;
use time::macros::{date, datetime, time};

use super::*;
use crate::value::CustomValue;

#[fixture]
fn registry() -> ConverterRegistry {
    ConverterRegistry::with_defaults()
}

fn text(value: &str) -> Item {
    Item::from(value)
}

#[rstest]
#[case::bool_true(ValueType::Bool, "true", Value::Bool(true))]
#[case::bool_yes(ValueType::Bool, "Yes", Value::Bool(true))]
#[case::bool_other(ValueType::Bool, "nope", Value::Bool(false))]
#[case::int(ValueType::Int, " -42 ", Value::Int(-42))]
#[case::int_plus(ValueType::Int, "+7", Value::Int(7))]
#[case::float(ValueType::Float, "2.5", Value::Float(2.5))]
#[case::date(ValueType::Date, "2009-02-28", Value::Date(date!(2009 - 02 - 28)))]
#[case::date_unpadded(ValueType::Date, "1974-1-5", Value::Date(date!(1974 - 01 - 05)))]
#[case::time(ValueType::Time, "21:54:32", Value::Time(time!(21:54:32)))]
#[case::time_fraction(
    ValueType::Time,
    "01:02:03.456789",
    Value::Time(time!(1:02:03.456_789))
)]
#[case::time_short_fraction(ValueType::Time, "01:02:03.5", Value::Time(time!(1:02:03.5)))]
#[case::datetime(
    ValueType::DateTime,
    "2009-02-28 21:54:32.987654",
    Value::DateTime(datetime!(2009-02-28 21:54:32.987_654))
)]
#[case::str(ValueType::Str, "as is", Value::from("as is"))]
#[case::any(ValueType::Any, "$not_special", Value::from("$not_special"))]
fn converts_inbound_text(
    registry: ConverterRegistry,
    #[case] target: ValueType,
    #[case] wire: &str,
    #[case] expected: Value,
) {
    assert_eq!(
        registry.convert_in(&text(wire), &target, None).expect("convert"),
        expected
    );
}

#[rstest]
#[case::bool(Value::Bool(false), "false")]
#[case::int(Value::Int(1429), "1429")]
#[case::float_integral(Value::Float(3.0), "3.0")]
#[case::float_fraction(Value::Float(0.25), "0.25")]
#[case::date(Value::Date(date!(1979 - 12 - 15)), "1979-12-15")]
#[case::time(Value::Time(time!(8:05:00)), "08:05:00")]
#[case::time_fraction(Value::Time(time!(8:05:00.000_120)), "08:05:00.000120")]
#[case::datetime(
    Value::DateTime(datetime!(2009-02-28 21:54:32)),
    "2009-02-28 21:54:32"
)]
#[case::str(Value::from("plain"), "plain")]
fn renders_outbound_values(
    registry: ConverterRegistry,
    #[case] value: Value,
    #[case] expected: &str,
) {
    assert_eq!(
        registry.convert_out(&value, None).expect("render"),
        text(expected)
    );
}

#[rstest]
#[case::bool(Value::Bool(true))]
#[case::int(Value::Int(i64::MIN))]
#[case::float(Value::Float(-12.125))]
#[case::date(Value::Date(date!(2024 - 02 - 29)))]
#[case::time(Value::Time(time!(23:59:59.999_999)))]
#[case::datetime(Value::DateTime(datetime!(1999-12-31 23:59:59)))]
#[case::hash(Value::Hash(vec![("fname".to_owned(), "bob".to_owned())]))]
fn native_values_survive_a_round_trip(registry: ConverterRegistry, #[case] value: Value) {
    let wire = registry.convert_out(&value, None).expect("render");
    let back = registry
        .convert_in(&wire, &value.value_type(), None)
        .expect("parse");
    assert_eq!(back, value);
}

#[rstest]
#[case::bool(ValueType::Bool, "true")]
#[case::int(ValueType::Int, "-3")]
#[case::float(ValueType::Float, "1.5")]
#[case::date(ValueType::Date, "2009-02-28")]
#[case::time(ValueType::Time, "01:02:03.456789")]
#[case::datetime(ValueType::DateTime, "2009-02-28 21:54:32")]
fn canonical_wire_text_survives_a_round_trip(
    registry: ConverterRegistry,
    #[case] target: ValueType,
    #[case] wire: &str,
) {
    let native = registry.convert_in(&text(wire), &target, None).expect("parse");
    assert_eq!(registry.convert_out(&native, None).expect("render"), text(wire));
}

#[rstest]
#[case::int(ValueType::Int, "twelve")]
#[case::float(ValueType::Float, "1,5")]
#[case::date(ValueType::Date, "2009-13-01")]
#[case::date_shape(ValueType::Date, "28/02/2009")]
#[case::time(ValueType::Time, "25:00:00")]
#[case::time_fraction(ValueType::Time, "01:02:03.1234567")]
#[case::datetime(ValueType::DateTime, "2009-02-28")]
#[case::hash(ValueType::Hash, "fname=bob")]
fn rejects_unparsable_text(
    registry: ConverterRegistry,
    #[case] target: ValueType,
    #[case] wire: &str,
) {
    let error = registry
        .convert_in(&text(wire), &target, None)
        .expect_err("unparsable");
    assert!(
        matches!(error, ConversionError::Unparsable { .. }),
        "unexpected error: {error}"
    );
}

#[rstest]
fn parses_hash_table_markup(registry: ConverterRegistry) {
    let wire = concat!(
        "<table class=\"hash_table\">\n",
        "\t<tr class=\"hash_row\">\n",
        "\t\t<td class=\"hash_key\">fname</td>\n",
        "\t\t<td class=\"hash_value\">bob</td>\n",
        "\t</tr>\n",
        "\t<tr class=\"hash_row\">\n",
        "\t\t<td class=\"hash_key\">lname</td>\n",
        "\t\t<td class=\"hash_value\">martin</td>\n",
        "\t</tr>\n",
        "</table>"
    );
    let value = registry
        .convert_in(&text(wire), &ValueType::Hash, None)
        .expect("hash");
    assert_eq!(
        value,
        Value::Hash(vec![
            ("fname".to_owned(), "bob".to_owned()),
            ("lname".to_owned(), "martin".to_owned()),
        ])
    );
}

#[rstest]
fn hash_cells_with_markup_survive_the_wire(registry: ConverterRegistry) {
    let hash = Value::Hash(vec![
        ("a<b".to_owned(), "x</td><td>y".to_owned()),
        ("fish & chips".to_owned(), "&lt;literal&gt;".to_owned()),
    ]);
    let Item::Text(wire) = registry.convert_out(&hash, None).expect("hash renders") else {
        panic!("hash renders as text");
    };
    assert!(!wire.contains("x</td>"), "cell markup is escaped: {wire}");
    assert!(wire.contains("a&lt;b"));
    assert!(wire.contains("fish &amp; chips"));

    let parsed = registry
        .convert_in(&text(&wire), &ValueType::Hash, None)
        .expect("rendered hash parses");
    assert_eq!(parsed, hash);
}

#[rstest]
fn hash_cells_decode_quote_entities(registry: ConverterRegistry) {
    let wire = concat!(
        "<table class=\"hash_table\"><tr class=\"hash_row\">",
        "<td class=\"hash_key\">say</td>",
        "<td class=\"hash_value\">&quot;hi&quot; &amp; &#39;bye&#39;</td>",
        "</tr></table>"
    );
    let value = registry
        .convert_in(&text(wire), &ValueType::Hash, None)
        .expect("hash");
    assert_eq!(
        value,
        Value::Hash(vec![("say".to_owned(), "\"hi\" & 'bye'".to_owned())])
    );
}

#[rstest]
fn lists_convert_element_by_element(registry: ConverterRegistry) {
    let wire = Item::List(vec![text("a"), Item::List(vec![text("b")])]);
    let value = registry
        .convert_in(&wire, &ValueType::List, None)
        .expect("list");
    assert_eq!(
        value,
        Value::List(vec![Value::from("a"), Value::str_list(["b"])])
    );
}

#[rstest]
fn list_for_scalar_parameter_is_rejected(registry: ConverterRegistry) {
    let error = registry
        .convert_in(&Item::List(vec![]), &ValueType::Int, None)
        .expect_err("list for int");
    assert_eq!(
        error,
        ConversionError::ExpectedText {
            target: "int".to_owned()
        }
    );
}

#[rstest]
fn void_is_a_token_at_top_level_and_null_in_lists(registry: ConverterRegistry) {
    assert_eq!(
        registry.convert_out(&Value::Void, None).expect("void"),
        text("/__VOID__/")
    );
    let list = Value::List(vec![Value::Int(1), Value::Void]);
    assert_eq!(
        registry.convert_out(&list, None).expect("list"),
        Item::List(vec![text("1"), text("null")])
    );
}

#[rstest]
fn overrides_apply_to_one_call_only(registry: ConverterRegistry) {
    let overrides = ConversionOverrides::new().with(ValueType::Bool, Arc::new(YesNoConverter));
    assert_eq!(
        registry
            .convert_out(&Value::Bool(true), Some(&overrides))
            .expect("override"),
        text("yes")
    );
    assert_eq!(
        registry.convert_out(&Value::Bool(true), None).expect("default"),
        text("true")
    );
}

#[test]
fn empty_registry_falls_back_to_identity_inbound() {
    let registry = ConverterRegistry::new();
    assert_eq!(
        registry
            .convert_in(&text("12"), &ValueType::Int, None)
            .expect("identity"),
        Value::from("12")
    );
    assert_eq!(
        registry.convert_out(&Value::Int(12), None).expect("render"),
        text("12")
    );
}

#[derive(Debug, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

fn point_type() -> ValueType {
    ValueType::custom("point")
}

fn register_point(registry: &ConverterRegistry) {
    registry.register_fn(
        point_type(),
        |wire| {
            let (x, y) = wire
                .split_once(',')
                .ok_or_else(|| ConversionError::unparsable(&point_type(), wire, "missing comma"))?;
            let parse = |part: &str| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|error| ConversionError::unparsable(&point_type(), wire, error))
            };
            Ok(Value::Custom(CustomValue::new(
                "point",
                Point {
                    x: parse(x)?,
                    y: parse(y)?,
                },
            )))
        },
        |value| match value {
            Value::Custom(custom) => custom
                .downcast_ref::<Point>()
                .map(|point| format!("{},{}", point.x, point.y))
                .ok_or_else(|| ConversionError::unexpected(&point_type(), value)),
            other => Err(ConversionError::unexpected(&point_type(), other)),
        },
    );
}

#[rstest]
fn custom_types_convert_once_registered(registry: ConverterRegistry) {
    let missing = registry
        .convert_in(&text("1,2"), &point_type(), None)
        .expect_err("no rule yet");
    assert_eq!(
        missing,
        ConversionError::NoConverter {
            target: "point".to_owned()
        }
    );

    register_point(&registry);
    let value = registry
        .convert_in(&text("3, 4"), &point_type(), None)
        .expect("point");
    let Value::Custom(custom) = &value else {
        panic!("expected a custom value, got {value:?}");
    };
    assert_eq!(custom.downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));
    assert_eq!(
        registry.convert_out(&value, None).expect("render"),
        text("3,4")
    );
}

#[test]
fn registries_are_isolated() {
    let first = ConverterRegistry::with_defaults();
    let second = ConverterRegistry::with_defaults();
    register_point(&first);
    assert!(first.contains(&point_type()));
    assert!(!second.contains(&point_type()));
}

#[test]
fn later_registration_replaces_earlier() {
    let registry = ConverterRegistry::with_defaults();
    registry.register(ValueType::Bool, Arc::new(YesNoConverter));
    assert_eq!(
        registry.convert_out(&Value::Bool(false), None).expect("render"),
        text("no")
    );
}

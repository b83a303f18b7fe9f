//! Rules installed by [`super::ConverterRegistry::with_defaults`].

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month, PrimitiveDateTime, Time};

use super::{ConversionError, Converter};
use crate::value::{Value, ValueType};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");
const TIME_MICROS_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:6]");

static HASH_ROW: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(
        concat!(
            r#"(?is)<td[^>]*class\s*=\s*"hash_key"[^>]*>(.*?)</td>\s*"#,
            r#"<td[^>]*class\s*=\s*"hash_value"[^>]*>(.*?)</td>"#,
        ),
    )
});

pub(super) fn builtin_rules() -> Vec<(ValueType, Arc<dyn Converter>)> {
    [
        ValueType::Any,
        ValueType::Str,
        ValueType::Bool,
        ValueType::Int,
        ValueType::Float,
        ValueType::Date,
        ValueType::Time,
        ValueType::DateTime,
        ValueType::Hash,
    ]
    .into_iter()
    .filter_map(|value_type| builtin_rule(&value_type).map(|rule| (value_type, rule)))
    .collect()
}

pub(super) fn builtin_rule(value_type: &ValueType) -> Option<Arc<dyn Converter>> {
    let rule: Arc<dyn Converter> = match value_type {
        ValueType::Any | ValueType::Str => Arc::new(StrConverter),
        ValueType::Bool => Arc::new(BoolConverter),
        ValueType::Int => Arc::new(IntConverter),
        ValueType::Float => Arc::new(FloatConverter),
        ValueType::Date => Arc::new(DateConverter),
        ValueType::Time => Arc::new(TimeConverter),
        ValueType::DateTime => Arc::new(DateTimeConverter),
        ValueType::Hash => Arc::new(HashConverter),
        ValueType::List | ValueType::Custom(_) => return None,
    };
    Some(rule)
}

/// String identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrConverter;

impl Converter for StrConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        Ok(Value::Str(wire.to_owned()))
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        match value {
            Value::Str(text) => Ok(text.clone()),
            Value::Void => Ok(String::new()),
            other => Err(ConversionError::unexpected(&ValueType::Str, other)),
        }
    }
}

fn parse_truthy(wire: &str) -> bool {
    let lowered = wire.trim().to_ascii_lowercase();
    lowered == "true" || lowered == "yes"
}

fn expect_bool(converter: &ValueType, value: &Value) -> Result<bool, ConversionError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        other => Err(ConversionError::unexpected(converter, other)),
    }
}

/// Booleans as `true`/`false`. Inbound, `yes` is also true and any other text
/// is false.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConverter;

impl Converter for BoolConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        Ok(Value::Bool(parse_truthy(wire)))
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        let flag = expect_bool(&ValueType::Bool, value)?;
        Ok(if flag { "true" } else { "false" }.to_owned())
    }
}

/// Booleans as `yes`/`no`, for fixtures written against that convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct YesNoConverter;

impl Converter for YesNoConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        Ok(Value::Bool(parse_truthy(wire)))
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        let flag = expect_bool(&ValueType::Bool, value)?;
        Ok(if flag { "yes" } else { "no" }.to_owned())
    }
}

/// Decimal `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

impl Converter for IntConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        wire.trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|error| ConversionError::unparsable(&ValueType::Int, wire, error))
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        match value {
            Value::Int(number) => Ok(number.to_string()),
            other => Err(ConversionError::unexpected(&ValueType::Int, other)),
        }
    }
}

/// `f64`, rendered with a fractional part even when integral.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        wire.trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|error| ConversionError::unparsable(&ValueType::Float, wire, error))
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        let Value::Float(number) = value else {
            return Err(ConversionError::unexpected(&ValueType::Float, value));
        };
        let mut rendered = number.to_string();
        if !rendered.contains(['.', 'e', 'E', 'N', 'n']) {
            rendered.push_str(".0");
        }
        Ok(rendered)
    }
}

fn parse_number<T: std::str::FromStr>(
    target: &ValueType,
    wire: &str,
    part: Option<&str>,
    name: &str,
) -> Result<T, ConversionError> {
    part.map(str::trim)
        .and_then(|digits| digits.parse::<T>().ok())
        .ok_or_else(|| ConversionError::unparsable(target, wire, format!("invalid {name}")))
}

fn parse_date(target: &ValueType, wire: &str) -> Result<Date, ConversionError> {
    let mut parts = wire.trim().split('-');
    let year = parse_number::<i32>(target, wire, parts.next(), "year")?;
    let month = parse_number::<u8>(target, wire, parts.next(), "month")?;
    let day = parse_number::<u8>(target, wire, parts.next(), "day")?;
    if parts.next().is_some() {
        return Err(ConversionError::unparsable(target, wire, "trailing data"));
    }
    let calendar_month =
        Month::try_from(month).map_err(|error| ConversionError::unparsable(target, wire, error))?;
    Date::from_calendar_date(year, calendar_month, day)
        .map_err(|error| ConversionError::unparsable(target, wire, error))
}

fn parse_time(target: &ValueType, wire: &str) -> Result<Time, ConversionError> {
    let trimmed = wire.trim();
    let (clock, fraction) = match trimmed.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (trimmed, None),
    };
    let mut parts = clock.split(':');
    let hour = parse_number::<u8>(target, wire, parts.next(), "hour")?;
    let minute = parse_number::<u8>(target, wire, parts.next(), "minute")?;
    let second = parse_number::<u8>(target, wire, parts.next(), "second")?;
    if parts.next().is_some() {
        return Err(ConversionError::unparsable(target, wire, "trailing data"));
    }
    let micros = match fraction {
        Some(digits) => parse_micros(target, wire, digits)?,
        None => 0,
    };
    Time::from_hms_micro(hour, minute, second, micros)
        .map_err(|error| ConversionError::unparsable(target, wire, error))
}

fn parse_micros(target: &ValueType, wire: &str, digits: &str) -> Result<u32, ConversionError> {
    if digits.is_empty() || digits.len() > 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConversionError::unparsable(
            target,
            wire,
            "fraction must have one to six digits",
        ));
    }
    let padded = format!("{digits:0<6}");
    parse_number::<u32>(target, wire, Some(&padded), "fraction")
}

fn format_date(target: &ValueType, date: Date) -> Result<String, ConversionError> {
    date.format(DATE_FORMAT)
        .map_err(|error| ConversionError::unparsable(target, &date.to_string(), error))
}

fn format_time(target: &ValueType, time: Time) -> Result<String, ConversionError> {
    let format = if time.microsecond() == 0 {
        TIME_FORMAT
    } else {
        TIME_MICROS_FORMAT
    };
    time.format(format)
        .map_err(|error| ConversionError::unparsable(target, &time.to_string(), error))
}

/// `YYYY-MM-DD` dates. Unpadded months and days are accepted inbound.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConverter;

impl Converter for DateConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        parse_date(&ValueType::Date, wire).map(Value::Date)
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        match value {
            Value::Date(date) => format_date(&ValueType::Date, *date),
            other => Err(ConversionError::unexpected(&ValueType::Date, other)),
        }
    }
}

/// `HH:MM:SS` times with an optional fraction of up to six digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeConverter;

impl Converter for TimeConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        parse_time(&ValueType::Time, wire).map(Value::Time)
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        match value {
            Value::Time(time) => format_time(&ValueType::Time, *time),
            other => Err(ConversionError::unexpected(&ValueType::Time, other)),
        }
    }
}

/// A date and a time separated by a single space.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeConverter;

impl Converter for DateTimeConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        let target = ValueType::DateTime;
        let Some((date_part, time_part)) = wire.trim().split_once([' ', 'T']) else {
            return Err(ConversionError::unparsable(
                &target,
                wire,
                "expected '<date> <time>'",
            ));
        };
        let date = parse_date(&target, date_part)?;
        let time = parse_time(&target, time_part)?;
        Ok(Value::DateTime(PrimitiveDateTime::new(date, time)))
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        let target = ValueType::DateTime;
        match value {
            Value::DateTime(moment) => Ok(format!(
                "{} {}",
                format_date(&target, moment.date())?,
                format_time(&target, moment.time())?
            )),
            other => Err(ConversionError::unexpected(&target, other)),
        }
    }
}

/// Hash tables in FitNesse markup:
/// `<table class="hash_table">` rows of `hash_key` and `hash_value` cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashConverter;

impl Converter for HashConverter {
    fn from_wire(&self, wire: &str) -> Result<Value, ConversionError> {
        let target = ValueType::Hash;
        if !wire.to_ascii_lowercase().contains("<table") {
            return Err(ConversionError::unparsable(
                &target,
                wire,
                "expected a hash_table",
            ));
        }
        let row = HASH_ROW
            .as_ref()
            .map_err(|error| ConversionError::unparsable(&target, wire, error))?;
        let pairs = row
            .captures_iter(wire)
            .map(|captures| {
                let cell = |index| {
                    captures
                        .get(index)
                        .map_or_else(String::new, |m| unescape_markup(m.as_str().trim()))
                };
                (cell(1), cell(2))
            })
            .collect();
        Ok(Value::Hash(pairs))
    }

    fn to_wire(&self, value: &Value) -> Result<String, ConversionError> {
        let Value::Hash(pairs) = value else {
            return Err(ConversionError::unexpected(&ValueType::Hash, value));
        };
        let mut html = String::from("<table class=\"hash_table\">");
        for (key, cell) in pairs {
            html.push_str("<tr class=\"hash_row\"><td class=\"hash_key\">");
            html.push_str(&escape_markup(key));
            html.push_str("</td><td class=\"hash_value\">");
            html.push_str(&escape_markup(cell));
            html.push_str("</td></tr>");
        }
        html.push_str("</table>");
        Ok(html)
    }
}

/// Escapes text for a table cell so it cannot close or open markup.
fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Reverses [`escape_markup`], also accepting quote entities from
/// hand-written tables. `&amp;` is decoded last so `&amp;lt;` stays `&lt;`.
fn unescape_markup(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

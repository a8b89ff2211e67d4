//! Built-in formatters
//!
//! Every formatter passes `Null` through unchanged and returns values it
//! cannot interpret as they are.

use rust_decimal::Decimal;

use crate::error::HandlerResult;
use crate::format::{format_datetime, format_number};
use crate::value::Value;

/// Largest decimal count accepted by `number`, `percent` and `currency`
const MAX_DECIMALS: u32 = 28;

/// `upper`: uppercase text
pub fn upper(value: &Value, _parameters: &[String]) -> HandlerResult<Value> {
    Ok(map_text(value, |text| text.to_uppercase()))
}

/// `lower`: lowercase text
pub fn lower(value: &Value, _parameters: &[String]) -> HandlerResult<Value> {
    Ok(map_text(value, |text| text.to_lowercase()))
}

/// `titlecase`: capitalize the first letter of every word, lowercase the rest
pub fn titlecase(value: &Value, _parameters: &[String]) -> HandlerResult<Value> {
    Ok(map_text(value, |text| {
        let mut result = String::with_capacity(text.len());
        let mut capitalize_next = true;

        for ch in text.chars() {
            if !ch.is_alphanumeric() {
                result.push(ch);
                capitalize_next = true;
            } else if capitalize_next {
                result.extend(ch.to_uppercase());
                capitalize_next = false;
            } else {
                result.extend(ch.to_lowercase());
            }
        }

        result
    }))
}

/// `mask(pattern)`: fill each `#` in the pattern with the next character
///
/// `{{Code:mask(##-###)}}` turns `12345` into `12-345`.
pub fn mask(value: &Value, parameters: &[String]) -> HandlerResult<Value> {
    match (value, parameters.first()) {
        (Value::Null, _) | (_, None) => Ok(value.clone()),
        (value, Some(pattern)) => Ok(Value::String(apply_mask(&value.to_string(), pattern))),
    }
}

fn apply_mask(text: &str, pattern: &str) -> String {
    let mut chars = text.chars();
    let mut result = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '#' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// `phone(pattern = "(###) ###-####")`: strip separators, then mask
pub fn phone(value: &Value, parameters: &[String]) -> HandlerResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let digits: String = value
        .to_string()
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let pattern = parameters
        .first()
        .map(String::as_str)
        .unwrap_or("(###) ###-####");
    Ok(Value::String(apply_mask(&digits, pattern)))
}

/// `truncate(length, suffix = "...")`: shorten text longer than `length`
pub fn truncate(value: &Value, parameters: &[String]) -> HandlerResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let text = value.to_string();
    let Some(length) = parameters.first().and_then(|p| p.trim().parse::<usize>().ok()) else {
        return Ok(Value::String(text));
    };
    if text.chars().count() <= length {
        return Ok(Value::String(text));
    }
    let suffix = parameters.get(1).map(String::as_str).unwrap_or("...");
    let mut result: String = text.chars().take(length).collect();
    result.push_str(suffix);
    Ok(Value::String(result))
}

/// `currency(code = "USD")`: format an amount in a currency's local style
///
/// Supported codes: USD, CAD, AUD (`$1,234.56`), GBP (`£1,234.56`),
/// JPY (`¥1,235`) and EUR (`1 234,56 €`). Other codes use the USD style.
pub fn currency(value: &Value, parameters: &[String]) -> HandlerResult<Value> {
    let Some(amount) = value.as_decimal() else {
        return Ok(value.clone());
    };
    let code = parameters
        .first()
        .map(|c| c.trim().to_uppercase())
        .unwrap_or_else(|| "USD".to_string());

    let formatted = match code.as_str() {
        "EUR" => {
            let grouped = grouped(amount.abs(), 2);
            let local: String = grouped
                .chars()
                .map(|c| match c {
                    ',' => '\u{a0}',
                    '.' => ',',
                    c => c,
                })
                .collect();
            format!("{}{}\u{a0}€", sign(amount, 2), local)
        }
        "GBP" => format!("{}£{}", sign(amount, 2), grouped(amount.abs(), 2)),
        "JPY" => format!("{}¥{}", sign(amount, 0), grouped(amount.abs(), 0)),
        _ => format!("{}${}", sign(amount, 2), grouped(amount.abs(), 2)),
    };
    Ok(Value::String(formatted))
}

fn grouped(amount: Decimal, decimals: u32) -> String {
    format_number(amount, &format!("N{}", decimals)).unwrap_or_else(|| amount.to_string())
}

/// `-` when the amount is still negative after rounding
fn sign(amount: Decimal, decimals: u32) -> &'static str {
    if amount.is_sign_negative() && !amount.abs().round_dp(decimals).is_zero() {
        "-"
    } else {
        ""
    }
}

fn decimals_parameter(parameters: &[String]) -> u32 {
    parameters
        .first()
        .and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(0)
        .min(MAX_DECIMALS)
}

/// `number(decimals = 0)`: thousands separators and fixed decimals
pub fn number(value: &Value, parameters: &[String]) -> HandlerResult<Value> {
    let Some(n) = value.as_decimal() else {
        return Ok(value.clone());
    };
    let pattern = format!("N{}", decimals_parameter(parameters));
    Ok(format_number(n, &pattern).map_or_else(|| value.clone(), Value::String))
}

/// `percent(decimals = 0)`: multiply by 100 and append `%`
pub fn percent(value: &Value, parameters: &[String]) -> HandlerResult<Value> {
    let Some(n) = value.as_decimal() else {
        return Ok(value.clone());
    };
    let pattern = format!("P{}", decimals_parameter(parameters));
    Ok(format_number(n, &pattern).map_or_else(|| value.clone(), Value::String))
}

/// `date(pattern = "d")`: format a date or a string that parses as one
pub fn date(value: &Value, parameters: &[String]) -> HandlerResult<Value> {
    let Some(dt) = value.as_datetime() else {
        return Ok(value.clone());
    };
    let pattern = parameters.first().map(String::as_str).unwrap_or("d");
    Ok(format_datetime(&dt, pattern).map_or_else(|| value.clone(), Value::String))
}

fn map_text<F: FnOnce(&str) -> String>(value: &Value, f: F) -> Value {
    match value {
        Value::Null => Value::Null,
        other => Value::String(f(&other.to_string())),
    }
}

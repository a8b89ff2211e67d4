//! Native pattern formatting
//!
//! Formats numbers and dates with the pattern text of a format expression
//! when no formatter is registered under that name, e.g.
//! `{{Total:#,##0.00}}`, `{{Rate:P1}}` or `{{Due:yyyy-MM-dd}}`.
//!
//! Output follows en-US conventions: `,` groups thousands, `.` is the
//! decimal point, and dates use English month and day names.

use chrono::{Datelike, NaiveDateTime, Timelike};
use lazy_regex::regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::value::Value;

/// Format a value with a native pattern
///
/// Returns `None` when the value is not a number or date, or when the
/// pattern means nothing for it.
pub fn format_value(value: &Value, pattern: &str) -> Option<String> {
    match value {
        Value::Number(n) => format_number(*n, pattern),
        Value::DateTime(dt) => format_datetime(dt, pattern),
        _ => None,
    }
}

// === Numbers ===

/// Format a number with a standard (`N2`, `P0`, `C`) or custom (`#,##0.00`) pattern
pub fn format_number(value: Decimal, pattern: &str) -> Option<String> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return None;
    }
    if let Some(caps) = regex!(r"^([NnFfPpCcDdEeGg])(\d{1,2})?$").captures(pattern) {
        let precision = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let letter = caps[1].chars().next()?;
        return format_standard_number(value, letter, precision);
    }
    format_custom_number(value, pattern)
}

fn format_standard_number(value: Decimal, letter: char, precision: Option<u32>) -> Option<String> {
    let negative = value.is_sign_negative() && !value.is_zero();
    let out = match letter.to_ascii_uppercase() {
        'N' => signed(group_fixed(value, precision.unwrap_or(2), true)),
        'F' => signed(group_fixed(value, precision.unwrap_or(2), false)),
        'P' => {
            let scaled = value.checked_mul(Decimal::ONE_HUNDRED)?;
            let (neg, digits) = group_fixed(scaled, precision.unwrap_or(2), true);
            signed((neg, format!("{}%", digits)))
        }
        'C' => {
            let (neg, digits) = group_fixed(value, precision.unwrap_or(2), true);
            format!("{}${}", if neg { "-" } else { "" }, digits)
        }
        'D' => {
            if !value.fract().is_zero() {
                return None;
            }
            let digits = value.abs().trunc().to_string();
            let width = precision.unwrap_or(0) as usize;
            format!(
                "{}{:0>width$}",
                if negative { "-" } else { "" },
                digits,
                width = width
            )
        }
        'E' => format_scientific(value, precision.unwrap_or(6), letter),
        'G' => value.normalize().to_string(),
        _ => return None,
    };
    Some(out)
}

fn signed((negative, digits): (bool, String)) -> String {
    if negative {
        format!("-{}", digits)
    } else {
        digits
    }
}

/// Round to `decimals` places and render the absolute value, optionally grouped
///
/// The flag is true when the rounded value is negative.
fn group_fixed(value: Decimal, decimals: u32, grouping: bool) -> (bool, String) {
    let mut rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimals);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, ""));
    let int_part = if grouping {
        group_thousands(int_part)
    } else {
        int_part.to_string()
    };
    if frac_part.is_empty() {
        (negative, int_part)
    } else {
        (negative, format!("{}.{}", int_part, frac_part))
    }
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.chars().count();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let pos_from_end = len - i;
        if pos_from_end > 1 && pos_from_end % 3 == 1 {
            out.push(',');
        }
    }
    out
}

fn format_scientific(value: Decimal, decimals: u32, e_char: char) -> String {
    if value.is_zero() {
        return format!("{:.*}{}+000", decimals as usize, 0.0, e_char);
    }
    let negative = value.is_sign_negative();
    let mut mantissa = value.abs();
    let mut exponent: i32 = 0;
    while mantissa >= Decimal::TEN {
        mantissa /= Decimal::TEN;
        exponent += 1;
    }
    while mantissa < Decimal::ONE {
        mantissa *= Decimal::TEN;
        exponent -= 1;
    }
    let (_, mut digits) = group_fixed(mantissa, decimals, false);
    // Rounding can carry the mantissa to 10
    if digits.starts_with("10") {
        mantissa /= Decimal::TEN;
        exponent += 1;
        digits = group_fixed(mantissa, decimals, false).1;
    }
    format!(
        "{}{}{}{}{:03}",
        if negative { "-" } else { "" },
        digits,
        e_char,
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    )
}

#[derive(Debug, Clone)]
struct FixedSpec {
    min_int: usize,
    int_placeholders: usize,
    min_frac: usize,
    max_frac: usize,
    grouping: bool,
    scale_commas: usize,
    has_decimal_point: bool,
}

fn format_custom_number(value: Decimal, pattern: &str) -> Option<String> {
    find_placeholder_span(pattern)?;

    let sections = split_outside_quotes(pattern, ';');
    let (section, auto_sign, value) = match sections.as_slice() {
        [_, negative, ..] if value.is_sign_negative() && !value.is_zero() => {
            (*negative, false, value.abs())
        }
        [_, _, zero, ..] if value.is_zero() => (*zero, false, value),
        [first, ..] => (*first, true, value),
        [] => return None,
    };

    let Some((start, end_placeholder)) = find_placeholder_span(section) else {
        return Some(render_literal(section));
    };

    let mut end = end_placeholder;
    while section[end..].starts_with(',') {
        end += 1;
    }

    let prefix = render_literal(&section[..start]);
    let number_raw = &section[start..end];
    let suffix = render_literal(&section[end..]);

    let mut scaled = value.abs();
    for _ in 0..count_outside_quotes(section, '%') {
        scaled = scaled.checked_mul(Decimal::ONE_HUNDRED)?;
    }

    let spec = parse_fixed(number_raw);
    for _ in 0..spec.scale_commas {
        scaled /= Decimal::ONE_THOUSAND;
    }
    let (rounded_negative, body) = format_fixed(scaled, &spec);
    let negative = value.is_sign_negative() && !value.is_zero() && !rounded_negative;

    let mut out = format!("{}{}{}", prefix, body, suffix);
    if negative && auto_sign && !body.trim_matches(['0', '.', ',']).is_empty() {
        out.insert(0, '-');
    }
    Some(out)
}

fn parse_fixed(number_raw: &str) -> FixedSpec {
    let mut raw = number_raw;
    let mut scale_commas = 0;
    while let Some(stripped) = raw.strip_suffix(',') {
        raw = stripped;
        scale_commas += 1;
    }

    let (int_pat, frac_pat) = match raw.find('.') {
        Some(pos) => (&raw[..pos], &raw[pos + 1..]),
        None => (raw, ""),
    };

    FixedSpec {
        min_int: int_pat.chars().filter(|c| *c == '0').count(),
        int_placeholders: int_pat.chars().filter(|c| matches!(c, '0' | '#')).count(),
        min_frac: frac_pat.chars().filter(|c| *c == '0').count(),
        max_frac: frac_pat.chars().filter(|c| matches!(c, '0' | '#')).count(),
        grouping: int_pat.contains(','),
        scale_commas,
        has_decimal_point: raw.contains('.'),
    }
}

fn format_fixed(value: Decimal, spec: &FixedSpec) -> (bool, String) {
    let (negative, text) = group_fixed(value, spec.max_frac as u32, false);
    let (int_digits, frac_digits) = text.split_once('.').unwrap_or((&text, ""));
    let mut int_part = int_digits.to_string();
    let mut frac_part = frac_digits.to_string();

    if spec.int_placeholders == 0 || (spec.min_int == 0 && int_part == "0") {
        int_part.clear();
    }
    while int_part.len() < spec.min_int {
        int_part.insert(0, '0');
    }
    if spec.grouping && !int_part.is_empty() {
        int_part = group_thousands(&int_part);
    }
    while frac_part.len() > spec.min_frac && frac_part.ends_with('0') {
        frac_part.pop();
    }

    let mut out = int_part;
    if spec.has_decimal_point && !frac_part.is_empty() {
        out.push('.');
        out.push_str(&frac_part);
    }
    (negative, out)
}

/// Byte span from the first to the end of the last `0`/`#` placeholder
fn find_placeholder_span(s: &str) -> Option<(usize, usize)> {
    let mut in_quotes = false;
    let mut escape = false;
    let mut first = None;
    let mut last = None;

    for (idx, ch) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_quotes {
            if ch == '"' || ch == '\'' {
                in_quotes = false;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_quotes = true,
            '\\' => escape = true,
            '0' | '#' => {
                first.get_or_insert(idx);
                last = Some(idx + 1);
            }
            _ => {}
        }
    }

    first.zip(last)
}

fn count_outside_quotes(s: &str, needle: char) -> usize {
    let mut count = 0;
    let mut in_quotes = false;
    let mut escape = false;
    for ch in s.chars() {
        if escape {
            escape = false;
        } else if in_quotes {
            in_quotes = ch != '"' && ch != '\'';
        } else if ch == '"' || ch == '\'' {
            in_quotes = true;
        } else if ch == '\\' {
            escape = true;
        } else if ch == needle {
            count += 1;
        }
    }
    count
}

fn split_outside_quotes(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escape = false;
    for (idx, ch) in s.char_indices() {
        if escape {
            escape = false;
        } else if in_quotes {
            in_quotes = ch != '"' && ch != '\'';
        } else if ch == '"' || ch == '\'' {
            in_quotes = true;
        } else if ch == '\\' {
            escape = true;
        } else if ch == separator {
            parts.push(&s[start..idx]);
            start = idx + 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Render literal pattern text: quotes are removed, `\x` yields `x`
fn render_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut quote: Option<char> = None;
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => out.push(ch),
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                _ => out.push(ch),
            },
        }
    }
    out
}

// === Dates ===

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Expand a one-letter standard date pattern
fn standard_date_pattern(letter: char) -> Option<&'static str> {
    Some(match letter {
        'd' => "M/d/yyyy",
        'D' => "dddd, MMMM d, yyyy",
        't' => "h:mm tt",
        'T' => "h:mm:ss tt",
        'f' => "dddd, MMMM d, yyyy h:mm tt",
        'F' => "dddd, MMMM d, yyyy h:mm:ss tt",
        'g' => "M/d/yyyy h:mm tt",
        'G' => "M/d/yyyy h:mm:ss tt",
        's' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss",
        'u' => "yyyy'-'MM'-'dd HH':'mm':'ss'Z'",
        'M' | 'm' => "MMMM d",
        'Y' | 'y' => "MMMM yyyy",
        _ => return None,
    })
}

fn is_date_token(ch: char) -> bool {
    matches!(ch, 'd' | 'M' | 'y' | 'H' | 'h' | 'm' | 's' | 'f' | 't')
}

/// Format a date with a standard (`d`, `D`, `s`) or custom (`yyyy-MM-dd`) pattern
pub fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut chars = pattern.chars();
    let pattern = match (chars.next(), chars.next()) {
        (Some(letter), None) => standard_date_pattern(letter)?,
        (None, _) => return None,
        _ => pattern,
    };

    if !has_date_token(pattern) {
        return None;
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '\'' | '"' => {
                i += 1;
                while i < chars.len() && chars[i] != ch {
                    out.push(chars[i]);
                    i += 1;
                }
                i += 1;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    out.push(*next);
                }
                i += 2;
            }
            c if is_date_token(c) => {
                let mut run = 1;
                while chars.get(i + run) == Some(&c) {
                    run += 1;
                }
                push_date_token(&mut out, dt, c, run);
                i += run;
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    Some(out)
}

/// Check for at least one date token outside quotes
fn has_date_token(pattern: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escape = false;
    for ch in pattern.chars() {
        if escape {
            escape = false;
            continue;
        }
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '\\' => escape = true,
                c if is_date_token(c) => return true,
                _ => {}
            },
        }
    }
    false
}

fn push_date_token(out: &mut String, dt: &NaiveDateTime, token: char, run: usize) {
    match token {
        'd' => match run {
            1 => out.push_str(&dt.day().to_string()),
            2 => out.push_str(&format!("{:02}", dt.day())),
            3 => out.push_str(&DAY_NAMES[dt.weekday().num_days_from_monday() as usize][..3]),
            _ => out.push_str(DAY_NAMES[dt.weekday().num_days_from_monday() as usize]),
        },
        'M' => match run {
            1 => out.push_str(&dt.month().to_string()),
            2 => out.push_str(&format!("{:02}", dt.month())),
            3 => out.push_str(&MONTH_NAMES[dt.month0() as usize][..3]),
            _ => out.push_str(MONTH_NAMES[dt.month0() as usize]),
        },
        'y' => {
            let year = dt.year();
            match run {
                1 => out.push_str(&(year % 100).to_string()),
                2 => out.push_str(&format!("{:02}", year % 100)),
                _ => out.push_str(&format!("{:0width$}", year, width = run)),
            }
        }
        'H' => push_padded(out, dt.hour(), run),
        'h' => {
            let hour = match dt.hour() % 12 {
                0 => 12,
                h => h,
            };
            push_padded(out, hour, run);
        }
        'm' => push_padded(out, dt.minute(), run),
        's' => push_padded(out, dt.second(), run),
        'f' => {
            let digits = run.min(9);
            let nanos = dt.nanosecond() % 1_000_000_000;
            let fraction = nanos / 10u32.pow(9 - digits as u32);
            out.push_str(&format!("{:0width$}", fraction, width = digits));
        }
        't' => {
            let marker = if dt.hour() < 12 { "AM" } else { "PM" };
            out.push_str(if run == 1 { &marker[..1] } else { marker });
        }
        _ => {}
    }
}

fn push_padded(out: &mut String, n: u32, run: usize) {
    if run >= 2 {
        out.push_str(&format!("{:02}", n));
    } else {
        out.push_str(&n.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    fn num(value: &str, pattern: &str) -> Option<String> {
        format_number(dec(value), pattern)
    }

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_milli_opt(14, 7, 9, 250)
            .unwrap()
    }

    #[test]
    fn test_standard_numbers() {
        assert_eq!(num("1234.567", "N2").as_deref(), Some("1,234.57"));
        assert_eq!(num("1234.5", "N0").as_deref(), Some("1,235"));
        assert_eq!(num("-1234.5", "N"), Some("-1,234.50".to_string()));
        assert_eq!(num("1234.5", "F1").as_deref(), Some("1234.5"));
        assert_eq!(num("0.125", "P1").as_deref(), Some("12.5%"));
        assert_eq!(num("0.5", "P0").as_deref(), Some("50%"));
        assert_eq!(num("1234.5", "C").as_deref(), Some("$1,234.50"));
        assert_eq!(num("-3", "C0").as_deref(), Some("-$3"));
        assert_eq!(num("42", "D5").as_deref(), Some("00042"));
        assert_eq!(num("4.2", "D"), None);
        assert_eq!(num("1234.5678", "E2").as_deref(), Some("1.23E+003"));
        assert_eq!(num("0.00012", "e1").as_deref(), Some("1.2e-004"));
        assert_eq!(num("2.50", "G").as_deref(), Some("2.5"));
    }

    #[test]
    fn test_midpoint_rounding() {
        assert_eq!(num("2.5", "N0").as_deref(), Some("3"));
        assert_eq!(num("-2.5", "N0").as_deref(), Some("-3"));
        assert_eq!(num("0.125", "F2").as_deref(), Some("0.13"));
    }

    #[test]
    fn test_custom_numbers() {
        assert_eq!(num("1234567.891", "#,##0.00").as_deref(), Some("1,234,567.89"));
        assert_eq!(num("0.5", "#,##0.00").as_deref(), Some("0.50"));
        assert_eq!(num("5", "000").as_deref(), Some("005"));
        assert_eq!(num("0.256", "0.0%").as_deref(), Some("25.6%"));
        assert_eq!(num("1500", "\"$\"#,##0").as_deref(), Some("$1,500"));
        assert_eq!(num("-1500", "#,##0").as_deref(), Some("-1,500"));
        assert_eq!(num("-1500", "#,##0;(#,##0)").as_deref(), Some("(1,500)"));
        assert_eq!(num("0", "#,##0;(#,##0);zero").as_deref(), Some("zero"));
        assert_eq!(num("1234567", "#,##0,").as_deref(), Some("1,235"));
        assert_eq!(num("3.10", "0.##").as_deref(), Some("3.1"));
        assert_eq!(num("3", "0.##").as_deref(), Some("3"));
    }

    #[test]
    fn test_not_a_number_pattern() {
        assert_eq!(num("1", "upper"), None);
        assert_eq!(num("1", "yyyy-MM-dd"), None);
        assert_eq!(num("1", ""), None);
    }

    #[test]
    fn test_standard_dates() {
        let dt = when();
        assert_eq!(format_datetime(&dt, "d").as_deref(), Some("3/5/2024"));
        assert_eq!(
            format_datetime(&dt, "D").as_deref(),
            Some("Tuesday, March 5, 2024")
        );
        assert_eq!(format_datetime(&dt, "t").as_deref(), Some("2:07 PM"));
        assert_eq!(format_datetime(&dt, "s").as_deref(), Some("2024-03-05T14:07:09"));
        assert_eq!(format_datetime(&dt, "u").as_deref(), Some("2024-03-05 14:07:09Z"));
        assert_eq!(format_datetime(&dt, "Y").as_deref(), Some("March 2024"));
        assert_eq!(format_datetime(&dt, "q"), None);
    }

    #[test]
    fn test_custom_dates() {
        let dt = when();
        assert_eq!(format_datetime(&dt, "yyyy-MM-dd").as_deref(), Some("2024-03-05"));
        assert_eq!(
            format_datetime(&dt, "ddd, dd MMM yy HH:mm:ss.fff").as_deref(),
            Some("Tue, 05 Mar 24 14:07:09.250")
        );
        assert_eq!(format_datetime(&dt, "hh:mm tt").as_deref(), Some("02:07 PM"));
        assert_eq!(
            format_datetime(&dt, "'Day' d \\o\\f MMMM").as_deref(),
            Some("Day 5 of March")
        );
        assert_eq!(format_datetime(&dt, "#,##0"), None);
    }

    #[test]
    fn test_format_value_dispatch() {
        assert_eq!(
            format_value(&Value::from(dec("1234.5")), "N1").as_deref(),
            Some("1,234.5")
        );
        assert_eq!(
            format_value(&Value::from(when()), "yyyy").as_deref(),
            Some("2024")
        );
        assert_eq!(format_value(&Value::from("text"), "N2"), None);
    }
}

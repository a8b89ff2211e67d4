//! Expression parser
//!
//! Recognizes `{{...}}` expressions inside cell text and splits each one into
//! variable text, operation name and parameters.
//!
//! ```text
//! {{Name}}                    standard
//! {{Price:number(2)}}         format
//! {{Url|link("Home page")}}   function
//! ```
//!
//! A `|` outside parentheses and quotes marks a function expression and wins
//! over `:`. Both can be escaped with a backslash to appear in variable text.

use crate::error::{ExprError, ExprResult};
use crate::expression::{ExpressionKind, ParsedExpression};
use lazy_regex::regex;

/// Extract every `{{...}}` occurrence from `text`, left to right
///
/// Occurrences never overlap and never contain braces.
///
/// # Example
/// ```rust
/// use cellplate_expr::extract_expressions;
///
/// let found = extract_expressions("Dear {{Name}}, you owe {{Total:currency}}");
/// assert_eq!(found, vec!["{{Name}}", "{{Total:currency}}"]);
/// ```
pub fn extract_expressions(text: &str) -> Vec<&str> {
    regex!(r"\{\{([^{}]+)\}\}")
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// Check whether `text` holds at least one expression
pub fn contains_expression(text: &str) -> bool {
    regex!(r"\{\{([^{}]+)\}\}").is_match(text)
}

/// Check whether `text` may hold a format or function expression
///
/// Only the expressions themselves are inspected, so a colon in the
/// surrounding text does not count. Parsing decides for sure.
pub fn is_enhanced_syntax(text: &str) -> bool {
    text.contains("{{")
        && extract_expressions(text)
            .iter()
            .any(|expr| expr.contains(':') || expr.contains('|'))
}

/// Parse a single `{{...}}` expression
///
/// # Example
/// ```rust
/// use cellplate_expr::{parse, ExpressionKind};
///
/// let expr = parse("{{Title|truncate(5, \"...\")}}").unwrap();
/// assert_eq!(expr.kind(), ExpressionKind::Function);
/// assert_eq!(expr.variable(), "Title");
/// assert_eq!(expr.operation(), Some("truncate"));
/// assert_eq!(expr.parameters(), &["5", "..."]);
/// ```
pub fn parse(expression: &str) -> ExprResult<ParsedExpression> {
    let inner = expression
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
        .ok_or_else(|| ExprError::malformed(expression, "expected a single {{...}} expression"))?;

    if inner.contains(['{', '}']) {
        return Err(ExprError::malformed(expression, "braces inside expression"));
    }

    let content = inner.trim();
    if content.is_empty() {
        return Err(ExprError::malformed(expression, "empty expression"));
    }

    if let Some(pos) = find_delimiter(content, '|') {
        return parse_operation(ExpressionKind::Function, content, pos, expression);
    }
    if let Some(pos) = find_delimiter(content, ':') {
        return parse_operation(ExpressionKind::Format, content, pos, expression);
    }

    let variable = unescape(content);
    let variable = match variable.strip_suffix(".Count") {
        Some(base) if !base.is_empty() && !base.contains(['.', '[', ']']) => {
            format!("{}_Count", base)
        }
        _ => variable,
    };

    Ok(ParsedExpression::standard(variable, expression.to_string()))
}

fn parse_operation(
    kind: ExpressionKind,
    content: &str,
    pos: usize,
    expression: &str,
) -> ExprResult<ParsedExpression> {
    let variable = unescape(content[..pos].trim());
    let spec = content[pos + 1..].trim();

    if variable.is_empty() {
        return Err(ExprError::malformed(expression, "empty variable"));
    }
    if spec.is_empty() {
        return Err(ExprError::malformed(expression, "empty operation"));
    }

    // Specs that are not `name` or `name(...)` are native patterns such as `#,##0.00`
    let (operation, parameters) = match regex!(r"(?s)^(\w+)\s*(?:\((.*)\))?$").captures(spec) {
        Some(caps) => (
            caps[1].to_string(),
            split_parameters(caps.get(2).map_or("", |m| m.as_str())),
        ),
        None => (spec.to_string(), Vec::new()),
    };

    Ok(ParsedExpression::with_operation(
        kind,
        variable,
        operation,
        parameters,
        expression.to_string(),
    ))
}

/// Split a raw parameter list on top-level commas
///
/// Commas inside parentheses or quotes do not split. Each parameter is
/// trimmed and loses one pair of enclosing quotes.
pub fn split_parameters(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut params = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth: u32 = 0;

    for c in raw.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if depth == 0 => {
                    params.push(finish_parameter(&current));
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    params.push(finish_parameter(&current));

    params
}

fn finish_parameter(raw: &str) -> String {
    let trimmed = raw.trim();
    for q in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(q) && trimmed.ends_with(q) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

/// Byte position of the first unescaped `delimiter` outside parentheses and quotes
fn find_delimiter(content: &str, delimiter: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut depth: u32 = 0;
    let mut escaped = false;

    for (pos, c) in content.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\\' => escaped = true,
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if c == delimiter && depth == 0 => return Some(pos),
                _ => {}
            },
        }
    }
    None
}

fn unescape(text: &str) -> String {
    text.replace("\\|", "|").replace("\\:", ":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_expressions() {
        assert!(extract_expressions("").is_empty());
        assert!(extract_expressions("plain text").is_empty());
        assert_eq!(
            extract_expressions("{{A}} and {{B:upper}} and {{C|bold}}"),
            vec!["{{A}}", "{{B:upper}}", "{{C|bold}}"]
        );
        assert_eq!(extract_expressions("{{{{x}}}}"), vec!["{{x}}"]);
        assert!(extract_expressions("{{}}").is_empty());
    }

    #[test]
    fn test_parse_standard() {
        let expr = parse("{{a.b}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Standard);
        assert_eq!(expr.variable(), "a.b");
        assert_eq!(expr.operation(), None);
        assert!(expr.parameters().is_empty());
        assert_eq!(expr.original(), "{{a.b}}");
    }

    #[test]
    fn test_parse_trims_content() {
        let expr = parse("{{  Name  }}").unwrap();
        assert_eq!(expr.variable(), "Name");
        assert_eq!(expr.original(), "{{  Name  }}");
    }

    #[test]
    fn test_parse_count_rewrite() {
        assert_eq!(parse("{{Items.Count}}").unwrap().variable(), "Items_Count");
        assert_eq!(parse("{{a.b.Count}}").unwrap().variable(), "a.b.Count");
        assert_eq!(parse("{{a[0].Count}}").unwrap().variable(), "a[0].Count");
        assert_eq!(parse("{{Items.Count:number}}").unwrap().variable(), "Items.Count");
    }

    #[test]
    fn test_parse_format() {
        let expr = parse("{{a:upper}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Format);
        assert_eq!(expr.variable(), "a");
        assert_eq!(expr.operation(), Some("upper"));
        assert!(expr.parameters().is_empty());
    }

    #[test]
    fn test_parse_function_with_parameters() {
        let expr = parse("{{a|trunc(5,...)}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Function);
        assert_eq!(expr.operation(), Some("trunc"));
        assert_eq!(expr.parameters(), &["5", "..."]);
    }

    #[test]
    fn test_pipe_wins_over_colon() {
        let expr = parse("{{a:b|c}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Function);
        assert_eq!(expr.variable(), "a:b");
        assert_eq!(expr.operation(), Some("c"));
    }

    #[test]
    fn test_delimiters_inside_quotes_and_parens() {
        let expr = parse("{{Time:date(\"HH:mm\")}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Format);
        assert_eq!(expr.variable(), "Time");
        assert_eq!(expr.parameters(), &["HH:mm"]);

        let expr = parse("{{f(a|b):upper}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Format);
        assert_eq!(expr.variable(), "f(a|b)");
    }

    #[test]
    fn test_escaped_delimiters() {
        let expr = parse(r"{{a\:b}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Standard);
        assert_eq!(expr.variable(), "a:b");

        let expr = parse(r"{{a\|b:upper}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Format);
        assert_eq!(expr.variable(), "a|b");
    }

    #[test]
    fn test_native_pattern_operation() {
        let expr = parse("{{Amount:#,##0.00}}").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Format);
        assert_eq!(expr.operation(), Some("#,##0.00"));
        assert!(expr.parameters().is_empty());

        let expr = parse("{{When:yyyy-MM-dd HH:mm}}").unwrap();
        assert_eq!(expr.operation(), Some("yyyy-MM-dd HH:mm"));
    }

    #[test]
    fn test_malformed() {
        for text in ["{{ }}", "{{:upper}}", "{{a:}}", "{{|bold}}", "{{a| }}", "Name", "{{a}"] {
            assert!(
                matches!(parse(text), Err(ExprError::Malformed { .. })),
                "{} should be malformed",
                text
            );
        }
    }

    #[test]
    fn test_split_parameters() {
        assert!(split_parameters("").is_empty());
        assert!(split_parameters("   ").is_empty());
        assert_eq!(split_parameters("1, 2"), vec!["1", "2"]);
        assert_eq!(split_parameters("'a, b', c"), vec!["a, b", "c"]);
        assert_eq!(split_parameters("\"it's\", x"), vec!["it's", "x"]);
        assert_eq!(split_parameters("f(1, 2), 3"), vec!["f(1, 2)", "3"]);
        assert_eq!(split_parameters("width=100, height=50"), vec!["width=100", "height=50"]);
        assert_eq!(split_parameters("a,"), vec!["a", ""]);
    }

    #[test]
    fn test_enhanced_syntax() {
        assert!(is_enhanced_syntax("{{a:upper}}"));
        assert!(is_enhanced_syntax("x {{a|bold}}"));
        assert!(!is_enhanced_syntax("{{a}}"));
        assert!(!is_enhanced_syntax("a:b"));
        assert!(!is_enhanced_syntax("{{Name}} at 10:30"));
        assert!(!is_enhanced_syntax("{{Name}} | {{Title}}"));
        assert!(is_enhanced_syntax("10:30 {{Name}} {{Total:C}}"));
        assert!(contains_expression("x {{y}}"));
        assert!(!contains_expression("{{}}"));
    }
}

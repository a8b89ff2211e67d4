//! Variable resolution
//!
//! Turns the variable text of an expression into a [`Value`]. Lookup order:
//!
//! 1. the binding scope (case-insensitive)
//! 2. binary arithmetic (`a * b`, `a / b`, `a + b`, `a - b`)
//! 3. the global resolver
//! 4. `name_Count` collection counts
//! 5. dotted paths (`order.Customer.Name`)
//! 6. indexers (`Lines[0].Amount`)
//!
//! Anything else is unresolved and the caller keeps the original text.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rust_decimal::Decimal;
use tracing::{trace, warn};

use cellplate_core::CellError;

use crate::bindings::Scope;
use crate::error::HandlerResult;
use crate::value::{parse_decimal, Value};

/// Fallback lookup consulted when a name is not bound
///
/// Errors and panics are treated as "not found". Closures taking `&str` implement this
/// directly.
pub trait GlobalResolver: Send + Sync {
    /// Resolve `name`, or `Ok(None)` if it is unknown
    fn resolve(&self, name: &str) -> HandlerResult<Option<Value>>;
}

impl<F> GlobalResolver for F
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn resolve(&self, name: &str) -> HandlerResult<Option<Value>> {
        Ok(self(name))
    }
}

/// Operators in the order they are tried
const OPERATORS: [&str; 4] = [" * ", " / ", " + ", " - "];

/// Read-only resolver over a binding scope and optional global fallback
#[derive(Clone)]
pub struct Resolver<'a> {
    scope: Scope<'a>,
    global: Option<&'a dyn GlobalResolver>,
}

impl<'a> Resolver<'a> {
    /// Resolver over `scope` without a global fallback
    pub fn new(scope: Scope<'a>) -> Self {
        Self {
            scope,
            global: None,
        }
    }

    /// Set the global fallback
    pub fn with_global(mut self, global: Option<&'a dyn GlobalResolver>) -> Self {
        self.global = global;
        self
    }

    /// The binding scope
    pub fn scope(&self) -> &Scope<'a> {
        &self.scope
    }

    /// Resolve variable text, or `None` if it is unresolved
    pub fn resolve(&self, text: &str) -> Option<Value> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(value) = self.scope.get(text) {
            return Some(value.clone());
        }

        if let Some(op) = OPERATORS.iter().find(|op| text.contains(*op)) {
            return self.arithmetic(text, op);
        }

        if let Some(value) = self.resolve_global(text) {
            return Some(value);
        }

        if let Some(base) = text.strip_suffix("_Count") {
            if let Some(count) = self.resolve(base).and_then(|v| v.count()) {
                return Some(Value::from(count));
            }
        }

        if let Some((head, rest)) = text.split_once('.') {
            let base = self.resolve(head)?;
            return walk_path(&base, rest);
        }

        if let Some(pos) = text.find('[') {
            let base = self.resolve(&text[..pos])?;
            return walk_path(&base, &text[pos..]);
        }

        trace!(variable = text, "unresolved variable");
        None
    }

    /// Evaluate `text` as arithmetic if it contains an operator
    pub fn resolve_arithmetic(&self, text: &str) -> Option<Value> {
        let text = text.trim();
        let op = OPERATORS.iter().find(|op| text.contains(*op))?;
        self.arithmetic(text, op)
    }

    fn resolve_global(&self, name: &str) -> Option<Value> {
        let global = self.global?;
        match catch_unwind(AssertUnwindSafe(|| global.resolve(name))) {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                trace!(variable = name, error = %err, "global resolver failed");
                None
            }
            Err(_) => {
                warn!(variable = name, "global resolver panicked");
                None
            }
        }
    }

    fn arithmetic(&self, text: &str, op: &str) -> Option<Value> {
        let mut parts = text.split(op);
        let (left, right) = match (parts.next(), parts.next(), parts.next()) {
            (Some(left), Some(right), None) => (left.trim(), right.trim()),
            _ => {
                trace!(expression = text, "more than one operator");
                return None;
            }
        };
        if [left, right]
            .iter()
            .any(|operand| OPERATORS.iter().any(|other| operand.contains(*other)))
        {
            trace!(expression = text, "chained operators");
            return None;
        }

        let left = self.operand(left)?;
        let right = self.operand(right)?;

        match (left.as_decimal(), right.as_decimal()) {
            (Some(l), Some(r)) => Some(apply_operator(op, l, r, text)),
            _ if op == " + " => Some(Value::String(format!("{}{}", left, right))),
            _ => {
                trace!(expression = text, "non-numeric operand");
                None
            }
        }
    }

    fn operand(&self, text: &str) -> Option<Value> {
        if text.is_empty() {
            return None;
        }
        if text.contains('.') {
            self.resolve(text)
                .or_else(|| parse_decimal(text).map(Value::Number))
        } else {
            parse_decimal(text)
                .map(Value::Number)
                .or_else(|| self.resolve(text))
        }
    }
}

fn apply_operator(op: &str, left: Decimal, right: Decimal, text: &str) -> Value {
    let result = match op {
        " * " => left.checked_mul(right),
        " / " => {
            if right.is_zero() {
                warn!(expression = text, "division by zero");
                return Value::Error(CellError::Div0);
            }
            left.checked_div(right)
        }
        " + " => left.checked_add(right),
        _ => left.checked_sub(right),
    };
    match result {
        Some(n) => Value::Number(n.normalize()),
        None => {
            warn!(expression = text, "arithmetic overflow");
            Value::Error(CellError::Num)
        }
    }
}

/// Walk a path such as `Customer.Name`, `[2].Amount` or `.Lines[0]` from `value`
///
/// Returns `None` as soon as a member is missing or an index is out of range.
pub fn walk_path(value: &Value, path: &str) -> Option<Value> {
    let mut current = value.clone();
    let mut rest = path.trim();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let end = after.find(']')?;
            let index: usize = after[..end].trim().parse().ok()?;
            current = current.index(index)?;
            rest = &after[end + 1..];
        } else {
            let name_start = rest.strip_prefix('.').unwrap_or(rest);
            let end = name_start.find(['.', '[']).unwrap_or(name_start.len());
            let name = name_start[..end].trim();
            if name.is_empty() {
                return None;
            }
            current = current.member(name)?;
            rest = &name_start[end..];
        }
    }

    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Bindings;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn item(price: i64, qty: i64) -> Value {
        let mut map = BTreeMap::new();
        map.insert("Price".to_string(), Value::from(price));
        map.insert("Qty".to_string(), Value::from(qty));
        Value::Map(map)
    }

    fn bindings() -> Bindings {
        let mut b = Bindings::new();
        b.insert("Name", "john");
        b.insert("item", item(10, 3));
        b.insert("Items", Value::from_iter([1, 2, 3]));
        b.insert("Lines", Value::List(vec![item(5, 1), item(7, 2)]));
        b.insert("Zero", 0);
        b.insert("Ten", "10");
        b
    }

    #[test]
    fn test_scope_lookup() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        assert_eq!(resolver.resolve("name"), Some(Value::from("john")));
        assert_eq!(resolver.resolve("Missing"), None);
    }

    #[test]
    fn test_paths_and_indexers() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        assert_eq!(resolver.resolve("item.Price"), Some(Value::from(10)));
        assert_eq!(resolver.resolve("item.price"), None);
        assert_eq!(resolver.resolve("Lines[1].Qty"), Some(Value::from(2)));
        assert_eq!(resolver.resolve("Lines[2].Qty"), None);
        assert_eq!(resolver.resolve("Lines[x]"), None);
        assert_eq!(resolver.resolve("Items.Count"), Some(Value::from(3)));
        assert_eq!(resolver.resolve("Name.Length"), Some(Value::from(4)));
    }

    #[test]
    fn test_count_suffix() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        assert_eq!(resolver.resolve("Items_Count"), Some(Value::from(3)));
        assert_eq!(resolver.resolve("Name_Count"), None);
    }

    #[test]
    fn test_arithmetic() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        assert_eq!(resolver.resolve("item.Price * item.Qty"), Some(Value::from(30)));
        assert_eq!(resolver.resolve("item.Price - 2.5"), Some(Value::from(7.5)));
        assert_eq!(resolver.resolve("Ten + 5"), Some(Value::from(15)));
        assert_eq!(resolver.resolve("7 / 2"), Some(Value::from(3.5)));
        assert_eq!(resolver.resolve("Name + 1"), Some(Value::from("john1")));
        assert_eq!(resolver.resolve("Name * 2"), None);
        assert_eq!(resolver.resolve("1 + 2 + 3"), None);
        assert_eq!(resolver.resolve("Missing * 2"), None);
    }

    #[test]
    fn test_chained_operators_unresolved() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        assert_eq!(resolver.resolve("1 + 2 - 3"), None);
        assert_eq!(resolver.resolve("2 * 3 - 1"), None);
        assert_eq!(resolver.resolve("item.Price * item.Qty + 1"), None);
        assert_eq!(resolver.resolve("Ten / 2 + 1"), None);
        assert_eq!(resolver.resolve_arithmetic("2 * 3 - 1"), None);
    }

    #[test]
    fn test_division_by_zero() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        assert_eq!(
            resolver.resolve("item.Price / Zero"),
            Some(Value::Error(CellError::Div0))
        );
    }

    #[test]
    fn test_global_resolver() {
        let b = bindings();
        let global = |name: &str| match name {
            "Today" => Some(Value::from("2024-01-01")),
            "Config" => Some(item(1, 2)),
            _ => None,
        };
        let resolver = Resolver::new(Scope::new(&b)).with_global(Some(&global));
        assert_eq!(resolver.resolve("Today"), Some(Value::from("2024-01-01")));
        assert_eq!(resolver.resolve("Config.Qty"), Some(Value::from(2)));
        assert_eq!(resolver.resolve("Name"), Some(Value::from("john")));
    }

    struct Failing;

    impl GlobalResolver for Failing {
        fn resolve(&self, _name: &str) -> HandlerResult<Option<Value>> {
            Err("lookup failed".into())
        }
    }

    #[test]
    fn test_global_errors_are_not_found() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b)).with_global(Some(&Failing));
        assert_eq!(resolver.resolve("Other"), None);
        assert_eq!(resolver.resolve("item.Qty"), Some(Value::from(3)));
    }

    #[test]
    fn test_global_panics_are_not_found() {
        let b = bindings();
        let global = |name: &str| -> Option<Value> { panic!("no lookup for {}", name) };
        let resolver = Resolver::new(Scope::new(&b)).with_global(Some(&global));
        assert_eq!(resolver.resolve("Other"), None);
        assert_eq!(resolver.resolve("Name"), Some(Value::from("john")));
    }

    #[test]
    fn test_walk_path() {
        let value = Value::List(vec![item(1, 2)]);
        assert_eq!(walk_path(&value, "[0].Qty"), Some(Value::from(2)));
        assert_eq!(walk_path(&value, ".Count"), Some(Value::from(1)));
        assert_eq!(walk_path(&value, "[0]."), None);
        assert_eq!(walk_path(&value, "[0"), None);
    }
}

//! End-to-end evaluation of expressions against bindings and cells

use std::collections::BTreeMap;

use cellplate_core::{CellValue, Color, Hyperlink, Worksheet};
use cellplate_expr::{
    parse, Bindings, Evaluator, HandlerResult, MemberAccess, Outcome, Registry, Resolver, Scope,
    Value,
};
use pretty_assertions::assert_eq;
use serde::Serialize;

#[derive(Serialize)]
struct Line {
    sku: String,
    price: f64,
    qty: u32,
}

#[derive(Serialize)]
struct Order {
    number: u32,
    lines: Vec<Line>,
}

#[derive(Debug)]
struct Customer {
    name: &'static str,
    tier: u8,
}

impl MemberAccess for Customer {
    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "Name" => Some(Value::from(self.name)),
            "Tier" => Some(Value::from(self.tier as i32)),
            _ => None,
        }
    }
}

fn bindings() -> Bindings {
    let order = Order {
        number: 7,
        lines: vec![
            Line { sku: "A-1".into(), price: 2.5, qty: 4 },
            Line { sku: "B-2".into(), price: 10.0, qty: 1 },
        ],
    };

    let mut item = BTreeMap::new();
    item.insert("Price".to_string(), Value::from(10));
    item.insert("Qty".to_string(), Value::from(3));

    let mut b = Bindings::new();
    b.insert("Name", "john");
    b.insert("item", item);
    b.insert("Items", vec![Value::from(1), Value::from(2), Value::from(3)]);
    b.insert("Order", Value::from_serialize(&order).unwrap());
    b.insert("Customer", Value::object(Customer { name: "Acme", tier: 2 }));
    b.insert("Site", "example.com");
    b
}

fn evaluate(b: &Bindings, registry: &Registry, text: &str, sheet: &mut Worksheet) -> Outcome {
    let evaluator = Evaluator::new(Resolver::new(Scope::new(b)), registry);
    let expr = parse(text).unwrap();
    evaluator.evaluate(&expr, &mut sheet.cell_mut_at(0, 0))
}

fn resolved(text: &str) -> Outcome {
    Outcome::Resolved(Value::from(text))
}

#[test]
fn test_upper_formatter() {
    let mut sheet = Worksheet::new("Sheet1");
    let outcome = evaluate(&bindings(), &Registry::new(), "{{Name:upper}}", &mut sheet);
    assert_eq!(outcome, resolved("JOHN"));
}

#[test]
fn test_arithmetic_over_members() {
    let mut sheet = Worksheet::new("Sheet1");
    let outcome = evaluate(&bindings(), &Registry::new(), "{{item.Price * item.Qty}}", &mut sheet);
    assert_eq!(outcome, Outcome::Resolved(Value::from(30)));
}

#[test]
fn test_collection_count() {
    let mut sheet = Worksheet::new("Sheet1");
    let outcome = evaluate(&bindings(), &Registry::new(), "{{Items.Count}}", &mut sheet);
    assert_eq!(outcome, Outcome::Resolved(Value::from(3)));
}

#[test]
fn test_unbound_variable_is_unresolved() {
    let mut sheet = Worksheet::new("Sheet1");
    let outcome = evaluate(&bindings(), &Registry::new(), "{{Unknown:upper}}", &mut sheet);
    assert_eq!(outcome, Outcome::Unresolved);
    assert_eq!(sheet.cell_count(), 0);
}

#[test]
fn test_bold_function() {
    let mut sheet = Worksheet::new("Sheet1");
    let outcome = evaluate(&bindings(), &Registry::new(), "{{Name|bold}}", &mut sheet);
    assert_eq!(outcome, resolved("john"));

    let cell = sheet.cell_at(0, 0).unwrap();
    assert_eq!(cell.value, CellValue::string("john"));
    assert!(cell.style.font.bold);
}

#[test]
fn test_serialized_and_object_paths() {
    let b = bindings();
    let registry = Registry::new();
    let mut sheet = Worksheet::new("Sheet1");

    assert_eq!(
        evaluate(&b, &registry, "{{Order.lines[1].sku}}", &mut sheet),
        resolved("B-2")
    );
    assert_eq!(
        evaluate(&b, &registry, "{{Order.lines.Count}}", &mut sheet),
        Outcome::Resolved(Value::from(2))
    );
    assert_eq!(
        evaluate(&b, &registry, "{{Customer.Name:lower}}", &mut sheet),
        resolved("acme")
    );
    assert_eq!(
        evaluate(&b, &registry, "{{Order.lines[5].sku}}", &mut sheet),
        Outcome::Unresolved
    );
}

#[test]
fn test_native_patterns() {
    let b = bindings();
    let registry = Registry::new();
    let mut sheet = Worksheet::new("Sheet1");

    assert_eq!(
        evaluate(&b, &registry, "{{Order.lines[0].price:0.00}}", &mut sheet),
        resolved("2.50")
    );
    assert_eq!(
        evaluate(&b, &registry, "{{Order.number:N2}}", &mut sheet),
        resolved("7.00")
    );
}

#[test]
fn test_link_function() {
    let mut sheet = Worksheet::new("Sheet1");
    let outcome = evaluate(&bindings(), &Registry::new(), "{{Site|link(\"Home\")}}", &mut sheet);
    assert_eq!(outcome, resolved("Home"));

    let cell = sheet.cell_at(0, 0).unwrap();
    assert_eq!(
        cell.hyperlink,
        Some(Hyperlink::external("http://example.com"))
    );
    assert_eq!(cell.style.font.color, Color::HYPERLINK);
}

#[test]
fn test_custom_handlers_replace_builtins() {
    let mut registry = Registry::new();
    registry
        .formatters
        .register_fn("UPPER", |v: &Value, _: &[String]| Ok(Value::from(format!("<{}>", v))));
    registry.functions.register_fn(
        "stamp",
        |cell: &mut cellplate_core::CellMut<'_>, v: &Value, params: &[String]| -> HandlerResult<()> {
            cell.set_value(format!("{}{}", params.join(""), v));
            Ok(())
        },
    );

    let b = bindings();
    let mut sheet = Worksheet::new("Sheet1");
    assert_eq!(evaluate(&b, &registry, "{{Name:upper}}", &mut sheet), resolved("<john>"));
    assert_eq!(
        evaluate(&b, &registry, "{{Name|Stamp(#, ' ')}}", &mut sheet),
        resolved("# john")
    );
}

//! Built-in formatters return the same output for the same input and leave the input alone

use cellplate_expr::{Registry, Value};
use chrono::NaiveDate;
use proptest::prelude::*;

const FORMATTERS: [&str; 10] = [
    "upper",
    "lower",
    "titlecase",
    "mask",
    "phone",
    "truncate",
    "currency",
    "number",
    "percent",
    "date",
];

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e9..1.0e9f64).prop_map(Value::from),
        "[A-Za-z0-9 .,-]{0,20}".prop_map(Value::from),
        (1900i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            NaiveDate::from_ymd_opt(y, m, d).map(Value::from).unwrap_or_default()
        }),
    ]
}

fn parameters() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            "[0-9]{1,2}".boxed(),
            Just("EUR".to_string()).boxed(),
            Just("yyyy-MM-dd".to_string()).boxed(),
            Just("###-####".to_string()).boxed(),
            Just("...".to_string()).boxed(),
        ],
        0..3,
    )
}

proptest! {
    #[test]
    fn test_builtin_formatters_are_pure(
        index in 0..FORMATTERS.len(),
        input in value(),
        params in parameters(),
    ) {
        let registry = Registry::new();
        let name = FORMATTERS[index];
        let formatter = registry.formatters.get(name).unwrap();

        let original = input.clone();
        let first = formatter.format(&input, &params).map_err(|e| e.to_string());
        let second = formatter.format(&input, &params).map_err(|e| e.to_string());

        prop_assert_eq!(first, second, "{} is not deterministic", name);
        prop_assert_eq!(input, original, "{} changed its input", name);
    }
}

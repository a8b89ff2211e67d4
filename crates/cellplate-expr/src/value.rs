//! Values that template variables resolve to

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cellplate_core::{CellError, CellValue};
use chrono::{NaiveDate, NaiveDateTime};
use lazy_regex::regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ExprResult;

/// Member and index access for user-defined types
///
/// Implement this to expose a type's fields to `a.b` paths and `a[i]`
/// indexers without converting it to a [`Value::Map`] first.
pub trait MemberAccess: fmt::Debug + Send + Sync {
    /// Value of the member called `name` (case-sensitive)
    fn member(&self, name: &str) -> Option<Value>;

    /// Element at `index`, for list-like types
    fn index(&self, _index: usize) -> Option<Value> {
        None
    }

    /// Number of elements, for list-like types
    fn count(&self) -> Option<usize> {
        None
    }

    /// Text shown when the object itself is written to a cell
    fn display_text(&self) -> String {
        format!("{:?}", self)
    }
}

/// A dynamically typed template value
#[derive(Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Exact decimal number
    Number(Decimal),
    /// Text
    String(String),
    /// Date and time
    DateTime(NaiveDateTime),
    /// Raw bytes (e.g. image data)
    Bytes(Vec<u8>),
    /// Ordered collection
    List(Vec<Value>),
    /// String-keyed record
    Map(BTreeMap<String, Value>),
    /// User-defined object
    Object(Arc<dyn MemberAccess>),
    /// Spreadsheet error value such as `#DIV/0!`
    Error(CellError),
}

impl Value {
    /// Create a string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    /// Wrap a user-defined object
    pub fn object<T: MemberAccess + 'static>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Convert any serializable value through its JSON representation
    ///
    /// Structs become maps, sequences become lists, and numbers become decimals.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> ExprResult<Self> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Check for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: numbers as-is, strings when they parse as decimals
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
    }

    /// Date view: dates as-is, strings in common ISO and US layouts
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::String(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Number of elements for collections
    pub fn count(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            Value::Bytes(bytes) => Some(bytes.len()),
            Value::Object(object) => object.count(),
            _ => None,
        }
    }

    /// Member lookup used by dotted paths
    ///
    /// Map keys and object members are case-sensitive. Lists expose `Count`
    /// and `Length`, strings expose `Length`.
    pub fn member(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(name).cloned(),
            Value::Object(object) => object.member(name),
            Value::List(items) if name == "Count" || name == "Length" => {
                Some(Value::from(items.len()))
            }
            Value::Bytes(bytes) if name == "Length" => Some(Value::from(bytes.len())),
            Value::String(s) if name == "Length" => Some(Value::from(s.chars().count())),
            _ => None,
        }
    }

    /// Element lookup used by `[i]` indexers
    pub fn index(&self, index: usize) -> Option<Value> {
        match self {
            Value::List(items) => items.get(index).cloned(),
            Value::Object(object) => object.index(index),
            _ => None,
        }
    }

    /// Check whether this is a string holding exactly one `{{...}}` expression
    pub fn is_placeholder(&self) -> bool {
        self.as_str()
            .map_or(false, |s| regex!(r"^\{\{[^{}]+\}\}$").is_match(s.trim()))
    }

    /// Name of the variant, for logs
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Error(_) => "error",
        }
    }

    /// Convert to a typed cell value
    ///
    /// Collections and objects are written as their display text.
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Boolean(*b),
            Value::Number(n) => match n.to_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Error(CellError::Num),
            },
            Value::String(s) => CellValue::string(s.as_str()),
            Value::DateTime(dt) => CellValue::DateTime(*dt),
            Value::Error(e) => CellValue::Error(*e),
            other => CellValue::string(other.to_string()),
        }
    }
}

/// Parse decimal text, accepting scientific notation
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    const DATETIME_LAYOUTS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::DateTime(dt) => write!(f, "DateTime({})", dt),
            Value::Bytes(bytes) => write!(f, "Bytes(<{} bytes>)", bytes.len()),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(object) => f.debug_tuple("Object").field(object).finish(),
            Value::Error(e) => write!(f, "Error({})", e),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::String(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Object(object) => f.write_str(&object.display_text()),
            Value::Error(e) => f.write_str(e.as_str()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Decimal::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        match Decimal::from_f64(n) {
            Some(d) => Value::Number(d),
            None => Value::Error(CellError::Num),
        }
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::DateTime(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<CellError> for Value {
    fn from(e: CellError) -> Self {
        Value::Error(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}

impl From<CellValue> for Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => Value::Null,
            CellValue::Boolean(b) => Value::Bool(b),
            CellValue::Number(n) => Value::from(n),
            CellValue::String(s) => Value::String(s.as_str().to_string()),
            CellValue::DateTime(dt) => Value::DateTime(dt),
            CellValue::Error(e) => Value::Error(e),
            CellValue::Formula { text } => Value::String(text),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    parse_decimal(&n.to_string())
                        .map(Value::Number)
                        .unwrap_or(Value::Error(CellError::Num))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

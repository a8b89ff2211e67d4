//! Formatter and function registries
//!
//! Names are case-insensitive and the last registration under a name wins.

use std::fmt;

use ahash::AHashMap;
use cellplate_core::CellMut;

use crate::builtins;
use crate::error::HandlerResult;
use crate::value::Value;

/// Pure value transform bound to a format expression (`{{x:name}}`)
pub trait Formatter: Send + Sync {
    /// Transform `value`; returning it unchanged is allowed
    fn format(&self, value: &Value, parameters: &[String]) -> HandlerResult<Value>;
}

/// Cell-mutating handler bound to a function expression (`{{x|name}}`)
///
/// The function sets the cell's value itself; the evaluator reads it back
/// afterwards.
pub trait CellFunction: Send + Sync {
    /// Apply the function to `cell`
    fn apply(&self, cell: &mut CellMut<'_>, value: &Value, parameters: &[String])
        -> HandlerResult<()>;
}

/// Adapter turning a closure into a [`Formatter`]
pub struct FnFormatter<F>(pub F);

impl<F> Formatter for FnFormatter<F>
where
    F: Fn(&Value, &[String]) -> HandlerResult<Value> + Send + Sync,
{
    fn format(&self, value: &Value, parameters: &[String]) -> HandlerResult<Value> {
        (self.0)(value, parameters)
    }
}

/// Adapter turning a closure into a [`CellFunction`]
pub struct FnFunction<F>(pub F);

impl<F> CellFunction for FnFunction<F>
where
    F: Fn(&mut CellMut<'_>, &Value, &[String]) -> HandlerResult<()> + Send + Sync,
{
    fn apply(
        &self,
        cell: &mut CellMut<'_>,
        value: &Value,
        parameters: &[String],
    ) -> HandlerResult<()> {
        (self.0)(cell, value, parameters)
    }
}

/// Case-insensitive name to handler table
struct HandlerTable<T: ?Sized> {
    entries: AHashMap<String, (String, Box<T>)>,
}

impl<T: ?Sized> HandlerTable<T> {
    fn new() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }

    fn insert(&mut self, name: String, handler: Box<T>) -> bool {
        self.entries
            .insert(name.to_uppercase(), (name, handler))
            .is_some()
    }

    fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .get(&name.to_uppercase())
            .map(|(_, handler)| handler.as_ref())
    }

    fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(&name.to_uppercase()).is_some()
    }

    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.values().map(|(name, _)| name.as_str()).collect();
        names.sort_unstable_by_key(|name| name.to_uppercase());
        names
    }
}

/// Registry of formatters
pub struct FormatterRegistry {
    table: HandlerTable<dyn Formatter>,
}

impl FormatterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            table: HandlerTable::new(),
        }
    }

    /// Create a registry holding the built-in formatters
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_formatters(&mut registry);
        registry
    }

    /// Register a formatter, returning true if it replaced one
    pub fn register<N, F>(&mut self, name: N, formatter: F) -> bool
    where
        N: Into<String>,
        F: Formatter + 'static,
    {
        self.table.insert(name.into(), Box::new(formatter))
    }

    /// Register a closure as a formatter
    pub fn register_fn<N, F>(&mut self, name: N, formatter: F) -> bool
    where
        N: Into<String>,
        F: Fn(&Value, &[String]) -> HandlerResult<Value> + Send + Sync + 'static,
    {
        self.register(name, FnFormatter(formatter))
    }

    /// Check whether a formatter is registered under `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.table.get(name).is_some()
    }

    /// Look a formatter up by name
    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.table.get(name)
    }

    /// Remove a formatter, returning true if it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.table.remove(name)
    }

    /// Registered names, sorted case-insensitively
    pub fn names(&self) -> Vec<&str> {
        self.table.names()
    }

    /// Number of registered formatters
    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    /// Check if no formatter is registered
    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Registry of cell functions
pub struct FunctionRegistry {
    table: HandlerTable<dyn CellFunction>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            table: HandlerTable::new(),
        }
    }

    /// Create a registry holding the built-in functions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_functions(&mut registry);
        registry
    }

    /// Register a function, returning true if it replaced one
    pub fn register<N, F>(&mut self, name: N, function: F) -> bool
    where
        N: Into<String>,
        F: CellFunction + 'static,
    {
        self.table.insert(name.into(), Box::new(function))
    }

    /// Register a closure as a function
    pub fn register_fn<N, F>(&mut self, name: N, function: F) -> bool
    where
        N: Into<String>,
        F: Fn(&mut CellMut<'_>, &Value, &[String]) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.register(name, FnFunction(function))
    }

    /// Check whether a function is registered under `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.table.get(name).is_some()
    }

    /// Look a function up by name
    pub fn get(&self, name: &str) -> Option<&dyn CellFunction> {
        self.table.get(name)
    }

    /// Remove a function, returning true if it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.table.remove(name)
    }

    /// Registered names, sorted case-insensitively
    pub fn names(&self) -> Vec<&str> {
        self.table.names()
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    /// Check if no function is registered
    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Formatters and functions used by one template
#[derive(Debug)]
pub struct Registry {
    /// Handlers for `{{x:name}}`
    pub formatters: FormatterRegistry,
    /// Handlers for `{{x|name}}`
    pub functions: FunctionRegistry,
}

impl Registry {
    /// Registry holding the built-in formatters and functions
    pub fn new() -> Self {
        Self {
            formatters: FormatterRegistry::with_builtins(),
            functions: FunctionRegistry::with_builtins(),
        }
    }

    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self {
            formatters: FormatterRegistry::new(),
            functions: FunctionRegistry::new(),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

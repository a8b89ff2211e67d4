//! The template orchestrator
//!
//! # Example
//!
//! ```rust
//! use cellplate::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "{{Name:upper}}").unwrap();
//! sheet.set_cell_value("A2", "Hello {{Name}}").unwrap();
//!
//! let mut template = Template::new(workbook);
//! template.add_variable("Name", "john");
//! let result = template.generate();
//! assert!(result.is_success());
//!
//! let sheet = template.workbook().worksheet(0).unwrap();
//! assert_eq!(sheet.get_value("A1").unwrap(), CellValue::from("JOHN"));
//! assert_eq!(sheet.get_value("A2").unwrap(), CellValue::from("Hello john"));
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use cellplate_core::{CellMut, Workbook};
use cellplate_expr::{
    Bindings, CellFunction, Formatter, GlobalResolver, HandlerResult, Registry, Value,
};
use serde::Serialize;
use tracing::debug;

use crate::diagnostics::{self, Diagnostics};
use crate::engine::{RangeEngine, SubstitutionEngine};
use crate::error::{Result, TemplateError, TemplateErrorKind};
use crate::options::TemplateOptions;
use crate::processor::Generation;

/// Statistics from a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateStats {
    /// `<name>_Count` bindings made by the metadata step
    pub metadata_bindings: usize,
    /// Temporary bindings made by the pre-pass
    pub temp_bindings: usize,
    /// Cells rewritten by the pre-pass
    pub cells_preprocessed: usize,
    /// Cells finished through `after_expansion`
    pub cells_expanded: usize,
    /// Cells finished by the post-pass
    pub cells_postprocessed: usize,
    /// Formatter or function failures
    pub handler_failures: usize,
}

/// Outcome of [`Template::generate`]
#[derive(Debug, Clone, Default)]
pub struct GenerateResult {
    /// Errors recorded during the run
    pub errors: Vec<TemplateError>,
    /// Run statistics
    pub stats: GenerateStats,
}

impl GenerateResult {
    /// Check if the run recorded no errors
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors of one kind
    pub fn errors_of(&self, kind: TemplateErrorKind) -> impl Iterator<Item = &TemplateError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// A workbook with expressions, plus the bindings and handlers to fill it
pub struct Template {
    workbook: Workbook,
    bindings: Bindings,
    registry: Registry,
    global: Option<Box<dyn GlobalResolver>>,
    options: TemplateOptions,
}

impl Template {
    /// Create a template with the built-in formatters and functions
    pub fn new(workbook: Workbook) -> Self {
        Self::with_registry(workbook, Registry::new())
    }

    /// Create a template with a specific registry
    pub fn with_registry(workbook: Workbook, registry: Registry) -> Self {
        Self {
            workbook,
            bindings: Bindings::new(),
            registry,
            global: None,
            options: TemplateOptions::default(),
        }
    }

    /// Set the generation options
    pub fn with_options(mut self, options: TemplateOptions) -> Self {
        self.options = options;
        self
    }

    /// Generation options
    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Bind a variable; rebinding replaces the previous value
    pub fn add_variable<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) -> &mut Self {
        self.bindings.insert(name, value);
        self
    }

    /// Bind any serializable value
    pub fn add_serialized<N, T>(&mut self, name: N, value: &T) -> Result<&mut Self>
    where
        N: Into<String>,
        T: Serialize + ?Sized,
    {
        let value = Value::from_serialize(value)?;
        self.bindings.insert(name, value);
        Ok(self)
    }

    /// Remove a binding
    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.bindings.remove(name)
    }

    /// Current bindings
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Set the fallback consulted for names that are not bound
    pub fn set_global_resolver<R: GlobalResolver + 'static>(&mut self, resolver: R) -> &mut Self {
        self.global = Some(Box::new(resolver));
        self
    }

    /// Remove the global resolver
    pub fn clear_global_resolver(&mut self) -> &mut Self {
        self.global = None;
        self
    }

    /// Register a formatter, returning whether it replaced one
    pub fn register_formatter<F: Formatter + 'static>(&mut self, name: &str, formatter: F) -> bool {
        self.registry.formatters.register(name, formatter)
    }

    /// Register a closure as a formatter
    pub fn register_formatter_fn<F>(&mut self, name: &str, formatter: F) -> bool
    where
        F: Fn(&Value, &[String]) -> HandlerResult<Value> + Send + Sync + 'static,
    {
        self.registry.formatters.register_fn(name, formatter)
    }

    /// Register a function, returning whether it replaced one
    pub fn register_function<F: CellFunction + 'static>(&mut self, name: &str, function: F) -> bool {
        self.registry.functions.register(name, function)
    }

    /// Register a closure as a function
    pub fn register_function_fn<F>(&mut self, name: &str, function: F) -> bool
    where
        F: Fn(&mut CellMut<'_>, &Value, &[String]) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.registry.functions.register_fn(name, function)
    }

    /// Formatter and function registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable registry
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The workbook
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Mutable workbook
    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// Take the workbook out of the template
    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    /// Fill the workbook using the built-in [`SubstitutionEngine`]
    pub fn generate(&mut self) -> GenerateResult {
        self.generate_with(&mut SubstitutionEngine::new())
    }

    /// Fill the workbook using `engine` for range expansion
    ///
    /// Runs the metadata step, the pre-pass, the engine and the post-pass.
    /// Errors are collected in the result; a failing engine or a panic in any
    /// step ends the run with an `Unexpected error` entry and whatever was
    /// written so far.
    pub fn generate_with(&mut self, engine: &mut dyn RangeEngine) -> GenerateResult {
        let mut run = Generation::new(
            &self.bindings,
            &self.registry,
            self.global.as_deref(),
            &self.options,
        );
        let collect_metadata = self.options.collect_metadata;

        let workbook = &mut self.workbook;
        let prepared = catch_unwind(AssertUnwindSafe(|| {
            if collect_metadata {
                run.collect_metadata(workbook);
            }
            run.preprocess(workbook);
        }));
        if let Err(payload) = prepared {
            run.record(unexpected(panic_message(payload.as_ref(), "pre-pass panicked")));
            return run.finish();
        }

        let expanded = catch_unwind(AssertUnwindSafe(|| engine.expand(workbook, &mut run)));
        match expanded {
            Ok(Ok(errors)) => run.merge_engine_errors(errors),
            Ok(Err(err)) => {
                run.record(unexpected(err.to_string()));
                return run.finish();
            }
            Err(payload) => {
                run.record(unexpected(panic_message(payload.as_ref(), "range engine panicked")));
                return run.finish();
            }
        }

        let finished = catch_unwind(AssertUnwindSafe(|| run.postprocess(workbook)));
        if let Err(payload) = finished {
            run.record(unexpected(panic_message(payload.as_ref(), "post-pass panicked")));
        }

        let result = run.finish();
        debug!(stats = ?result.stats, errors = result.errors.len(), "generation complete");
        result
    }

    /// Count the expressions in the workbook and list malformed ones
    pub fn diagnose(&self) -> Diagnostics {
        diagnostics::diagnose(&self.workbook)
    }
}

fn panic_message(payload: &(dyn Any + Send), fallback: &str) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| fallback.to_string())
}

fn unexpected(message: String) -> TemplateError {
    TemplateError::new(
        TemplateErrorKind::Unexpected,
        format!("Unexpected error: {}", message),
    )
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("sheets", &self.workbook.sheet_count())
            .field("bindings", &self.bindings.len())
            .field("registry", &self.registry)
            .field("global_resolver", &self.global.is_some())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellplate_core::{CellValue, Color};
    use cellplate_expr::HandlerError;
    use pretty_assertions::assert_eq;

    fn template(cells: &[(&str, &str)]) -> Template {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        for (addr, text) in cells {
            sheet.set_cell_value(addr, *text).unwrap();
        }
        Template::new(workbook)
    }

    fn value(t: &Template, addr: &str) -> CellValue {
        t.workbook().worksheet(0).unwrap().get_value(addr).unwrap()
    }

    #[test]
    fn test_generate_mixed_cell() {
        let mut t = template(&[("A1", "{{Name:upper}} owes {{Total:C}} ({{Count}} items)")]);
        t.add_variable("Name", "john")
            .add_variable("Total", 12.5)
            .add_variable("Count", 2);

        let result = t.generate();
        assert!(result.is_success(), "{:?}", result.errors);
        assert_eq!(value(&t, "A1"), CellValue::from("JOHN owes $12.50 (2 items)"));
        assert_eq!(result.stats.temp_bindings, 2);
        assert_eq!(result.stats.cells_preprocessed, 1);
        assert!(t.bindings().iter().all(|(name, _)| !name.starts_with("_temp_")));
    }

    #[test]
    fn test_generate_typed_value() {
        let mut t = template(&[("A1", "{{Price * Qty}}"), ("A2", "{{Price:0.00}}")]);
        t.add_variable("Price", 10).add_variable("Qty", 3);

        t.generate();
        assert_eq!(value(&t, "A1"), CellValue::Number(30.0));
        assert_eq!(value(&t, "A2"), CellValue::from("10.00"));
    }

    #[test]
    fn test_global_resolver() {
        let mut t = template(&[("A1", "{{Today:lower}}"), ("A2", "{{Other}}")]);
        t.set_global_resolver(|name: &str| (name == "Today").then(|| Value::from("MONDAY")));

        t.generate();
        assert_eq!(value(&t, "A1"), CellValue::from("monday"));
        assert_eq!(value(&t, "A2"), CellValue::from("{{Other}}"));
    }

    #[test]
    fn test_handler_failure_is_recorded() {
        let mut t = template(&[("A1", "{{Name:explode}}"), ("A2", "{{Name:upper}}")]);
        t.add_variable("Name", "john");
        t.register_formatter_fn("explode", |_: &Value, _: &[String]| {
            Err(HandlerError::new("boom"))
        });

        let result = t.generate();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, TemplateErrorKind::Handler);
        assert_eq!(result.errors[0].cell_key().as_deref(), Some("Sheet1!A1"));
        assert_eq!(result.stats.handler_failures, 1);

        assert_eq!(value(&t, "A1"), CellValue::from("Error: boom"));
        let sheet = t.workbook().worksheet(0).unwrap();
        let style = sheet.cell_style("A1").unwrap().unwrap();
        assert_eq!(style.font.color, Color::RED);
        assert_eq!(value(&t, "A2"), CellValue::from("JOHN"));
    }

    #[test]
    fn test_failing_engine_is_unexpected() {
        struct Broken;
        impl RangeEngine for Broken {
            fn expand(
                &mut self,
                _: &mut Workbook,
                _: &mut dyn crate::engine::ExpansionHooks,
            ) -> Result<Vec<TemplateError>> {
                Err(crate::Error::engine("no ranges"))
            }
        }

        let mut t = template(&[("A1", "{{Name}}")]);
        let result = t.generate_with(&mut Broken);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, TemplateErrorKind::Unexpected);
        assert_eq!(result.errors[0].message, "Unexpected error: Engine error: no ranges");
    }
}

//! Cell rewrite passes
//!
//! One [`Generation`] lives for a single `generate` call. It owns a copy of
//! the template's bindings, to which the metadata step and the pre-pass add
//! their generated names, and it collects the errors and statistics of the run.
//!
//! Per-cell lifecycle:
//!
//! ```text
//! Untouched -> PreprocessedPlaceholder -> ExternallyExpanded -> FinalValue
//!      \________________\______________________\________> ErrorMarked
//! ```

use std::collections::HashSet;

use cellplate_core::{CellAddress, CellMut, Workbook, Worksheet};
use cellplate_expr::{
    extract_expressions, is_enhanced_syntax, parse, Bindings, Evaluator, ExpressionKind,
    GlobalResolver, Outcome, Registry, Resolver, Scope, Value,
};
use lazy_regex::regex;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::engine::{write_cell_text, ExpansionHooks};
use crate::error::{TemplateError, TemplateErrorKind};
use crate::options::TemplateOptions;
use crate::template::{GenerateResult, GenerateStats};

/// State of one generation run
pub(crate) struct Generation<'t> {
    bindings: Bindings,
    registry: &'t Registry,
    global: Option<&'t dyn GlobalResolver>,
    options: &'t TemplateOptions,
    /// Cells rewritten by the metadata step or the pre-pass
    preprocessed: HashSet<String>,
    /// Cells finished by `after_expansion` or the post-pass
    postprocessed: HashSet<String>,
    errors: Vec<TemplateError>,
    stats: GenerateStats,
}

impl<'t> Generation<'t> {
    pub(crate) fn new(
        bindings: &Bindings,
        registry: &'t Registry,
        global: Option<&'t dyn GlobalResolver>,
        options: &'t TemplateOptions,
    ) -> Self {
        Self {
            bindings: bindings.clone(),
            registry,
            global,
            options,
            preprocessed: HashSet::new(),
            postprocessed: HashSet::new(),
            errors: Vec::new(),
            stats: GenerateStats::default(),
        }
    }

    fn in_scope(&self, sheet: &Worksheet) -> bool {
        self.options.include_hidden_sheets || sheet.is_visible()
    }

    fn evaluator<'s>(&'s self, item: Option<&'s Bindings>) -> Evaluator<'s> {
        Evaluator::new(self.resolver(item), self.registry)
            .with_error_color(self.options.error_color)
    }

    /// Record an error once; the engine and the post-pass can both report a malformed cell
    pub(crate) fn record(&mut self, error: TemplateError) {
        if self.errors.contains(&error) {
            return;
        }
        debug!(error = %error, kind = ?error.kind, "template error");
        self.errors.push(error);
    }

    /// Bind `<name>_Count` for every `{{name.Count}}` naming a collection
    pub(crate) fn collect_metadata(&mut self, workbook: &mut Workbook) {
        for sheet in workbook.worksheets_mut() {
            let cells = collect_cells(sheet, |text| text.contains("{{") && text.contains(".Count"));

            for (addr, text) in cells {
                let mut rewritten = text.clone();

                for caps in regex!(r"\{\{([^{}\.]+)\.Count\}\}").captures_iter(&text) {
                    let name = &caps[1];
                    let count = self.resolver(None).resolve(name).and_then(|v| v.count());
                    let Some(count) = count else {
                        trace!(collection = name, "not a bound collection");
                        continue;
                    };

                    let count_name = format!("{}_Count", name);
                    if !self.bindings.contains(&count_name) {
                        debug!(binding = %count_name, count, "bound collection count");
                        self.bindings.insert(count_name.as_str(), count);
                        self.stats.metadata_bindings += 1;
                    }
                    rewritten = rewritten.replace(&caps[0], &format!("{{{{{}}}}}", count_name));
                }

                if rewritten != text {
                    let mut cell = sheet.cell_mut_at(addr.row, addr.col);
                    debug!(cell = %cell.key(), text = %rewritten, "rewrote collection metadata");
                    cell.set_value(rewritten);
                    self.preprocessed.insert(cell.key());
                }
            }
        }
    }

    /// Evaluate format and function expressions before range expansion
    ///
    /// Each result is bound under a fresh temporary name and the expression is
    /// replaced by a plain reference to it, so the range engine can substitute
    /// it like any other variable.
    pub(crate) fn preprocess(&mut self, workbook: &mut Workbook) {
        for sheet in workbook.worksheets_mut() {
            if !self.in_scope(sheet) {
                debug!(sheet = sheet.name(), "skipping hidden sheet");
                continue;
            }
            for (addr, text) in collect_cells(sheet, is_enhanced_syntax) {
                self.preprocess_cell(sheet, addr, &text);
            }
        }
    }

    fn preprocess_cell(&mut self, sheet: &mut Worksheet, addr: CellAddress, text: &str) {
        let mut cell = sheet.cell_mut_at(addr.row, addr.col);
        let key = cell.key();
        let mut rewritten = text.to_string();
        let mut pending: Vec<(String, Value)> = Vec::new();
        let mut failure = None;

        {
            let evaluator = self.evaluator(None);
            for raw in extract_expressions(text) {
                if !rewritten.contains(raw) {
                    continue;
                }
                let expr = match parse(raw) {
                    Ok(expr) => expr,
                    Err(err) => {
                        debug!(cell = %key, error = %err, "leaving malformed expression");
                        continue;
                    }
                };
                if expr.kind() == ExpressionKind::Standard {
                    continue;
                }

                match evaluator.evaluate(&expr, &mut cell) {
                    Outcome::Resolved(value) => {
                        let name = format!("{}{}", self.options.temp_prefix, Uuid::new_v4().simple());
                        rewritten = rewritten.replace(raw, &format!("{{{{{}}}}}", name));
                        pending.push((name, value));
                    }
                    Outcome::Unresolved => {
                        trace!(cell = %key, expression = raw, "left for post-pass");
                    }
                    Outcome::Failed(message) => {
                        failure = Some(format!("Error processing {}: {}", raw, message));
                        break;
                    }
                }
            }
        }

        if let Some(message) = failure {
            let sheet_name = cell.sheet_name().to_string();
            self.stats.handler_failures += 1;
            self.preprocessed.insert(key);
            self.record(TemplateError::at_cell(
                TemplateErrorKind::Handler,
                &sheet_name,
                addr,
                message,
            ));
            return;
        }

        for (name, value) in pending {
            debug!(binding = %name, value = %value, "bound temporary result");
            self.bindings.insert(name, value);
            self.stats.temp_bindings += 1;
        }

        if rewritten != text {
            debug!(cell = %key, text = %rewritten, "preprocessed cell");
            cell.set_value(rewritten);
            self.preprocessed.insert(key);
            self.stats.cells_preprocessed += 1;
        }
    }

    /// Evaluate what is left of the enhanced expressions after range expansion
    pub(crate) fn postprocess(&mut self, workbook: &mut Workbook) {
        for sheet in workbook.worksheets_mut() {
            if !self.in_scope(sheet) {
                continue;
            }
            for (addr, _) in collect_cells(sheet, is_enhanced_syntax) {
                let mut cell = sheet.cell_mut_at(addr.row, addr.col);
                if self.finish_cell(&mut cell, None) {
                    self.stats.cells_postprocessed += 1;
                }
            }
        }
    }

    /// Evaluate the remaining expressions of one cell, returning whether it changed
    ///
    /// A cell holding exactly one expression takes the typed result; otherwise
    /// each resolved expression is substituted into the text.
    fn finish_cell(&mut self, cell: &mut CellMut<'_>, item: Option<&Bindings>) -> bool {
        let Some(text) = cell.text().map(str::to_string) else {
            return false;
        };
        if !is_enhanced_syntax(&text) {
            return false;
        }
        let key = cell.key();
        if !self.postprocessed.insert(key.clone()) {
            return false;
        }

        let expressions = extract_expressions(&text);
        let whole = !text.starts_with("&=")
            && expressions.len() == 1
            && text.trim() == expressions[0];

        let mut errors = Vec::new();
        let mut failed = false;
        let mut typed = None;
        let mut out = text.clone();

        {
            let evaluator = self.evaluator(item);
            for raw in expressions {
                if !out.contains(raw) {
                    continue;
                }
                let expr = match parse(raw) {
                    Ok(expr) => expr,
                    Err(err) => {
                        errors.push((TemplateErrorKind::Syntax, format!("Syntax error: {}", err)));
                        continue;
                    }
                };

                match evaluator.evaluate(&expr, cell) {
                    Outcome::Resolved(value) if whole => typed = Some(value),
                    Outcome::Resolved(value) => out = out.replace(raw, &value.to_string()),
                    Outcome::Unresolved => {
                        trace!(cell = %key, expression = raw, "unresolved, kept verbatim");
                    }
                    Outcome::Failed(message) => {
                        errors.push((
                            TemplateErrorKind::Handler,
                            format!("Error processing {}: {}", raw, message),
                        ));
                        failed = true;
                        break;
                    }
                }
            }
        }

        let sheet = cell.sheet_name().to_string();
        let addr = cell.address();
        for (kind, message) in errors {
            if kind == TemplateErrorKind::Handler {
                self.stats.handler_failures += 1;
            }
            self.record(TemplateError::at_cell(kind, &sheet, addr, message));
        }
        if failed {
            return false;
        }

        if let Some(value) = typed {
            debug!(cell = %key, value = %value, "wrote typed value");
            cell.set_value(value.to_cell_value());
            return true;
        }
        if out != text {
            debug!(cell = %key, text = %out, "wrote substituted text");
            write_cell_text(cell, &out);
            return true;
        }
        false
    }

    /// Drop engine syntax errors for cells the template already rewrote
    pub(crate) fn merge_engine_errors(&mut self, errors: Vec<TemplateError>) {
        for mut error in errors {
            let rewritten = error
                .cell_key()
                .is_some_and(|key| self.preprocessed.contains(&key));
            if error.kind == TemplateErrorKind::Syntax && rewritten {
                trace!(error = %error, "dropping engine syntax error on preprocessed cell");
                continue;
            }
            if error.kind != TemplateErrorKind::Syntax {
                error.kind = TemplateErrorKind::Engine;
            }
            self.record(error);
        }
    }

    pub(crate) fn finish(self) -> GenerateResult {
        if !self.errors.is_empty() {
            warn!(errors = self.errors.len(), "generation finished with errors");
        }
        GenerateResult {
            errors: self.errors,
            stats: self.stats,
        }
    }
}

impl ExpansionHooks for Generation<'_> {
    fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    fn resolver<'s>(&'s self, item: Option<&'s Bindings>) -> Resolver<'s> {
        let scope = match item {
            Some(item) => Scope::new(&self.bindings).with(item),
            None => Scope::new(&self.bindings),
        };
        Resolver::new(scope).with_global(self.global)
    }

    fn before_expansion(&mut self, sheet: &Worksheet) -> bool {
        let expand = self.in_scope(sheet);
        debug!(sheet = sheet.name(), expand, "range expansion");
        expand
    }

    fn after_expansion(&mut self, cell: &mut CellMut<'_>, item: Option<&Bindings>) {
        if self.finish_cell(cell, item) {
            self.stats.cells_expanded += 1;
        }
    }
}

/// Copy out the text cells matching `filter`, in row-major order
fn collect_cells(sheet: &Worksheet, filter: impl Fn(&str) -> bool) -> Vec<(CellAddress, String)> {
    sheet
        .text_cells()
        .filter(|(_, text)| filter(text))
        .map(|(addr, text)| (addr, text.to_string()))
        .collect()
}

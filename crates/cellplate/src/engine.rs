//! Range engine protocol
//!
//! A range engine is the outer templating step that runs between the pre-pass
//! and the post-pass: it turns template rows into output rows and substitutes
//! plain `{{name}}` expressions. Format and function expressions are left for
//! the template to finish.
//!
//! [`SubstitutionEngine`] is the built-in engine. It expands nothing and only
//! substitutes standard expressions against the root bindings.

use cellplate_core::{CellAddress, CellMut, Workbook, Worksheet};
use cellplate_expr::{
    contains_expression, extract_expressions, parse, Bindings, ExprError, ExpressionKind,
    Resolver, Value,
};
use tracing::debug;

use crate::error::{Result, TemplateError, TemplateErrorKind};

/// Callbacks a [`RangeEngine`] uses to cooperate with the template
pub trait ExpansionHooks {
    /// Root bindings, including the temporary bindings made by the pre-pass
    fn bindings(&self) -> &Bindings;

    /// Resolver over the root bindings, with `item` layered on top
    fn resolver<'s>(&'s self, item: Option<&'s Bindings>) -> Resolver<'s>;

    /// Called before a sheet is expanded; `false` means skip the sheet
    fn before_expansion(&mut self, sheet: &Worksheet) -> bool;

    /// Called for a cell the engine produced, with the item it was produced for
    ///
    /// Remaining format and function expressions in the cell are evaluated
    /// against `item` layered over the root bindings.
    fn after_expansion(&mut self, cell: &mut CellMut<'_>, item: Option<&Bindings>);
}

/// Outer templating engine run between the pre-pass and the post-pass
pub trait RangeEngine {
    /// Expand `workbook`, returning the non-fatal errors found on the way
    fn expand(
        &mut self,
        workbook: &mut Workbook,
        hooks: &mut dyn ExpansionHooks,
    ) -> Result<Vec<TemplateError>>;
}

/// Result of substituting standard expressions in a cell text
#[derive(Debug, Clone, PartialEq)]
pub enum Substitution {
    /// Nothing was resolved
    Unchanged,
    /// The text with every resolved expression replaced
    Text(String),
    /// The whole text was one expression; the cell takes its typed value
    Value(Value),
}

/// Substitute the standard expressions of `text`
///
/// Unresolved expressions and format/function expressions stay verbatim.
/// Malformed expressions are returned alongside the substitution.
pub fn substitute_standard(text: &str, resolver: &Resolver<'_>) -> (Substitution, Vec<ExprError>) {
    let expressions = extract_expressions(text);
    let whole = expressions.len() == 1 && text.trim() == expressions[0];

    let mut malformed = Vec::new();
    let mut out = text.to_string();
    let mut changed = false;

    for raw in expressions {
        if !out.contains(raw) {
            continue;
        }
        let expr = match parse(raw) {
            Ok(expr) => expr,
            Err(err) => {
                malformed.push(err);
                continue;
            }
        };
        if expr.kind() != ExpressionKind::Standard {
            continue;
        }
        let Some(value) = resolver.resolve(expr.variable()) else {
            continue;
        };
        if whole {
            return (Substitution::Value(value), malformed);
        }
        out = out.replace(raw, &value.to_string());
        changed = true;
    }

    let substitution = if changed {
        Substitution::Text(out)
    } else {
        Substitution::Unchanged
    };
    (substitution, malformed)
}

/// Write substituted text into a cell
///
/// Text starting with `&=` becomes a formula once no expression is left in it.
pub fn write_cell_text(cell: &mut CellMut<'_>, text: &str) {
    match text.strip_prefix('&') {
        Some(formula) if formula.starts_with('=') && !contains_expression(formula) => {
            cell.set_formula(formula)
        }
        _ => cell.set_value(text),
    }
}

/// Built-in engine: substitutes standard expressions in place
#[derive(Debug, Clone, Default)]
pub struct SubstitutionEngine {
    cells_substituted: usize,
}

impl SubstitutionEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells rewritten by the last run
    pub fn cells_substituted(&self) -> usize {
        self.cells_substituted
    }
}

impl RangeEngine for SubstitutionEngine {
    fn expand(
        &mut self,
        workbook: &mut Workbook,
        hooks: &mut dyn ExpansionHooks,
    ) -> Result<Vec<TemplateError>> {
        self.cells_substituted = 0;
        let mut errors = Vec::new();

        for sheet in workbook.worksheets_mut() {
            if !hooks.before_expansion(sheet) {
                continue;
            }

            let cells: Vec<(CellAddress, String)> = sheet
                .text_cells()
                .filter(|(_, text)| contains_expression(text))
                .map(|(addr, text)| (addr, text.to_string()))
                .collect();

            let resolver = hooks.resolver(None);
            for (addr, text) in cells {
                let (substitution, malformed) = substitute_standard(&text, &resolver);
                for err in malformed {
                    errors.push(TemplateError::at_cell(
                        TemplateErrorKind::Syntax,
                        sheet.name(),
                        addr,
                        format!("Syntax error: {}", err),
                    ));
                }

                let mut cell = sheet.cell_mut_at(addr.row, addr.col);
                match substitution {
                    Substitution::Unchanged => continue,
                    Substitution::Value(value) => cell.set_value(value.to_cell_value()),
                    Substitution::Text(out) => write_cell_text(&mut cell, &out),
                }
                debug!(cell = %cell.key(), "substituted standard expressions");
                self.cells_substituted += 1;
            }
        }

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellplate_expr::Scope;
    use pretty_assertions::assert_eq;

    fn bindings() -> Bindings {
        let mut b = Bindings::new();
        b.insert("Name", "john");
        b.insert("Total", 30);
        b
    }

    #[test]
    fn test_substitute_whole_cell_is_typed() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        let (sub, malformed) = substitute_standard(" {{Total}} ", &resolver);
        assert_eq!(sub, Substitution::Value(Value::from(30)));
        assert!(malformed.is_empty());
    }

    #[test]
    fn test_substitute_leaves_enhanced_and_unknown() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        let (sub, _) = substitute_standard("{{Name}} {{Name:upper}} {{Missing}}", &resolver);
        assert_eq!(
            sub,
            Substitution::Text("john {{Name:upper}} {{Missing}}".to_string())
        );

        let (sub, _) = substitute_standard("{{Missing}} and {{Name|bold}}", &resolver);
        assert_eq!(sub, Substitution::Unchanged);
    }

    #[test]
    fn test_substitute_reports_malformed() {
        let b = bindings();
        let resolver = Resolver::new(Scope::new(&b));
        let (sub, malformed) = substitute_standard("{{Name}} {{:upper}}", &resolver);
        assert_eq!(sub, Substitution::Text("john {{:upper}}".to_string()));
        assert_eq!(malformed.len(), 1);
    }

    #[test]
    fn test_write_cell_text_formula() {
        let mut sheet = Worksheet::new("Sheet1");
        write_cell_text(&mut sheet.cell_mut_at(0, 0), "&=30*2");
        write_cell_text(&mut sheet.cell_mut_at(1, 0), "&={{Missing}}*2");
        write_cell_text(&mut sheet.cell_mut_at(2, 0), "a & b");

        assert!(sheet.cell_at(0, 0).unwrap().value.is_formula());
        assert_eq!(
            sheet.cell_at(0, 0).unwrap().value.formula_text(),
            Some("=30*2")
        );
        assert_eq!(sheet.cell_at(1, 0).unwrap().text(), Some("&={{Missing}}*2"));
        assert_eq!(sheet.cell_at(2, 0).unwrap().text(), Some("a & b"));
    }
}

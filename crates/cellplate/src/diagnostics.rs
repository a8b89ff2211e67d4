//! Expression inventory of a workbook

use std::fmt;

use cellplate_core::{CellAddress, Workbook};
use cellplate_expr::{contains_expression, extract_expressions, parse, ExprError};
use tracing::debug;

/// Expression counts for one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetDiagnostics {
    /// Sheet name
    pub name: String,
    /// Cells with plain `{{name}}` expressions only
    pub standard: usize,
    /// Cells with format expressions
    pub format: usize,
    /// Cells with function expressions
    pub function: usize,
}

impl SheetDiagnostics {
    /// Cells holding any expression
    pub fn total(&self) -> usize {
        self.standard + self.format + self.function
    }
}

/// An expression that does not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedExpression {
    /// Sheet name
    pub sheet: String,
    /// Cell holding the expression
    pub address: CellAddress,
    /// Expression text
    pub expression: String,
    /// Why it does not parse
    pub reason: String,
}

/// Report returned by [`Template::diagnose`](crate::Template::diagnose)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Per-sheet counts, in workbook order
    pub sheets: Vec<SheetDiagnostics>,
    /// Every expression that failed to parse
    pub malformed: Vec<MalformedExpression>,
}

impl Diagnostics {
    /// Check for malformed expressions
    pub fn has_problems(&self) -> bool {
        !self.malformed.is_empty()
    }

    /// Counts for a sheet
    pub fn sheet(&self, name: &str) -> Option<&SheetDiagnostics> {
        self.sheets.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sheet in &self.sheets {
            writeln!(
                f,
                "{}: {} standard, {} format, {} function",
                sheet.name, sheet.standard, sheet.format, sheet.function
            )?;
        }
        for m in &self.malformed {
            writeln!(f, "{}!{}: {} ({})", m.sheet, m.address, m.expression, m.reason)?;
        }
        Ok(())
    }
}

/// Inventory the expressions of every sheet
///
/// A cell counts as a function cell if its text contains `|`, else as a
/// format cell if it contains `:`, else as a standard cell.
pub fn diagnose(workbook: &Workbook) -> Diagnostics {
    let mut report = Diagnostics::default();

    for sheet in workbook.worksheets() {
        let mut counts = SheetDiagnostics {
            name: sheet.name().to_string(),
            ..SheetDiagnostics::default()
        };

        for (address, text) in sheet.text_cells() {
            if !contains_expression(text) {
                continue;
            }
            if text.contains('|') {
                counts.function += 1;
            } else if text.contains(':') {
                counts.format += 1;
            } else {
                counts.standard += 1;
            }

            for raw in extract_expressions(text) {
                if let Err(err) = parse(raw) {
                    let reason = match err {
                        ExprError::Malformed { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    report.malformed.push(MalformedExpression {
                        sheet: sheet.name().to_string(),
                        address,
                        expression: raw.to_string(),
                        reason,
                    });
                }
            }
        }

        debug!(
            sheet = %counts.name,
            standard = counts.standard,
            format = counts.format,
            function = counts.function,
            "expression inventory"
        );
        report.sheets.push(counts);
    }

    if report.has_problems() {
        debug!(malformed = report.malformed.len(), "malformed expressions found");
    }
    report
}

//! Prelude module - common imports for cellplate users
//!
//! ```rust
//! use cellplate::prelude::*;
//! ```

pub use crate::{
    // Document types
    CellAddress,
    CellMut,
    CellValue,
    Color,
    // Template types
    Bindings,
    ExpansionHooks,
    GenerateResult,
    HandlerError,
    HandlerResult,
    RangeEngine,
    Style,
    Template,
    TemplateError,
    TemplateErrorKind,
    TemplateOptions,
    Value,
    Workbook,
    Worksheet,
};

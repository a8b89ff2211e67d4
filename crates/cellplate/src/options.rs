//! Template generation options

use cellplate_core::Color;

/// Options for [`Template`](crate::Template) generation
#[derive(Debug, Clone)]
pub struct TemplateOptions {
    /// Process hidden worksheets too (default: false)
    pub include_hidden_sheets: bool,
    /// Rewrite `{{Collection.Count}}` before the pre-pass (default: true)
    pub collect_metadata: bool,
    /// Font color for cells whose handler failed (default: red)
    pub error_color: Color,
    /// Prefix of temporary binding names (default: `_temp_`)
    pub temp_prefix: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            include_hidden_sheets: false,
            collect_metadata: true,
            error_color: Color::RED,
            temp_prefix: "_temp_".to_string(),
        }
    }
}

impl TemplateOptions {
    /// Set whether hidden sheets are processed
    pub fn with_hidden_sheets(mut self, include: bool) -> Self {
        self.include_hidden_sheets = include;
        self
    }

    /// Set whether the collection metadata step runs
    pub fn with_metadata(mut self, collect: bool) -> Self {
        self.collect_metadata = collect;
        self
    }

    /// Set the error font color
    pub fn with_error_color(mut self, color: Color) -> Self {
        self.error_color = color;
        self
    }

    /// Set the temporary binding prefix
    pub fn with_temp_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.temp_prefix = prefix.into();
        self
    }
}

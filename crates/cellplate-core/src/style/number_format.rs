//! Number format types

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Custom format string (e.g. "#,##0.00", "yyyy-mm-dd")
    Custom(String),
}

impl NumberFormat {
    /// Create a number format from a format string
    pub fn from_string<S: Into<String>>(format: S) -> Self {
        let format = format.into();
        if format.eq_ignore_ascii_case("general") {
            NumberFormat::General
        } else {
            NumberFormat::Custom(format)
        }
    }

    /// The format code as written into a document
    pub fn code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::Custom(code) => code,
        }
    }
}

//! Cell hyperlinks

use std::fmt;

/// A hyperlink attached to a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hyperlink {
    /// Link to an external resource (URL)
    External(String),
    /// Link to a location inside the workbook ("#Sheet2!A1", "Summary!B4")
    Internal(String),
}

impl Hyperlink {
    /// Create an external link
    pub fn external<S: Into<String>>(url: S) -> Self {
        Hyperlink::External(url.into())
    }

    /// Create an internal link
    pub fn internal<S: Into<String>>(location: S) -> Self {
        Hyperlink::Internal(location.into())
    }

    /// Link target
    pub fn target(&self) -> &str {
        match self {
            Hyperlink::External(url) => url,
            Hyperlink::Internal(location) => location,
        }
    }

    /// Check if this link points inside the workbook
    pub fn is_internal(&self) -> bool {
        matches!(self, Hyperlink::Internal(_))
    }
}

impl fmt::Display for Hyperlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target())
    }
}

//! Border style types

use super::Color;

/// Border style for a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BorderStyle {
    /// Left border
    pub left: Option<BorderEdge>,
    /// Right border
    pub right: Option<BorderEdge>,
    /// Top border
    pub top: Option<BorderEdge>,
    /// Bottom border
    pub bottom: Option<BorderEdge>,
}

impl BorderStyle {
    /// Create a new border style with no borders
    pub fn new() -> Self {
        Self::default()
    }

    /// Set outline borders (left, right, top, bottom) to the same style
    pub fn outline(style: BorderLineStyle, color: Color) -> Self {
        if style == BorderLineStyle::None {
            return Self::default();
        }
        let edge = Some(BorderEdge::new(style, color));
        Self {
            left: edge.clone(),
            right: edge.clone(),
            top: edge.clone(),
            bottom: edge,
        }
    }

    /// Check if all borders are empty
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// A single border edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    /// Line style
    pub style: BorderLineStyle,
    /// Line color
    pub color: Color,
}

impl BorderEdge {
    /// Create a new border edge
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }
}

/// Border line styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderLineStyle {
    /// No border
    #[default]
    None,
    /// Thin line
    Thin,
    /// Medium line
    Medium,
    /// Thick line
    Thick,
    /// Dashed line
    Dashed,
    /// Dotted line
    Dotted,
    /// Double line
    Double,
    /// Hair line (very thin)
    Hair,
    /// Medium dashed
    MediumDashed,
    /// Dash-dot
    DashDot,
    /// Medium dash-dot
    MediumDashDot,
    /// Dash-dot-dot
    DashDotDot,
    /// Medium dash-dot-dot
    MediumDashDotDot,
    /// Slant dash-dot
    SlantDashDot,
}

impl BorderLineStyle {
    /// Parse a line style by name, ignoring case ("thin", "MediumDashed", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let style = match name.trim().to_ascii_lowercase().as_str() {
            "none" => BorderLineStyle::None,
            "thin" => BorderLineStyle::Thin,
            "medium" => BorderLineStyle::Medium,
            "thick" => BorderLineStyle::Thick,
            "dashed" => BorderLineStyle::Dashed,
            "dotted" => BorderLineStyle::Dotted,
            "double" => BorderLineStyle::Double,
            "hair" => BorderLineStyle::Hair,
            "mediumdashed" => BorderLineStyle::MediumDashed,
            "dashdot" => BorderLineStyle::DashDot,
            "mediumdashdot" => BorderLineStyle::MediumDashDot,
            "dashdotdot" => BorderLineStyle::DashDotDot,
            "mediumdashdotdot" => BorderLineStyle::MediumDashDotDot,
            "slantdashdot" => BorderLineStyle::SlantDashDot,
            _ => return None,
        };
        Some(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_style_from_name() {
        assert_eq!(BorderLineStyle::from_name("Thick"), Some(BorderLineStyle::Thick));
        assert_eq!(
            BorderLineStyle::from_name("mediumDashDot"),
            Some(BorderLineStyle::MediumDashDot)
        );
        assert_eq!(BorderLineStyle::from_name("wavy"), None);
    }

    #[test]
    fn test_outline() {
        let border = BorderStyle::outline(BorderLineStyle::Thin, Color::BLACK);
        assert_eq!(
            border.top,
            Some(BorderEdge::new(BorderLineStyle::Thin, Color::BLACK))
        );
        assert!(!border.is_empty());
        assert!(BorderStyle::outline(BorderLineStyle::None, Color::BLACK).is_empty());
    }
}

//! Color representation

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Color representation
///
/// Supports RGB, ARGB and theme colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,

    /// RGB color (no alpha)
    Rgb { r: u8, g: u8, b: u8 },

    /// ARGB color with alpha channel
    Argb { a: u8, r: u8, g: u8, b: u8 },

    /// Theme color with optional tint
    ///
    /// Theme indices:
    /// 0 = Background 1 (light)
    /// 1 = Text 1 (dark)
    /// 4-9 = Accent 1-6
    /// 10 = Hyperlink
    Theme {
        /// Theme color index (0-11)
        index: u8,
        /// Tint value (-100 to 100 percent)
        tint: i8,
    },
}

/// Named colors accepted by [`Color::from_name`] (lowercase, no separators)
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("aqua", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("fuchsia", (255, 0, 255)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("silver", (192, 192, 192)),
    ("lightgray", (211, 211, 211)),
    ("darkgray", (169, 169, 169)),
    ("maroon", (128, 0, 0)),
    ("darkred", (139, 0, 0)),
    ("olive", (128, 128, 0)),
    ("navy", (0, 0, 128)),
    ("darkblue", (0, 0, 139)),
    ("purple", (128, 0, 128)),
    ("teal", (0, 128, 128)),
    ("orange", (255, 165, 0)),
    ("darkorange", (255, 140, 0)),
    ("gold", (255, 215, 0)),
    ("pink", (255, 192, 203)),
    ("brown", (165, 42, 42)),
    ("violet", (238, 130, 238)),
    ("indigo", (75, 0, 130)),
    ("darkgreen", (0, 100, 0)),
    ("lightgreen", (144, 238, 144)),
    ("lightblue", (173, 216, 230)),
    ("skyblue", (135, 206, 235)),
    ("lightyellow", (255, 255, 224)),
    ("coral", (255, 127, 80)),
    ("salmon", (250, 128, 114)),
    ("tan", (210, 180, 140)),
    ("turquoise", (64, 224, 208)),
];

impl Color {
    /// Create an RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Create an ARGB color
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color::Argb { a, r, g, b }
    }

    /// Create a theme color
    pub const fn theme(index: u8, tint: i8) -> Self {
        Color::Theme { index, tint }
    }

    /// Create from a hex string (e.g., "#FF0000" or "FF0000")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }

        match hex.len() {
            3 => {
                // Short form: #F00
                let expand = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
                Some(Color::Rgb {
                    r: expand(0)?,
                    g: expand(1)?,
                    b: expand(2)?,
                })
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::Rgb { r, g, b })
            }
            8 => {
                let a = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let r = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let g = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let b = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Color::Argb { a, r, g, b })
            }
            _ => None,
        }
    }

    /// Look up a named color ("Red", "dark blue", "LightGray", ...)
    ///
    /// Matching ignores case, spaces, dashes and underscores.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == key)
            .map(|(_, (r, g, b))| Color::rgb(*r, *g, *b))
    }

    /// Parse a color given either as a name or as a hex string
    ///
    /// Names win over hex so that e.g. "Red" is never read as hex.
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_name(s).or_else(|| Self::from_hex(s))
    }

    /// Convert to hex string (without # prefix)
    pub fn to_hex(&self) -> String {
        match self {
            Color::Argb { a, r, g, b } => format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b),
            _ => {
                let (r, g, b) = self.to_rgb();
                format!("{:02X}{:02X}{:02X}", r, g, b)
            }
        }
    }

    /// Convert to RGB tuple
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        match self {
            Color::Auto => (0, 0, 0),
            Color::Rgb { r, g, b } => (*r, *g, *b),
            Color::Argb { r, g, b, .. } => (*r, *g, *b),
            Color::Theme { index, tint } => {
                let base = Self::theme_to_rgb(*index);
                Self::apply_tint(base, *tint)
            }
        }
    }

    /// Check if color is automatic/default
    pub fn is_auto(&self) -> bool {
        matches!(self, Color::Auto)
    }

    /// Get RGB for theme color (using default Office theme)
    fn theme_to_rgb(index: u8) -> (u8, u8, u8) {
        match index {
            0 => (255, 255, 255), // Background 1 (white)
            1 => (0, 0, 0),       // Text 1 (black)
            2 => (231, 230, 230), // Background 2
            3 => (68, 84, 106),   // Text 2
            4 => (68, 114, 196),  // Accent 1
            5 => (237, 125, 49),  // Accent 2
            6 => (165, 165, 165), // Accent 3
            7 => (255, 192, 0),   // Accent 4
            8 => (91, 155, 213),  // Accent 5
            9 => (112, 173, 71),  // Accent 6
            10 => (5, 99, 193),   // Hyperlink
            11 => (149, 79, 114), // Followed hyperlink
            _ => (0, 0, 0),
        }
    }

    /// Apply tint to a color
    fn apply_tint(color: (u8, u8, u8), tint: i8) -> (u8, u8, u8) {
        let tint_float = tint as f64 / 100.0;

        let apply = |c: u8| -> u8 {
            let c = c as f64;
            let result = if tint_float < 0.0 {
                c * (1.0 + tint_float)
            } else {
                c + (255.0 - c) * tint_float
            };
            result.clamp(0.0, 255.0) as u8
        };

        (apply(color.0), apply(color.1), apply(color.2))
    }

    // Common colors
    pub const BLACK: Color = Color::Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const RED: Color = Color::Rgb { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color::Rgb { r: 0, g: 128, b: 0 };
    pub const BLUE: Color = Color::Rgb { r: 0, g: 0, b: 255 };
    pub const YELLOW: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 0,
    };
    pub const GRAY: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };

    /// Theme hyperlink color
    pub const HYPERLINK: Color = Color::Theme {
        index: 10,
        tint: 0,
    };
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s).ok_or_else(|| Error::InvalidColor(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => write!(f, "auto"),
            Color::Rgb { r, g, b } => write!(f, "#{:02X}{:02X}{:02X}", r, g, b),
            Color::Argb { a, r, g, b } => write!(f, "#{:02X}{:02X}{:02X}{:02X}", a, r, g, b),
            Color::Theme { index, tint } => write!(f, "theme({}, {}%)", index, tint),
        }
    }
}

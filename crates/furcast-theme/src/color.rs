use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Text color for light backgrounds.
pub const DARK_TEXT: Rgb = Rgb::new(60, 60, 60);
pub const WHITE: Rgb = Rgb::new(255, 255, 255);

const LUMINANCE_THRESHOLD: f64 = 0.5;

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceptual luminance in [0, 1].
    pub fn luminance(&self) -> f64 {
        0.299 * f64::from(self.r) / 255.0
            + 0.587 * f64::from(self.g) / 255.0
            + 0.114 * f64::from(self.b) / 255.0
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A theme background. `Clear` is the empty color used when an asset
/// cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Clear,
    Rgb(Rgb),
}

impl Color {
    pub fn rgb(&self) -> Option<Rgb> {
        match self {
            Self::Clear => None,
            Self::Rgb(rgb) => Some(*rgb),
        }
    }

    /// Luminance; clear counts as black.
    pub fn luminance(&self) -> f64 {
        self.rgb().map(|c| c.luminance()).unwrap_or(0.0)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::Rgb(rgb)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => f.write_str("clear"),
            Self::Rgb(rgb) => rgb.fmt(f),
        }
    }
}

/// Text color readable on `background`: dark gray above the fixed
/// luminance threshold, white otherwise.
pub fn contrasting_text_color(background: Color) -> Rgb {
    if background.luminance() > LUMINANCE_THRESHOLD {
        DARK_TEXT
    } else {
        WHITE
    }
}

/// Background plus matching text color for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub background: Color,
    pub text: Rgb,
}

impl Theme {
    pub fn for_background(background: Color) -> Self {
        Self {
            background,
            text: contrasting_text_color(background),
        }
    }
}

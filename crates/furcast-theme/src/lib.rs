//! Theming for Furcast.
//!
//! Each city has a looping background animation. Its dominant corner color
//! becomes the page background, and the text color is picked for contrast
//! against it.

pub mod color;
pub mod error;
pub mod extract;

pub use color::{contrasting_text_color, Color, Rgb, Theme, DARK_TEXT, WHITE};
pub use error::ThemeError;
pub use extract::{AssetSource, ColorExtractor, DirAssetSource, MemoryAssetSource};

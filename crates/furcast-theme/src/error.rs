use thiserror::Error;

/// Why an asset produced no color. Never surfaced past the extractor; the
/// caller gets [`Color::Clear`](crate::Color::Clear) instead.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("asset not found: {0}")]
    Missing(String),

    #[error("failed to decode asset: {0}")]
    Decode(#[from] image::ImageError),

    #[error("the asset has no pixels")]
    Empty,
}

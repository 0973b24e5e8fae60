//! Dominant corner color of a background animation.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::color::{Color, Rgb, Theme};
use crate::error::ThemeError;

/// Where named assets come from.
pub trait AssetSource: Send + Sync {
    /// Raw bytes for `name`, or `None` if there is no such asset.
    fn load(&self, name: &str) -> Option<Vec<u8>>;
}

/// Assets stored as `<dir>/<name>.gif`.
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    dir: PathBuf,
}

impl DirAssetSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl AssetSource for DirAssetSource {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.dir.join(format!("{}.gif", name));
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!("Cannot read asset {:?}: {}", path, e);
                None
            }
        }
    }
}

/// Assets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(name.into(), bytes);
    }
}

impl AssetSource for MemoryAssetSource {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        self.assets.get(name).cloned()
    }
}

/// Extracts and memoizes background colors per asset name.
///
/// Results live for the life of the extractor; the asset set is small and
/// fixed so nothing is evicted. Lookup, extraction and insert run under one
/// lock, so each asset is decoded at most once.
pub struct ColorExtractor {
    source: Arc<dyn AssetSource>,
    cache: Mutex<HashMap<String, Color>>,
}

impl std::fmt::Debug for ColorExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorExtractor")
            .field("cached", &self.cache.lock().len())
            .finish_non_exhaustive()
    }
}

impl ColorExtractor {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Most frequent corner color of the asset's first frame.
    ///
    /// Missing or undecodable assets yield [`Color::Clear`].
    pub fn extract_background_color(&self, asset_name: &str) -> Color {
        let mut cache = self.cache.lock();
        if let Some(color) = cache.get(asset_name) {
            return *color;
        }

        let color = match self.extract(asset_name) {
            Ok(rgb) => Color::Rgb(rgb),
            Err(e) => {
                tracing::warn!("No background color for asset {}: {}", asset_name, e);
                Color::Clear
            }
        };
        tracing::debug!("Background color for {}: {}", asset_name, color);
        cache.insert(asset_name.to_string(), color);
        color
    }

    pub fn theme_for(&self, asset_name: &str) -> Theme {
        Theme::for_background(self.extract_background_color(asset_name))
    }

    fn extract(&self, asset_name: &str) -> Result<Rgb, ThemeError> {
        let bytes = self
            .source
            .load(asset_name)
            .ok_or_else(|| ThemeError::Missing(asset_name.to_string()))?;
        dominant_corner_color(&bytes)
    }
}

/// Decode the first frame and vote among its four corners.
///
/// Corners are visited top-left, top-right, bottom-left, bottom-right; on a
/// tie the color seen first wins. Pixels are premultiplied by alpha, so a
/// transparent corner votes for black.
pub fn dominant_corner_color(bytes: &[u8]) -> Result<Rgb, ThemeError> {
    // For animations the decoder yields the first frame.
    let frame = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(ThemeError::Empty);
    }

    let corners = [
        (0, 0),
        (width - 1, 0),
        (0, height - 1),
        (width - 1, height - 1),
    ];

    let mut tally: Vec<(Rgb, usize)> = Vec::with_capacity(corners.len());
    for (x, y) in corners {
        let [r, g, b, a] = frame.get_pixel(x, y).0;
        let color = Rgb::new(premultiply(r, a), premultiply(g, a), premultiply(b, a));
        match tally.iter_mut().find(|(c, _)| *c == color) {
            Some((_, count)) => *count += 1,
            None => tally.push((color, 1)),
        }
    }

    let mut best: Option<(Rgb, usize)> = None;
    for (color, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((color, count));
        }
    }
    best.map(|(color, _)| color).ok_or(ThemeError::Empty)
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{DynamicImage, Frame, ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

    /// 4x3 image, gray inside, with the given corners (tl, tr, bl, br).
    fn cornered(corners: [Rgba<u8>; 4]) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([128, 128, 128, 255]));
        img.put_pixel(0, 0, corners[0]);
        img.put_pixel(3, 0, corners[1]);
        img.put_pixel(0, 2, corners[2]);
        img.put_pixel(3, 2, corners[3]);
        img
    }

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn gif(frames: Vec<RgbaImage>) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut buf);
            encoder
                .encode_frames(frames.into_iter().map(Frame::new))
                .unwrap();
        }
        buf
    }

    #[test]
    fn test_plurality_wins() {
        let bytes = png(&cornered([RED, RED, BLUE, GREEN]));
        assert_eq!(dominant_corner_color(&bytes).unwrap(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_later_plurality_wins() {
        let bytes = png(&cornered([RED, BLUE, BLUE, GREEN]));
        assert_eq!(dominant_corner_color(&bytes).unwrap(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_all_distinct_returns_first_corner() {
        let bytes = png(&cornered([GREEN, RED, BLUE, YELLOW]));
        assert_eq!(dominant_corner_color(&bytes).unwrap(), Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_two_way_tie_returns_first_seen() {
        let bytes = png(&cornered([BLUE, RED, RED, BLUE]));
        assert_eq!(dominant_corner_color(&bytes).unwrap(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_single_pixel_image() {
        let img = RgbaImage::from_pixel(1, 1, YELLOW);
        assert_eq!(dominant_corner_color(&png(&img)).unwrap(), Rgb::new(255, 255, 0));
    }

    #[test]
    fn test_transparent_corners_vote_black() {
        let clear = Rgba([200, 10, 10, 0]);
        let bytes = png(&cornered([clear, clear, RED, BLUE]));
        assert_eq!(dominant_corner_color(&bytes).unwrap(), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_animation_uses_first_frame_only() {
        let bytes = gif(vec![
            cornered([RED, RED, BLUE, GREEN]),
            cornered([BLUE, BLUE, BLUE, BLUE]),
        ]);
        assert_eq!(dominant_corner_color(&bytes).unwrap(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = dominant_corner_color(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ThemeError::Decode(_)));
    }

    #[test]
    fn test_missing_asset_is_clear() {
        let extractor = ColorExtractor::new(Arc::new(MemoryAssetSource::new()));
        assert_eq!(extractor.extract_background_color("nope"), Color::Clear);
    }

    #[test]
    fn test_result_is_memoized() {
        let mut source = MemoryAssetSource::new();
        source.insert("1", png(&cornered([RED, RED, BLUE, GREEN])));
        let extractor = ColorExtractor::new(Arc::new(source));

        let first = extractor.extract_background_color("1");
        assert_eq!(first, Color::Rgb(Rgb::new(255, 0, 0)));
        assert_eq!(extractor.extract_background_color("1"), first);
        assert_eq!(extractor.cache.lock().len(), 1);
    }

    #[test]
    fn test_dir_source_reads_gif_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("2.gif"),
            gif(vec![cornered([BLUE, BLUE, RED, GREEN])]),
        )
        .unwrap();

        let extractor = ColorExtractor::new(Arc::new(DirAssetSource::new(dir.path())));
        let theme = extractor.theme_for("2");
        assert_eq!(theme.background, Color::Rgb(Rgb::new(0, 0, 255)));
        assert_eq!(theme.text, crate::WHITE);

        assert_eq!(extractor.extract_background_color("3"), Color::Clear);
    }

    #[test]
    fn test_concurrent_first_access_decodes_once() {
        let mut source = MemoryAssetSource::new();
        source.insert("1", png(&cornered([GREEN, GREEN, RED, RED])));
        let extractor = Arc::new(ColorExtractor::new(Arc::new(source)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let extractor = extractor.clone();
                std::thread::spawn(move || extractor.extract_background_color("1"))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Color::Rgb(Rgb::new(0, 255, 0)));
        }
        assert_eq!(extractor.cache.lock().len(), 1);
    }
}

//! Coin icons.
//!
//! Icons are decoded once, when the host registers them, and drawn clipped to
//! each particle's circle. A particle whose icon key is missing from the
//! registry simply renders as a plain labelled circle.
//!
//! ```ignore
//! swarm.icons_mut().insert_file("btc", "assets/btc.png")?;
//! ```
//!
//! # Supported Formats
//!
//! - PNG (recommended)
//! - JPEG

use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;

use crate::error::SwarmError;

/// A decoded RGBA icon.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    image: RgbaImage,
}

impl Icon {
    /// Wrap raw RGBA bytes. Fails if the buffer does not match the dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, SwarmError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(SwarmError::InvalidConfig(format!(
                "icon data is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        RgbaImage::from_raw(width, height, data)
            .map(|image| Self { image })
            .ok_or_else(|| SwarmError::InvalidConfig("icon buffer too small".into()))
    }

    /// Decode an encoded image (PNG or JPEG).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SwarmError> {
        let image = image::load_from_memory(bytes)?.into_rgba8();
        Ok(Self { image })
    }

    /// Load and decode an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SwarmError> {
        let image = image::open(path.as_ref())?.into_rgba8();
        Ok(Self { image })
    }

    /// A single-color square icon.
    pub fn solid(size: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.max(1), size.max(1), image::Rgba(rgba)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Nearest-neighbor sample at normalized `(u, v)`, both clamped to `[0, 1]`.
    pub fn sample(&self, u: f64, v: f64) -> [u8; 4] {
        let x = (u.clamp(0.0, 1.0) * (self.width() - 1) as f64).round() as u32;
        let y = (v.clamp(0.0, 1.0) * (self.height() - 1) as f64).round() as u32;
        self.image.get_pixel(x, y).0
    }
}

/// Icons keyed by the entity's icon key.
#[derive(Debug, Clone, Default)]
pub struct IconRegistry {
    icons: HashMap<String, Icon>,
}

impl IconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-decoded icon, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, icon: Icon) {
        self.icons.insert(key.into(), icon);
    }

    /// Decode and register encoded image bytes.
    pub fn insert_bytes(&mut self, key: impl Into<String>, bytes: &[u8]) -> Result<(), SwarmError> {
        let icon = Icon::from_bytes(bytes)?;
        self.insert(key, icon);
        Ok(())
    }

    /// Load, decode and register an image file.
    pub fn insert_file(&mut self, key: impl Into<String>, path: impl AsRef<Path>) -> Result<(), SwarmError> {
        let key = key.into();
        let icon = Icon::from_file(path.as_ref())?;
        log::debug!("registered icon '{}' from {}", key, path.as_ref().display());
        self.insert(key, icon);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Icon> {
        self.icons.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Icon> {
        self.icons.remove(key)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_size_mismatch() {
        assert!(Icon::from_rgba(vec![0; 15], 2, 2).is_err());
        assert!(Icon::from_rgba(vec![0; 16], 2, 2).is_ok());
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let mut registry = IconRegistry::new();
        let err = registry.insert_bytes("btc", b"definitely not a png").unwrap_err();
        assert!(matches!(err, SwarmError::Icon(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_png_roundtrip_through_registry() {
        let mut png = Vec::new();
        let source = RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 255]));
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut registry = IconRegistry::new();
        registry.insert_bytes("eth", &png).unwrap();
        let icon = registry.get("eth").unwrap();
        assert_eq!((icon.width(), icon.height()), (3, 3));
        assert_eq!(icon.sample(0.5, 0.5), [10, 20, 30, 255]);
    }

    #[test]
    fn test_sample_clamps() {
        let data = vec![
            255, 0, 0, 255, //
            0, 255, 0, 255,
        ];
        let icon = Icon::from_rgba(data, 2, 1).unwrap();
        assert_eq!(icon.sample(-1.0, 0.0), [255, 0, 0, 255]);
        assert_eq!(icon.sample(2.0, 0.0), [0, 255, 0, 255]);
    }
}

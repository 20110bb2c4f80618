//! Image payloads carried by stickers, board images and board covers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding of an image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless with transparency, used for stickers.
    Png,
    /// Lossy, used for photos and board covers.
    Jpeg,
}

impl ImageFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Infer the format from an asset file name.
    #[must_use]
    pub fn from_extension(name: &str) -> Option<Self> {
        let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// Encoded image bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlob {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl ImageBlob {
    #[must_use]
    pub const fn new(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    #[must_use]
    pub fn png(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ImageFormat::Png, bytes.into())
    }

    #[must_use]
    pub fn jpeg(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ImageFormat::Jpeg, bytes.into())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageBlob {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImageBlob")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ImageFormat::from_extension("a.PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("x/y.jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("noext"), None);
    }

    #[test]
    fn debug_hides_payload() {
        let blob = ImageBlob::png(vec![1, 2, 3]);
        let debug = format!("{blob:?}");
        assert!(debug.contains("len: 3"));
        assert!(!debug.contains("[1, 2, 3]"));
    }
}

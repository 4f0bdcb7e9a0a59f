use clap::ValueEnum;
use image::error::{LimitError, LimitErrorKind};
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader};
use serde::Deserialize;
use std::io::Cursor;
use std::path::Path;

/// The single encoding every downloaded asset is normalized to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalFormat {
    /// Lossless PNG
    #[default]
    Png,
    /// JPEG, alpha channel dropped
    #[value(alias = "jpg")]
    #[serde(alias = "jpg")]
    Jpeg,
}

impl CanonicalFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CanonicalFormat::Png => "png",
            CanonicalFormat::Jpeg => "jpg",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            CanonicalFormat::Png => ImageFormat::Png,
            CanonicalFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Decode `source` and re-encode it in `format`, returning the encoded bytes.
///
/// The source encoding is guessed from content, so the file name of `source`
/// does not matter.
pub fn normalize_image(source: &Path, format: CanonicalFormat) -> Result<Vec<u8>, ImageError> {
    let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::DimensionError,
        )));
    }

    let img = match format {
        CanonicalFormat::Png => img,
        CanonicalFormat::Jpeg => DynamicImage::ImageRgb8(img.into_rgb8()),
    };

    let mut encoded = Cursor::new(Vec::new());
    img.write_to(&mut encoded, format.image_format())?;
    Ok(encoded.into_inner())
}

/// Small RGBA PNG used as a download payload in tests.
#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 40) as u8, (y * 40) as u8, 128, 200])
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

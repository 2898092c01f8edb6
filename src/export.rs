use std::str::FromStr;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, MulDiv, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ImageEncoder, ImageResult, RgbaImage};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

impl From<PngCompression> for CompressionType {
    fn from(compression: PngCompression) -> Self {
        match compression {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

impl FromStr for PngCompression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(PngCompression::Fast),
            "default" => Ok(PngCompression::Default),
            "best" => Ok(PngCompression::Best),
            other => Err(format!("unknown compression '{other}', expected fast, default or best")),
        }
    }
}

/// Largest size with the same aspect ratio that fits inside `max_width × max_height`.
///
/// Images that already fit are returned unchanged; neither side is ever zero.
pub fn fit_inside(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return (width, height);
    }
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let fitted_width = (f64::from(width) * scale).round() as u32;
    let fitted_height = (f64::from(height) * scale).round() as u32;
    (
        fitted_width.clamp(1, max_width.max(1)),
        fitted_height.clamp(1, max_height.max(1)),
    )
}

/// Bilinear resize with premultiplied alpha, so transparent pixels do not bleed colour into edges.
pub fn resize_rgba(image: &RgbaImage, target_width: u32, target_height: u32) -> Result<RgbaImage> {
    if image.dimensions() == (target_width, target_height) {
        return Ok(image.clone());
    }
    let mut src_image = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| Error::Resize(e.to_string()))?;

    // Pre-multiply alpha
    let alpha_mul_div = MulDiv::default();
    alpha_mul_div
        .multiply_alpha_inplace(&mut src_image)
        .map_err(|e| Error::Resize(e.to_string()))?;

    let mut dst_image = Image::new(target_width, target_height, PixelType::U8x4);

    let mut resizer = Resizer::new();
    let mut resize_option = ResizeOptions::new();
    resize_option.algorithm = ResizeAlg::Convolution(FilterType::Bilinear);

    resizer
        .resize(&src_image, &mut dst_image, Some(&resize_option))
        .map_err(|e| Error::Resize(e.to_string()))?;

    // Un-premultiply alpha
    alpha_mul_div
        .divide_alpha_inplace(&mut dst_image)
        .map_err(|e| Error::Resize(e.to_string()))?;

    RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| Error::Resize("resized buffer does not match target dimensions".into()))
}

/// Downscale `image` to fit a `max_side` square, never enlarging it.
pub fn thumbnail(image: &RgbaImage, max_side: u32) -> Result<RgbaImage> {
    let (width, height) = fit_inside(image.width(), image.height(), max_side, max_side);
    resize_rgba(image, width, height)
}

/// Encode to PNG in memory with adaptive row filtering.
pub fn encode_png(image: &DynamicImage, compression: PngCompression) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut bytes, compression.into(), PngFilterType::Adaptive);
    encoder.write_image(
        image.as_bytes(),
        image.width(),
        image.height(),
        image.color().into(),
    )?;
    Ok(bytes)
}

//! Raster image recompression.
//!
//! PNG is re-encoded losslessly at best compression, JPEG at a fixed quality.
//! The smaller of input and output wins, so a file never grows. Other formats
//! pass through unchanged.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};

/// Recompress `data`, returning the bytes to write.
///
/// `format` comes from the file extension; unsupported formats are returned
/// as-is.
pub fn optimize(data: Vec<u8>, format: ImageFormat, jpeg_quality: u8) -> Result<Vec<u8>, String> {
    let encoded = match format {
        ImageFormat::Png => encode_png(&decode(&data, format)?)?,
        ImageFormat::Jpeg => encode_jpeg(&decode(&data, format)?, jpeg_quality)?,
        _ => return Ok(data),
    };
    Ok(if encoded.len() < data.len() { encoded } else { data })
}

fn decode(data: &[u8], format: ImageFormat) -> Result<DynamicImage, String> {
    image::load_from_memory_with_format(data, format).map_err(|e| e.to_string())
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
    Ok(out)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

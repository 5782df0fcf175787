//! PNG export.
//!
//! Encoding is deterministic for a given surface, so cached plates can be
//! compared and re-served byte for byte.

use std::path::Path;

use base64::Engine;
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, RgbaImage};

use super::{PlateError, PlateStyle};

/// Lossless PNG encode of a raster surface.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, PlateError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)
        .map_err(|e| PlateError::Render(format!("png encode: {e}")))?;
    Ok(buf)
}

/// Optional lossless oxipng pass over an encoded plate.
///
/// Off by default (a 4K plate takes real CPU); enable with
/// `PLATE_EXPORT_OPTIMIZE=1`, tune with `PLATE_EXPORT_OXIPNG_LEVEL`.
/// Optimizer errors fall back to the input bytes.
pub fn optimize_png(png: Vec<u8>) -> Vec<u8> {
    let enabled = std::env::var("PLATE_EXPORT_OPTIMIZE")
        .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
        .unwrap_or(false);
    if !enabled {
        return png;
    }

    let level = std::env::var("PLATE_EXPORT_OXIPNG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(2)
        .min(6);

    let mut opts = oxipng::Options::from_preset(level);
    opts.fix_errors = true;

    match oxipng::optimize_from_memory(&png, &opts) {
        Ok(out) => out,
        Err(_) => png,
    }
}

/// Download name: `UAE_Plate_{emirate}_{style}_{code}_{number}.png`.
pub fn download_filename(emirate: &str, style: PlateStyle, code: &str, number: &str) -> String {
    format!(
        "UAE_Plate_{}_{}_{}_{}.png",
        filename_part(emirate),
        style.as_str(),
        filename_part(code),
        filename_part(number),
    )
}

// Keep header-safe characters only.
fn filename_part(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Encoded plate as a `data:` URL for inline preview consumers.
pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Writes encoded bytes to disk.
pub fn save_png(path: &Path, png: &[u8]) -> Result<(), PlateError> {
    std::fs::write(path, png)
        .map_err(|e| PlateError::Export(format!("write {}: {e}", path.display())))
}

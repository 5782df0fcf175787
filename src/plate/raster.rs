//! Plate rasterizer.
//!
//! Composites a blank plate template and the code/number text into the final
//! high-resolution surface. The embossed look is a three-layer 2-D
//! approximation of pressed-metal lettering: an offset dark shadow behind
//! the glyph, a pale rim around it, and a near-black face on top. The layer
//! offsets are absolute pixels derived from the font size and are tuned for
//! the fixed 3840 px output width; changing that width requires re-checking
//! them against reference renders.

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use super::fonts::FontStore;
use super::layout::{Align, ComponentKind, EmirateLayout};
use super::PlateError;

/// Output surface width in pixels; height follows the template aspect ratio.
pub const OUTPUT_WIDTH: u32 = 3840;

// Vertical-centering compensation: glyphs sit on a baseline, so centering
// the baseline itself would push text visually high. 0.35 of the font height
// approximates the cap-height offset.
const CAP_CENTER_RATIO: f32 = 0.35;

const SHADOW_OFFSET_RATIO: f32 = 0.018;
const SHADOW_OFFSET_MIN: f32 = 3.0;
const RIM_WIDTH_RATIO: f32 = 0.012;
const RIM_WIDTH_MIN: f32 = 2.0;

const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 128]);
const RIM: Rgba<u8> = Rgba([255, 255, 255, 140]);
const FACE: Rgba<u8> = Rgba([10, 10, 10, 255]);
const FLAT: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Output height for a template, preserving its aspect ratio exactly.
pub fn output_height(bg_width: u32, bg_height: u32) -> u32 {
    (OUTPUT_WIDTH as f32 * bg_height as f32 / bg_width as f32).round() as u32
}

/// Total advance of a text run: per-glyph advances plus inter-character
/// spacing. Spacing is purely between characters, none after the last.
pub fn line_width(advances: &[f32], spacing: f32) -> f32 {
    if advances.is_empty() {
        return 0.0;
    }
    advances.iter().sum::<f32>() + (advances.len() - 1) as f32 * spacing
}

/// Starting x for a run of the given width anchored at `anchor`.
pub fn anchor_start(anchor: f32, align: Align, width: f32) -> f32 {
    match align {
        Align::Left => anchor,
        Align::Center => anchor - width / 2.0,
        Align::Right => anchor - width,
    }
}

fn override_px(ratio: Option<f32>, basis: f32, default_px: f32) -> f32 {
    match ratio {
        Some(r) => r * basis,
        None => default_px,
    }
}

/// Draws `code` and `number` onto the template per the emirate layout.
///
/// Fonts must already be loaded into `fonts`; a component with empty text is
/// skipped entirely and reserves no space. Synchronous by design so the
/// per-key render cache can guarantee at most one render without locking.
pub fn render(
    bg: &RgbaImage,
    layout: &EmirateLayout,
    fonts: &FontStore,
    font_name: &str,
    code: &str,
    number: &str,
) -> Result<RgbaImage, PlateError> {
    if bg.width() == 0 || bg.height() == 0 {
        return Err(PlateError::InvalidInput(
            "blank plate template has zero dimension".to_string(),
        ));
    }
    let w = OUTPUT_WIDTH;
    let h = output_height(bg.width(), bg.height());
    if h == 0 {
        return Err(PlateError::InvalidInput(format!(
            "template aspect ratio {}x{} yields a zero-height surface",
            bg.width(),
            bg.height()
        )));
    }

    // Background stretched to fill; templates are high resolution, so
    // upscaling is expected and fine.
    let mut out = imageops::resize(bg, w, h, FilterType::Lanczos3);

    let wf = w as f32;
    let hf = h as f32;
    let global_font_px = wf * layout.font_height_ratio;

    let base_y = if layout.vertical_center {
        hf / 2.0 + global_font_px * CAP_CENTER_RATIO
    } else {
        hf * layout.baseline_ratio.unwrap_or(0.5)
    };

    let code_text = code.to_uppercase();

    for comp in &layout.components {
        let text = match comp.kind {
            ComponentKind::Code => code_text.as_str(),
            ComponentKind::Number => number,
        };
        if text.is_empty() {
            continue;
        }

        let face = fonts.face(font_name)?;
        let font_px = override_px(comp.font_size_ratio, wf, global_font_px);
        let spacing = comp
            .letter_spacing_ratio
            .unwrap_or(layout.letter_spacing_ratio)
            * wf;
        let baseline = base_y + comp.baseline_offset_ratio.unwrap_or(0.0) * hf;
        let scale = Scale::uniform(font_px);

        let advances: Vec<f32> = text
            .chars()
            .map(|ch| face.glyph(ch).scaled(scale).h_metrics().advance_width)
            .collect();
        let total = line_width(&advances, spacing);
        let mut cursor = anchor_start(wf * comp.x_ratio, comp.align, total);

        let shadow_off = (font_px * SHADOW_OFFSET_RATIO).round().max(SHADOW_OFFSET_MIN);
        let rim_w = (font_px * RIM_WIDTH_RATIO).round().max(RIM_WIDTH_MIN);

        for (ch, advance) in text.chars().zip(&advances) {
            if comp.emboss {
                // Back to front: recessed shadow, raised rim, legible face.
                fill_glyph(
                    &mut out,
                    &face,
                    scale,
                    ch,
                    cursor + shadow_off,
                    baseline + shadow_off,
                    SHADOW,
                );
                rim_glyph(&mut out, &face, scale, ch, cursor, baseline, rim_w, RIM);
                fill_glyph(&mut out, &face, scale, ch, cursor, baseline, FACE);
            } else {
                fill_glyph(&mut out, &face, scale, ch, cursor, baseline, FLAT);
            }
            cursor += advance + spacing;
        }
    }

    Ok(out)
}

/// Blends one glyph's coverage into the surface at the given baseline origin.
fn fill_glyph(
    img: &mut RgbaImage,
    font: &Font<'static>,
    scale: Scale,
    ch: char,
    x: f32,
    baseline: f32,
    color: Rgba<u8>,
) {
    let glyph = font.glyph(ch).scaled(scale).positioned(point(x, baseline));
    let Some(bb) = glyph.pixel_bounding_box() else {
        return;
    };
    let layer_alpha = color.0[3] as f32 / 255.0;
    let (w, h) = (img.width(), img.height());
    glyph.draw(|gx, gy, coverage| {
        let px = gx as i32 + bb.min.x;
        let py = gy as i32 + bb.min.y;
        if px < 0 || py < 0 {
            return;
        }
        let (px, py) = (px as u32, py as u32);
        if px >= w || py >= h {
            return;
        }
        let sa = coverage * layer_alpha;
        if sa <= 0.0 {
            return;
        }
        let inv = 1.0 - sa;
        let dst = img.get_pixel_mut(px, py);
        dst.0[0] = (color.0[0] as f32 * sa + dst.0[0] as f32 * inv) as u8;
        dst.0[1] = (color.0[1] as f32 * sa + dst.0[1] as f32 * inv) as u8;
        dst.0[2] = (color.0[2] as f32 * sa + dst.0[2] as f32 * inv) as u8;
        dst.0[3] = 255;
    });
}

/// Pale rim around a glyph: the fill dilated in eight directions at the rim
/// radius. The face layer repaints the interior, so only the ring of dilated
/// edge survives, reading as a rounded outline.
#[allow(clippy::too_many_arguments)]
fn rim_glyph(
    img: &mut RgbaImage,
    font: &Font<'static>,
    scale: Scale,
    ch: char,
    x: f32,
    baseline: f32,
    width_px: f32,
    color: Rgba<u8>,
) {
    let r = width_px.max(1.0);
    let d = r * std::f32::consts::FRAC_1_SQRT_2;
    let offsets = [
        (r, 0.0),
        (-r, 0.0),
        (0.0, r),
        (0.0, -r),
        (d, d),
        (d, -d),
        (-d, d),
        (-d, -d),
    ];
    for (dx, dy) in offsets {
        fill_glyph(img, font, scale, ch, x + dx, baseline + dy, color);
    }
}

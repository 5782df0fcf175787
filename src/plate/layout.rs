//! Static per-emirate layout table.
//!
//! Each emirate plate template has its own geometry: where the code and
//! number sit, how tall the glyphs are relative to the plate width, and how
//! the baseline is derived. All positions are ratios of the output surface
//! so one table serves every render resolution of a given template.

use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Code,
    Number,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One text run on the plate (the code prefix or the main number).
#[derive(Clone, Copy, Debug)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    /// Horizontal anchor as a fraction of output width.
    pub x_ratio: f32,
    pub align: Align,
    pub emboss: bool,
    /// Overrides the layout-wide font height when set (fraction of width).
    pub font_size_ratio: Option<f32>,
    /// Overrides the layout-wide letter spacing when set (fraction of width).
    pub letter_spacing_ratio: Option<f32>,
    /// Baseline shift for this component only (fraction of height).
    pub baseline_offset_ratio: Option<f32>,
}

impl ComponentSpec {
    const fn new(kind: ComponentKind, x_ratio: f32, align: Align) -> Self {
        Self {
            kind,
            x_ratio,
            align,
            emboss: true,
            font_size_ratio: None,
            letter_spacing_ratio: None,
            baseline_offset_ratio: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EmirateLayout {
    /// Whether this emirate format has a separate code segment at all.
    /// Renderers must still tolerate an empty code string either way.
    pub has_code: bool,
    /// Default glyph height as a fraction of output width.
    pub font_height_ratio: f32,
    /// Default inter-character gap as a fraction of output width.
    pub letter_spacing_ratio: f32,
    /// Baseline position as a fraction of output height; only consulted when
    /// `vertical_center` is false.
    pub baseline_ratio: Option<f32>,
    /// Derive the baseline from the vertical midpoint instead of
    /// `baseline_ratio`.
    pub vertical_center: bool,
    /// Logical font name override; `None` means the shared base face.
    pub font_family: Option<&'static str>,
    pub components: Vec<ComponentSpec>,
}

/// Fallback layout for unknown emirate keys.
pub const DEFAULT_EMIRATE: &str = "ajman";

use Align::Center;
use ComponentKind::{Code, Number};

static LAYOUTS: Lazy<HashMap<&'static str, EmirateLayout>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert(
        "ajman",
        EmirateLayout {
            has_code: true,
            font_height_ratio: 0.18,
            letter_spacing_ratio: 0.015,
            baseline_ratio: None,
            vertical_center: true,
            font_family: None,
            components: vec![
                ComponentSpec::new(Code, 0.09, Center),
                ComponentSpec::new(Number, 0.43, Center),
            ],
        },
    );

    m.insert(
        "abudhabi",
        EmirateLayout {
            has_code: true,
            font_height_ratio: 0.18,
            letter_spacing_ratio: 0.02,
            // Dormant while vertical_center is set; kept with the template data.
            baseline_ratio: Some(0.50),
            vertical_center: true,
            font_family: Some("PlateFont_abudhabi"),
            components: vec![
                ComponentSpec {
                    font_size_ratio: Some(0.12),
                    letter_spacing_ratio: Some(0.0001),
                    baseline_offset_ratio: Some(-0.23),
                    ..ComponentSpec::new(Code, 0.14, Center)
                },
                ComponentSpec {
                    letter_spacing_ratio: Some(0.0001),
                    ..ComponentSpec::new(Number, 0.70, Center)
                },
            ],
        },
    );

    m.insert(
        "dubai",
        EmirateLayout {
            has_code: true,
            font_height_ratio: 0.20,
            letter_spacing_ratio: 0.015,
            baseline_ratio: None,
            vertical_center: true,
            font_family: Some("PlateFont_dubai"),
            components: vec![
                ComponentSpec {
                    font_size_ratio: Some(0.13),
                    ..ComponentSpec::new(Code, 0.12, Center)
                },
                ComponentSpec::new(Number, 0.62, Center),
            ],
        },
    );

    m.insert(
        "sharjah",
        EmirateLayout {
            has_code: true,
            font_height_ratio: 0.133,
            letter_spacing_ratio: 0.015,
            baseline_ratio: Some(0.70),
            vertical_center: false,
            font_family: None,
            components: vec![
                ComponentSpec::new(Code, 0.155, Center),
                ComponentSpec::new(Number, 0.735, Center),
            ],
        },
    );

    m.insert(
        "rak",
        EmirateLayout {
            has_code: true,
            font_height_ratio: 0.168,
            letter_spacing_ratio: 0.015,
            baseline_ratio: None,
            vertical_center: true,
            font_family: Some("PlateFont_rak"),
            components: vec![
                ComponentSpec::new(Code, 0.31, Center),
                ComponentSpec::new(Number, 0.65, Center),
            ],
        },
    );

    m.insert(
        "fujairah",
        EmirateLayout {
            has_code: true,
            font_height_ratio: 0.18,
            letter_spacing_ratio: 0.015,
            baseline_ratio: None,
            vertical_center: true,
            font_family: None,
            components: vec![
                ComponentSpec::new(Code, 0.13, Center),
                ComponentSpec::new(Number, 0.65, Center),
            ],
        },
    );

    m.insert(
        "umm_al_quwain",
        EmirateLayout {
            has_code: true,
            font_height_ratio: 0.17,
            letter_spacing_ratio: 0.015,
            baseline_ratio: Some(0.80),
            vertical_center: false,
            font_family: Some("PlateFont_umm_al_quwain"),
            components: vec![
                ComponentSpec::new(Code, 0.124, Center),
                ComponentSpec::new(Number, 0.671, Center),
            ],
        },
    );

    m
});

/// Layout for a normalized emirate key. Unknown keys get the default layout
/// rather than an error so malformed or future identifiers still render.
pub fn resolve(emirate: &str) -> &'static EmirateLayout {
    LAYOUTS
        .get(emirate)
        .unwrap_or_else(|| &LAYOUTS[DEFAULT_EMIRATE])
}

/// Known emirate keys, sorted, for the registry index endpoint.
pub fn emirates() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = LAYOUTS.keys().copied().collect();
    keys.sort_unstable();
    keys
}

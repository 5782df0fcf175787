//! Plate rendering engine.
//!
//! `PlateEngine` owns the three process-scoped services (font store,
//! template store, render cache) and runs the per-request pipeline:
//! resolve layout -> ensure fonts -> load template -> rasterize -> encode ->
//! memoize. Everything async suspends only on resource loading; the raster
//! hot path is synchronous.

pub mod cache;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod raster;
pub mod templates;

use std::{path::PathBuf, sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::util::normalize_emirate_key;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PlateStyle {
    #[default]
    Private,
    Bike,
    Classic,
}

impl PlateStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlateStyle::Private => "private",
            PlateStyle::Bike => "bike",
            PlateStyle::Classic => "classic",
        }
    }

    pub fn all() -> [PlateStyle; 3] {
        [PlateStyle::Private, PlateStyle::Bike, PlateStyle::Classic]
    }

    /// Template asset key for this style; the private style uses the base
    /// emirate asset directly.
    pub fn template_key(&self, emirate: &str) -> String {
        match self {
            PlateStyle::Private => emirate.to_string(),
            other => format!("{emirate}_{}", other.as_str()),
        }
    }
}

/// One render request as received from a consumer.
#[derive(Clone, Debug)]
pub struct PlateRequest {
    pub emirate: String,
    pub code: String,
    pub number: String,
    pub style: PlateStyle,
}

impl PlateRequest {
    /// Cache identity of this request. The emirate is normalized so
    /// "Umm Al Quwain" and "umm_al_quwain" share one entry; code and number
    /// participate verbatim.
    pub fn key(&self) -> PlateKey {
        PlateKey {
            emirate: normalize_emirate_key(&self.emirate),
            code: self.code.clone(),
            number: self.number.clone(),
            style: self.style,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlateKey {
    pub emirate: String,
    pub code: String,
    pub number: String,
    pub style: PlateStyle,
}

/// A finished plate: encoded PNG plus its surface dimensions.
#[derive(Clone, Debug)]
pub struct RenderedPlate {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum PlateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("font: {0}")]
    FontLoad(#[from] fonts::FontLoadError),
    #[error("template: {0}")]
    Template(#[from] templates::TemplateError),
    #[error("render failed: {0}")]
    Render(String),
    #[error("export: {0}")]
    Export(String),
}

pub struct PlateEngine {
    fonts: fonts::FontStore,
    templates: templates::TemplateStore,
    cache: cache::RenderCache,
}

impl PlateEngine {
    /// Engine over the standard asset layout: `{assets}/fonts` and
    /// `{assets}/plates`.
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        let dir = assets_dir.into();
        Self::with_parts(
            fonts::FontStore::with_default_manifest(dir.join("fonts")),
            templates::TemplateStore::new(dir.join("plates")),
        )
    }

    pub fn with_parts(fonts: fonts::FontStore, templates: templates::TemplateStore) -> Self {
        Self {
            fonts,
            templates,
            cache: cache::RenderCache::new(),
        }
    }

    /// Rendered plate for a request, from cache when available. Failures
    /// propagate to the caller, are logged with the request identity, and
    /// are never memoized.
    pub async fn render(&self, req: &PlateRequest) -> Result<Arc<RenderedPlate>, PlateError> {
        let key = req.key();
        let result = self
            .cache
            .get_or_render(&key, || self.render_uncached(&key))
            .await;
        if let Err(e) = &result {
            error!(
                emirate = %key.emirate,
                code = %key.code,
                number = %key.number,
                style = key.style.as_str(),
                "plate render failed: {e}"
            );
        }
        result
    }

    async fn render_uncached(&self, key: &PlateKey) -> Result<Arc<RenderedPlate>, PlateError> {
        let started = Instant::now();

        let layout = layout::resolve(&key.emirate);
        self.fonts.ensure_loaded().await?;
        let bg = self.templates.for_plate(&key.emirate, key.style).await?;
        let font_name = self
            .fonts
            .resolve_name(&key.emirate, key.style, layout.font_family);

        let surface = raster::render(&bg, layout, &self.fonts, font_name, &key.code, &key.number)?;
        let png = export::optimize_png(export::encode_png(&surface)?);

        debug!(
            emirate = %key.emirate,
            style = key.style.as_str(),
            width = surface.width(),
            height = surface.height(),
            ms = started.elapsed().as_secs_f64() * 1000.0,
            "rendered plate"
        );
        Ok(Arc::new(RenderedPlate {
            width: surface.width(),
            height: surface.height(),
            png,
        }))
    }

    pub fn fonts(&self) -> &fonts::FontStore {
        &self.fonts
    }

    pub fn templates(&self) -> &templates::TemplateStore {
        &self.templates
    }

    /// Known emirate keys for the registry index.
    pub fn emirates(&self) -> Vec<&'static str> {
        layout::emirates()
    }

    /// Number of plates currently memoized.
    pub fn cached_plates(&self) -> usize {
        self.cache.len()
    }

    /// Clears every cache and registry in the engine. Test hook.
    pub fn reset(&self) {
        self.cache.reset();
        self.templates.reset();
        self.fonts.reset();
    }
}

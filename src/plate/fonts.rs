//! Plate font store.
//!
//! All plate faces are loaded up front and registered under logical names
//! before any text is measured or drawn. A silently substituted fallback
//! face would produce visibly wrong glyphs on a product artifact, so a
//! missing or unparseable file fails the whole batch; nothing is published
//! until every name verifies.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
};

use parking_lot::RwLock;
use rusttype::Font;
use thiserror::Error;

use super::PlateStyle;

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("font file missing for \"{name}\": {path}")]
    Missing { name: String, path: PathBuf },
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse font file {path}")]
    Parse { path: PathBuf },
    #[error("font \"{name}\" unusable after registration ({path})")]
    Unusable { name: String, path: PathBuf },
    #[error("font \"{0}\" is not registered")]
    Unregistered(String),
}

/// One logical font name backed by a file. Several names may share a file;
/// the file is fetched and parsed once.
#[derive(Clone, Copy, Debug)]
pub struct FontDef {
    pub name: &'static str,
    pub file: &'static str,
    pub weight: &'static str,
}

const fn def(name: &'static str, file: &'static str) -> FontDef {
    FontDef {
        name,
        file,
        weight: "bold",
    }
}

/// Shared base face used when no emirate- or style-specific name applies.
pub const BASE_FONT: &str = "PlateFont";

const GL_NUMMERNSCHILD: &str = "GL-Nummernschild-Mtl.ttf";
const DIN_1451: &str = "DIN-1451.ttf";
const ROUGH_MOTION: &str = "Rough Motion.otf";
const AMIRI_BOLD: &str = "Amiri-Bold.ttf";

/// Every logical name a render may ask for, mapped onto the four files.
pub fn default_manifest() -> Vec<FontDef> {
    vec![
        def(BASE_FONT, GL_NUMMERNSCHILD),
        def("PlateFont_ajman", GL_NUMMERNSCHILD),
        def("PlateFont_ajman_classic", GL_NUMMERNSCHILD),
        def("PlateFont_abudhabi", GL_NUMMERNSCHILD),
        def("PlateFont_abudhabi_bike", GL_NUMMERNSCHILD),
        def("PlateFont_abudhabi_classic", GL_NUMMERNSCHILD),
        def("PlateFont_rak_classic", GL_NUMMERNSCHILD),
        def("PlateFont_fujairah", GL_NUMMERNSCHILD),
        def("PlateFont_sharjah", GL_NUMMERNSCHILD),
        def("PlateFont_rak", DIN_1451),
        def("PlateFont_umm_al_quwain", DIN_1451),
        def("PlateFont_sharjah_classic", DIN_1451),
        def("PlateFont_sharjah_bike", DIN_1451),
        def("PlateFont_ajman_bike", DIN_1451),
        def("PlateFont_dubai", ROUGH_MOTION),
        def("PlateFont_dubai_bike", ROUGH_MOTION),
        def("PlateFont_dubai_classic", ROUGH_MOTION),
        def("PlateFont_rak_bike", ROUGH_MOTION),
        def("PlateFont_umm_al_quwain_bike", ROUGH_MOTION),
        def("PlateFont_fujairah_bike", ROUGH_MOTION),
        def("ArabicFont_abudhabi", AMIRI_BOLD),
    ]
}

pub struct FontStore {
    dir: PathBuf,
    manifest: Vec<FontDef>,
    faces: RwLock<HashMap<String, Arc<Font<'static>>>>,
    loaded: AtomicBool,
    // Serializes load attempts so concurrent callers share one.
    gate: tokio::sync::Mutex<()>,
}

impl FontStore {
    pub fn new(dir: impl Into<PathBuf>, manifest: Vec<FontDef>) -> Self {
        Self {
            dir: dir.into(),
            manifest,
            faces: RwLock::new(HashMap::new()),
            loaded: AtomicBool::new(false),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_default_manifest(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, default_manifest())
    }

    pub fn manifest(&self) -> &[FontDef] {
        &self.manifest
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Loads and registers every manifest face, once. Subsequent calls are
    /// no-ops; a failed attempt leaves the store unloaded so callers can
    /// retry after fixing the assets.
    pub async fn ensure_loaded(&self) -> Result<(), FontLoadError> {
        if self.is_loaded() {
            return Ok(());
        }
        let _gate = self.gate.lock().await;
        if self.is_loaded() {
            return Ok(());
        }

        // Unique files, in manifest order.
        let mut files: Vec<&'static str> = Vec::new();
        for d in &self.manifest {
            if !files.contains(&d.file) {
                files.push(d.file);
            }
        }

        // Every file must exist before anything is parsed or registered.
        for &file in &files {
            let path = self.dir.join(file);
            if tokio::fs::metadata(&path).await.is_err() {
                return Err(FontLoadError::Missing {
                    name: self.first_name_for(file).to_string(),
                    path,
                });
            }
        }

        let mut parsed: HashMap<&'static str, Arc<Font<'static>>> = HashMap::new();
        for &file in &files {
            let path = self.dir.join(file);
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| FontLoadError::Io {
                    path: path.clone(),
                    source,
                })?;
            let font =
                Font::try_from_vec(bytes).ok_or_else(|| FontLoadError::Parse { path })?;
            parsed.insert(file, Arc::new(font));
        }

        // Stage the full name table, verify it, then publish atomically so a
        // failure never leaves a partially registered store behind.
        let mut staged: HashMap<String, Arc<Font<'static>>> = HashMap::new();
        for d in &self.manifest {
            staged.insert(d.name.to_string(), Arc::clone(&parsed[d.file]));
        }
        for d in &self.manifest {
            let usable = staged
                .get(d.name)
                .map(|f| f.glyph_count() > 0)
                .unwrap_or(false);
            if !usable {
                return Err(FontLoadError::Unusable {
                    name: d.name.to_string(),
                    path: self.dir.join(d.file),
                });
            }
        }

        *self.faces.write() = staged;
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Registered face for a logical name. Only valid after `ensure_loaded`.
    pub fn face(&self, name: &str) -> Result<Arc<Font<'static>>, FontLoadError> {
        self.faces
            .read()
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| FontLoadError::Unregistered(name.to_string()))
    }

    /// Logical font name for a render: the style-specific name when the
    /// manifest carries one, else the layout's family override, else the
    /// shared base face.
    pub fn resolve_name(
        &self,
        emirate: &str,
        style: PlateStyle,
        layout_family: Option<&'static str>,
    ) -> &'static str {
        if style != PlateStyle::Private {
            let styled = format!("PlateFont_{}_{}", emirate, style.as_str());
            if let Some(d) = self.manifest.iter().find(|d| d.name == styled) {
                return d.name;
            }
        }
        if let Some(family) = layout_family {
            if self.manifest.iter().any(|d| d.name == family) {
                return family;
            }
        }
        BASE_FONT
    }

    /// Drops all registered faces and the loaded flag. Test hook.
    pub fn reset(&self) {
        self.loaded.store(false, Ordering::Release);
        self.faces.write().clear();
    }

    fn first_name_for(&self, file: &str) -> &'static str {
        self.manifest
            .iter()
            .find(|d| d.file == file)
            .map(|d| d.name)
            .unwrap_or(BASE_FONT)
    }
}

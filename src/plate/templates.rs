//! Blank plate template store.
//!
//! Templates are PNG assets keyed `{emirate}` or `{emirate}_{style}`. Each
//! one is read and decoded at most once per process; concurrent requests for
//! a key share the in-flight load. A failed load is not cached, so a fixed
//! asset becomes visible on the next request.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use image::RgbaImage;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::OnceCell;

use super::PlateStyle;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no plate template \"{key}\" ({path})")]
    Missing { key: String, path: PathBuf },
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode template {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

pub struct TemplateStore {
    dir: PathBuf,
    cells: Mutex<HashMap<String, Arc<OnceCell<Arc<RgbaImage>>>>>,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cells: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template for an emirate/style pair. A missing style-specific asset
    /// falls back to the base `{emirate}` asset; any other failure surfaces.
    pub async fn for_plate(
        &self,
        emirate: &str,
        style: PlateStyle,
    ) -> Result<Arc<RgbaImage>, TemplateError> {
        let key = style.template_key(emirate);
        match self.load(&key).await {
            Err(TemplateError::Missing { .. }) if key != emirate => self.load(emirate).await,
            other => other,
        }
    }

    /// Decoded template for an exact key, memoized for process lifetime.
    pub async fn load(&self, key: &str) -> Result<Arc<RgbaImage>, TemplateError> {
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(
                cells
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };
        let img = cell.get_or_try_init(|| self.load_uncached(key)).await?;
        Ok(Arc::clone(img))
    }

    async fn load_uncached(&self, key: &str) -> Result<Arc<RgbaImage>, TemplateError> {
        let path = self.dir.join(format!("{key}.png"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::Missing {
                    key: key.to_string(),
                    path,
                })
            }
            Err(source) => return Err(TemplateError::Io { path, source }),
        };
        let img = image::load_from_memory(&bytes)
            .map_err(|source| TemplateError::Decode { path, source })?
            .to_rgba8();
        Ok(Arc::new(img))
    }

    /// Drops every decoded template. Test hook.
    pub fn reset(&self) {
        self.cells.lock().clear();
    }
}

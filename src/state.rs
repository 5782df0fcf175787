use std::{path::PathBuf, sync::Arc};

use crate::plate::PlateEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PlateEngine>,
}

impl AppState {
    pub fn from_env() -> Self {
        Self {
            engine: Arc::new(PlateEngine::new(assets_dir())),
        }
    }
}

/// Asset root holding `fonts/` and `plates/`.
///
/// `PLATE_ASSETS_DIR` wins; otherwise `{PROJECT_ROOT}/app/assets`, with the
/// crate manifest dir standing in for PROJECT_ROOT during development.
pub fn assets_dir() -> PathBuf {
    if let Ok(p) = std::env::var("PLATE_ASSETS_DIR") {
        return PathBuf::from(p);
    }
    let root = std::env::var("PROJECT_ROOT")
        .unwrap_or_else(|_| env!("CARGO_MANIFEST_DIR").to_string());
    PathBuf::from(root).join("app").join("assets")
}

//! Rendered-plate cache.
//!
//! Rendering a 4K plate is the expensive step, so finished plates are
//! memoized per `(emirate, code, number, style)` for process lifetime. The
//! key space is bounded by the catalog, so there is no eviction. A per-key
//! async once-cell gives at most one render per key under concurrency; a
//! failed render is never stored and the key stays retryable.

use std::{collections::HashMap, future::Future, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use super::{PlateError, PlateKey, RenderedPlate};

#[derive(Default)]
pub struct RenderCache {
    cells: Mutex<HashMap<PlateKey, Arc<OnceCell<Arc<RenderedPlate>>>>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached plate for `key`, rendering it via `render` on the
    /// first request. Concurrent callers for one key share a single render
    /// and observe the same result.
    pub async fn get_or_render<F, Fut>(
        &self,
        key: &PlateKey,
        render: F,
    ) -> Result<Arc<RenderedPlate>, PlateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<RenderedPlate>, PlateError>>,
    {
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(
                cells
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };
        let plate = cell.get_or_try_init(render).await?;
        Ok(Arc::clone(plate))
    }

    /// Number of plates rendered and retained.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached plate. Test hook.
    pub fn reset(&self) {
        self.cells.lock().clear();
    }
}

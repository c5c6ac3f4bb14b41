pub mod accent;
pub mod config;
pub mod error;
pub mod events;
pub mod layers;
pub mod pool;
pub mod scan;
pub mod selector;
pub mod viewport;
pub mod tasks {
    pub mod rotator;
}

use std::sync::Arc;

use anyhow::{Context, Result};

use config::{Configuration, PoolSource};
use pool::ImagePool;
use scan::ScanOptions;
use selector::Selector;
use viewport::ViewportSource;

/// Load the pool described by `cfg.pool`. Blocking.
pub fn load_pool(cfg: &Configuration) -> Result<ImagePool> {
    match cfg.pool.source()? {
        PoolSource::Manifest(path) => ImagePool::from_manifest_file(path)
            .with_context(|| format!("loading manifest {}", path.display())),
        PoolSource::Library(root) => {
            let opts = ScanOptions {
                recursive: cfg.pool.recursive,
                max_depth: cfg.pool.max_depth,
                extensions: cfg.pool.extensions.clone(),
                exclude: cfg.pool.exclude.clone(),
            };
            scan::scan_library(root, &opts)
                .with_context(|| format!("scanning library {}", root.display()))
        }
    }
}

/// Selector configured from `cfg.rotation`, reading the given viewport.
pub fn build_selector(cfg: &Configuration, viewport: Arc<dyn ViewportSource>) -> Selector {
    Selector::new(viewport, cfg.rotation.orientation_ratio, cfg.rotation.seed)
}

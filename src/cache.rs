use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::domain::{DatasetRecord, DuplicateIdPolicy};
use crate::error::AtlasError;
use crate::images::{ImageMap, resolve_images};
use crate::loader::RecordLoader;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    policy: DuplicateIdPolicy,
}

/// Loaded records keyed by source path and modification time. A changed
/// mtime (or a different path) reloads on the next lookup.
#[derive(Debug, Default)]
pub struct SourceCache {
    entry: Option<(SourceKey, Arc<[DatasetRecord]>)>,
    loads: usize,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        path: &Path,
        policy: DuplicateIdPolicy,
    ) -> Result<Arc<[DatasetRecord]>, AtlasError> {
        let key = SourceKey {
            path: path.to_path_buf(),
            modified: fs::metadata(path).and_then(|meta| meta.modified()).ok(),
            policy,
        };

        if let Some((cached, records)) = &self.entry {
            if *cached == key {
                return Ok(Arc::clone(records));
            }
            debug!(path = %path.display(), "dataset source changed; reloading");
        }

        let records: Arc<[DatasetRecord]> = RecordLoader::load(path, policy)?.into();
        self.loads += 1;
        self.entry = Some((key, Arc::clone(&records)));
        Ok(records)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Number of times the source was actually read.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

/// Robot images resolved once and reused until invalidated.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: Option<Arc<ImageMap>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_resolve(
        &mut self,
        asset_dir: &Path,
        mapping: &BTreeMap<String, String>,
    ) -> Arc<ImageMap> {
        let images = self.images.get_or_insert_with(|| {
            let resolved = resolve_images(
                asset_dir,
                mapping
                    .iter()
                    .map(|(robot, path)| (robot.as_str(), path.as_str())),
            );
            debug!(resolved = resolved.len(), "resolved robot images");
            Arc::new(resolved)
        });
        Arc::clone(images)
    }

    pub fn invalidate(&mut self) {
        self.images = None;
    }
}

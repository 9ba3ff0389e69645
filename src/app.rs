use std::fs;
use std::io::Write;
use std::sync::Arc;

use camino::Utf8Path;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::cache::{ImageCache, SourceCache};
use crate::config::ResolvedConfig;
use crate::domain::DatasetRecord;
use crate::error::AtlasError;
use crate::filter::{FilterOptions, Selection, filter_records};
use crate::graph::{GraphDocument, find_record, project};
use crate::images::ImageMap;
use crate::session::{ClickOutcome, ClickSession, Navigator};
use crate::view::{AtlasSummary, DatasetDetail, TableRow};

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeResult {
    pub output: String,
    pub records: usize,
}

/// One user's view of the atlas: configuration, caches, and click state.
pub struct Atlas<N: Navigator> {
    config: ResolvedConfig,
    sources: SourceCache,
    images: ImageCache,
    session: ClickSession,
    navigator: N,
}

impl<N: Navigator> Atlas<N> {
    pub fn new(config: ResolvedConfig, navigator: N) -> Self {
        Self {
            config,
            sources: SourceCache::new(),
            images: ImageCache::new(),
            session: ClickSession::new(),
            navigator,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn session(&self) -> &ClickSession {
        &self.session
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// All records of the configured source, reloaded when the file changes.
    pub fn records(&mut self) -> Result<Arc<[DatasetRecord]>, AtlasError> {
        self.sources.get_or_load(
            self.config.source.as_std_path(),
            self.config.duplicate_ids,
        )
    }

    pub fn images(&mut self) -> Arc<ImageMap> {
        self.images
            .get_or_resolve(self.config.asset_dir.as_std_path(), &self.config.robot_images)
    }

    pub fn options(&mut self) -> Result<FilterOptions, AtlasError> {
        let records = self.records()?;
        Ok(FilterOptions::from_records(&records))
    }

    /// Selection from user input; empty lists select everything.
    pub fn select(
        &mut self,
        robots: &[String],
        environments: &[String],
    ) -> Result<Selection, AtlasError> {
        let options = self.options()?;
        Ok(Selection::from_requested(&options, robots, environments))
    }

    pub fn summary(&mut self, selection: &Selection) -> Result<AtlasSummary, AtlasError> {
        let records = self.records()?;
        let options = FilterOptions::from_records(&records);
        let shown = filter_records(&records, selection).len();
        let robot_images = self.images().len();
        Ok(AtlasSummary {
            total: records.len(),
            shown,
            robots: options.robots.len(),
            environments: options.environments.len(),
            robot_images,
        })
    }

    pub fn graph(&mut self, selection: &Selection) -> Result<GraphDocument, AtlasError> {
        let records = self.records()?;
        let images = self.images();
        let filtered = filter_records(&records, selection);
        let graph = project(filtered, &images);
        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "projected atlas graph"
        );
        Ok(GraphDocument::new(graph))
    }

    pub fn table(&mut self, selection: &Selection) -> Result<Vec<TableRow>, AtlasError> {
        let records = self.records()?;
        Ok(filter_records(&records, selection)
            .into_iter()
            .map(TableRow::from_record)
            .collect())
    }

    /// Feeds a renderer click into the session. Lookup always runs against the
    /// unfiltered records.
    pub fn click(&mut self, node_id: Option<&str>) -> Result<ClickOutcome, AtlasError> {
        let records = self.records()?;
        Ok(self
            .session
            .handle_click(node_id, &records, &self.navigator))
    }

    pub fn detail(&mut self, node_id: &str) -> Result<DatasetDetail, AtlasError> {
        let records = self.records()?;
        find_record(&records, node_id)
            .map(DatasetDetail::from_record)
            .ok_or_else(|| AtlasError::DatasetNotFound(node_id.to_string()))
    }

    /// Opens the dataset URL regardless of click history.
    pub fn open(&mut self, node_id: &str) -> Result<(), AtlasError> {
        let detail = self.detail(node_id)?;
        let url = detail
            .url
            .ok_or_else(|| AtlasError::MissingUrl(node_id.to_string()))?;
        self.navigator.open(&url)
    }

    /// Writes the normalized records as a JSON array that the JSON loader
    /// reads back unchanged.
    pub fn normalize(&mut self, output: &Utf8Path) -> Result<NormalizeResult, AtlasError> {
        let records = self.records()?;
        let content = serde_json::to_vec_pretty(&*records)
            .map_err(|err| AtlasError::Output(err.to_string()))?;
        write_atomic(output, &content)?;
        info!(output = %output, records = records.len(), "wrote normalized datasets");
        Ok(NormalizeResult {
            output: output.to_string(),
            records: records.len(),
        })
    }

    /// Drops cached records and images so the next call rereads them.
    pub fn reload(&mut self) {
        self.sources.invalidate();
        self.images.invalidate();
    }
}

fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), AtlasError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| AtlasError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("robodata-atlas")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| AtlasError::Filesystem(err.to_string()))?;
    write_all(&mut temp, content)?;
    temp.persist(path.as_std_path())
        .map_err(|err| AtlasError::Filesystem(err.to_string()))?;
    Ok(())
}

fn write_all(temp: &mut NamedTempFile, content: &[u8]) -> Result<(), AtlasError> {
    temp.write_all(content)
        .and_then(|_| temp.write_all(b"\n"))
        .and_then(|_| temp.flush())
        .map_err(|err| AtlasError::Filesystem(err.to_string()))
}

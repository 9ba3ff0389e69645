use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info, warn};

use crate::domain::DatasetRecord;
use crate::error::AtlasError;
use crate::graph::find_record;
use crate::view::DatasetDetail;

/// Opens a dataset URL outside the atlas, e.g. in a browser.
pub trait Navigator {
    fn open(&self, url: &str) -> Result<(), AtlasError>;
}

impl<N: Navigator + ?Sized> Navigator for Box<N> {
    fn open(&self, url: &str) -> Result<(), AtlasError> {
        (**self).open(url)
    }
}

/// Picks the platform opener when one is installed and falls back to
/// logging the URL otherwise.
pub fn default_navigator() -> Box<dyn Navigator> {
    let system = SystemNavigator::new();
    if system.is_available() {
        Box::new(system)
    } else {
        warn!("no URL opener found on PATH; dataset links will only be logged");
        Box::new(NoopNavigator)
    }
}

/// Uses the platform URL opener found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemNavigator {
    opener: Option<PathBuf>,
}

impl SystemNavigator {
    pub fn new() -> Self {
        let candidate = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "cmd"
        } else {
            "xdg-open"
        };
        Self {
            opener: find_in_path(candidate),
        }
    }

    pub fn is_available(&self) -> bool {
        self.opener.is_some()
    }
}

impl Default for SystemNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for SystemNavigator {
    fn open(&self, url: &str) -> Result<(), AtlasError> {
        let opener = self
            .opener
            .as_ref()
            .ok_or_else(|| AtlasError::Navigation("no URL opener found on PATH".to_string()))?;
        let mut cmd = Command::new(opener);
        if cfg!(target_os = "windows") {
            cmd.args(["/C", "start", ""]);
        }
        cmd.arg(url);
        let status = cmd
            .status()
            .map_err(|err| AtlasError::Navigation(err.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(AtlasError::Navigation(format!(
                "{} exited with {status}",
                opener.display()
            )))
        }
    }
}

/// Records the request without leaving the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn open(&self, url: &str) -> Result<(), AtlasError> {
        info!(url, "navigation requested");
        Ok(())
    }
}

/// Per-session click state: the last node the user selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickSession {
    last_clicked: Option<String>,
}

impl ClickSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_clicked(&self) -> Option<&str> {
        self.last_clicked.as_deref()
    }

    /// Handles one click event reported by the renderer. Navigation only
    /// happens when the click differs from the previous one, so re-rendering
    /// the same selection does not reopen the URL.
    pub fn handle_click(
        &mut self,
        clicked: Option<&str>,
        records: &[DatasetRecord],
        navigator: &dyn Navigator,
    ) -> ClickOutcome {
        let Some(clicked) = clicked else {
            return ClickOutcome::default();
        };

        let is_new_click = self.last_clicked.as_deref() != Some(clicked);
        self.last_clicked = Some(clicked.to_string());

        let Some(record) = find_record(records, clicked) else {
            debug!(node = clicked, "clicked node is not a dataset");
            return ClickOutcome {
                is_new_click,
                ..ClickOutcome::default()
            };
        };

        let mut outcome = ClickOutcome {
            detail: Some(DatasetDetail::from_record(record)),
            is_new_click,
            navigated: false,
            navigation_error: None,
        };
        if let Some(url) = record.url.as_deref().filter(|_| is_new_click) {
            match navigator.open(url) {
                Ok(()) => outcome.navigated = true,
                Err(err) => {
                    warn!(url, error = %err, "failed to open dataset URL");
                    outcome.navigation_error = Some(err.to_string());
                }
            }
        }
        outcome
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickOutcome {
    pub detail: Option<DatasetDetail>,
    pub is_new_click: bool,
    pub navigated: bool,
    pub navigation_error: Option<String>,
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let plain = dir.join(name);
        if plain.is_file() {
            return Some(plain);
        }
        let exe = dir.join(format!("{name}.exe"));
        if exe.is_file() {
            return Some(exe);
        }
    }
    None
}

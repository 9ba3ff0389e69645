use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder for the load-bearing categorical fields (robot, environment,
/// format) when the source leaves them blank.
pub const UNKNOWN: &str = "Unknown";

/// Keys written into [`DatasetRecord::stats`] by the TSV loader.
pub mod stat {
    pub const EPISODES: &str = "episodes";
    pub const FILE_SIZE_GB: &str = "file_size_gb";
    pub const LANGUAGE_ANNOTATIONS: &str = "language_annotations";
    pub const HAS_SUBOPTIMAL: &str = "has_suboptimal";
    pub const HAS_CAMERA_CALIBRATION: &str = "has_camera_calibration";
    pub const HAS_PROPRIOCEPTION: &str = "has_proprioception";
    pub const RGB_CAMS: &str = "rgb_cams";
    pub const DEPTH_CAMS: &str = "depth_cams";
    pub const WRIST_CAMS: &str = "wrist_cams";
}

pub type Stats = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hardware: Hardware,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub task_env: TaskEnv,
    #[serde(default)]
    pub engineering: Engineering,
    #[serde(default, deserialize_with = "deserialize_stats")]
    pub stats: Stats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex_reference: Option<String>,
}

impl DatasetRecord {
    pub fn robot(&self) -> &str {
        &self.hardware.robot
    }

    pub fn environment(&self) -> &str {
        &self.task_env.environment
    }

    pub fn format(&self) -> &str {
        &self.engineering.format
    }

    pub fn stat(&self, key: &str) -> Option<&str> {
        self.stats
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hardware {
    pub robot: String,
    pub end_effector: String,
    pub morphology: String,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            robot: UNKNOWN.to_string(),
            end_effector: String::new(),
            morphology: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modality {
    pub sensors: Vec<String>,
    pub viewpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskEnv {
    pub environment: String,
    pub domain: String,
    pub language_labels: bool,
}

impl Default for TaskEnv {
    fn default() -> Self {
        Self {
            environment: UNKNOWN.to_string(),
            domain: String::new(),
            language_labels: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engineering {
    pub format: String,
    pub frequency: String,
}

impl Default for Engineering {
    fn default() -> Self {
        Self {
            format: UNKNOWN.to_string(),
            frequency: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Rgb,
    Depth,
    Proprioception,
    Language,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::Rgb => write!(f, "RGB"),
            Sensor::Depth => write!(f, "Depth"),
            Sensor::Proprioception => write!(f, "Proprioception"),
            Sensor::Language => write!(f, "Language"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewpoint {
    Wrist,
    External,
}

impl fmt::Display for Viewpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viewpoint::Wrist => write!(f, "Wrist"),
            Viewpoint::External => write!(f, "External"),
        }
    }
}

/// What the loader does when two rows derive the same id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateIdPolicy {
    #[default]
    KeepFirst,
    KeepLast,
}

impl fmt::Display for DuplicateIdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateIdPolicy::KeepFirst => write!(f, "keep-first"),
            DuplicateIdPolicy::KeepLast => write!(f, "keep-last"),
        }
    }
}

/// Appends `value` unless it is already present, keeping first-seen order.
pub fn push_unique(list: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !list.contains(&value) {
        list.push(value);
    }
}

// Hand-curated JSON files carry numbers and booleans in `stats`; keep them as text.
fn deserialize_stats<'de, D>(deserializer: D) -> Result<Stats, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::Null => String::new(),
                Value::String(text) => text.trim().to_string(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

//! Turns a raw dataset table into normalized [`DatasetRecord`]s.
//!
//! Two source shapes are accepted:
//!
//! - tab-separated text with a header row (`.tsv`, `.txt`, optionally `.gz`),
//!   reconciled row by row;
//! - a JSON array already shaped like [`DatasetRecord`] (`.json`, optionally
//!   `.gz`), loaded directly and only brought up to the record invariants.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::LazyLock;

use flate2::read::GzDecoder;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::domain::{
    DatasetRecord, DuplicateIdPolicy, Engineering, Hardware, Modality, Sensor, Stats, TaskEnv,
    UNKNOWN, Viewpoint, push_unique, stat,
};
use crate::error::AtlasError;

/// Header names of the tab-separated source.
pub mod column {
    pub const DATASET: &str = "Dataset";
    pub const REGISTERED_NAME: &str = "Registered Dataset Name";
    pub const URL: &str = "Dataset URL";
    pub const ROBOT: &str = "Robot";
    pub const GRIPPER: &str = "Gripper";
    pub const MORPHOLOGY: &str = "Robot Morphology";
    pub const RGB_CAMS: &str = "# RGB Cams";
    pub const DEPTH_CAMS: &str = "# Depth Cams";
    pub const WRIST_CAMS: &str = "# Wrist Cams";
    pub const PROPRIOCEPTION: &str = "Has Proprioception?";
    pub const LANGUAGE: &str = "Language Annotations";
    pub const CONTROL_FREQUENCY: &str = "Control Frequency";
    pub const SCENE_TYPE: &str = "Scene Type";
    pub const COLLECT_METHOD: &str = "Data Collect Method";
    pub const ACTION_SPACE: &str = "Action Space";
    pub const DESCRIPTION: &str = "Description";
    pub const EPISODES: &str = "# Episodes";
    pub const FILE_SIZE: &str = "File Size (GB)";
    pub const SUBOPTIMAL: &str = "Has Suboptimal?";
    pub const CAMERA_CALIBRATION: &str = "Has Camera Calibration?";
    pub const CITATION: &str = "Citation";
    pub const LATEX_REFERENCE: &str = "Latex Reference";
    pub const VERSION: &str = "Version";
}

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Json,
    Tsv,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".json") {
            SourceKind::Json
        } else {
            SourceKind::Tsv
        }
    }
}

/// A data row after column-count reconciliation, exactly header-width long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRow {
    pub fields: Vec<String>,
    pub version: Option<String>,
}

pub struct RecordLoader;

impl RecordLoader {
    /// Loads `path`. A missing file is not an error: it yields no records.
    pub fn load(path: &Path, policy: DuplicateIdPolicy) -> Result<Vec<DatasetRecord>, AtlasError> {
        if !path.exists() {
            warn!(path = %path.display(), "dataset source not found; continuing with no datasets");
            return Ok(Vec::new());
        }

        let kind = SourceKind::from_path(path);
        let reader = open_source(path)?;
        let records = match kind {
            SourceKind::Json => Self::from_json_reader(reader, policy)?,
            SourceKind::Tsv => Self::from_tsv_reader(reader, policy)?,
        };
        info!(
            path = %path.display(),
            kind = ?kind,
            records = records.len(),
            "loaded dataset source"
        );
        Ok(records)
    }

    pub fn from_tsv_reader<R: Read>(
        reader: R,
        policy: DuplicateIdPolicy,
    ) -> Result<Vec<DatasetRecord>, AtlasError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut rows = csv_reader.byte_records();
        let header = match rows.next() {
            Some(row) => row.map_err(|err| AtlasError::SourceParse(err.to_string()))?,
            None => return Ok(Vec::new()),
        };
        let header: Vec<String> = header
            .iter()
            .map(|cell| {
                String::from_utf8_lossy(cell)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();

        let mut records = Vec::new();
        for (index, row) in rows.enumerate() {
            let row = row.map_err(|err| AtlasError::SourceParse(err.to_string()))?;
            let fields: Vec<String> = row
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).into_owned())
                .collect();
            if fields.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let reconciled = reconcile_row(header.len(), fields);
            let mut map: HashMap<&str, &str> = header
                .iter()
                .map(String::as_str)
                .zip(reconciled.fields.iter().map(String::as_str))
                .collect();
            if let Some(version) = reconciled.version.as_deref() {
                map.insert(column::VERSION, version);
            }

            match record_from_fields(&map) {
                Some(record) => records.push(record),
                None => debug!(row = index + 2, "dropping row without a dataset name"),
            }
        }

        Ok(dedup_ids(records, policy))
    }

    pub fn from_json_reader<R: Read>(
        reader: R,
        policy: DuplicateIdPolicy,
    ) -> Result<Vec<DatasetRecord>, AtlasError> {
        let raw: Vec<DatasetRecord> = serde_json::from_reader(reader)
            .map_err(|err| AtlasError::SourceParse(err.to_string()))?;
        let records = raw
            .into_iter()
            .filter_map(|record| {
                let finished = finish_record(record);
                if finished.is_none() {
                    debug!("dropping JSON record without a name");
                }
                finished
            })
            .collect();
        Ok(dedup_ids(records, policy))
    }
}

fn open_source(path: &Path) -> Result<Box<dyn Read>, AtlasError> {
    let file = File::open(path).map_err(|err| AtlasError::SourceRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let reader = BufReader::new(file);
    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gzip {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Fits a raw row to `header_len` columns.
///
/// A row one field too long whose first field looks like a version tag
/// (`v…`) loses that field to `version`. Any remaining overflow is folded
/// into the last column, and short rows are padded with empty strings.
pub fn reconcile_row(header_len: usize, mut fields: Vec<String>) -> ReconciledRow {
    let mut version = None;
    let leading_version = fields
        .first()
        .map(|first| first.trim().to_lowercase().starts_with('v'))
        .unwrap_or(false);
    if fields.len() == header_len + 1 && leading_version {
        version = Some(fields.remove(0).trim().to_string());
    }

    if header_len > 0 && fields.len() > header_len {
        let overflow = fields.split_off(header_len - 1);
        fields.push(overflow.join(" ").trim().to_string());
    }

    fields.resize(header_len, String::new());
    ReconciledRow { fields, version }
}

/// Lowercase, hyphen-delimited identifier; `"dataset"` when nothing survives.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let slug = NON_SLUG.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "dataset".to_string()
    } else {
        slug.to_string()
    }
}

/// Parses a count such as `"3"`, `"1,024"` or `"2.0"`; anything else is zero.
pub fn parse_count(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// `"10"` → `"10 Hz"`, `"10 Hz"` unchanged, blank → `"Unknown"`.
pub fn normalize_frequency(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return UNKNOWN.to_string();
    }
    if raw.to_lowercase().ends_with("hz") {
        raw.to_string()
    } else {
        format!("{raw} Hz")
    }
}

pub fn has_language_annotations(raw: &str) -> bool {
    let value = raw.trim().to_lowercase();
    !value.is_empty() && value != "none" && value != "no"
}

pub fn derive_sensors(rgb: f64, depth: f64, proprioception: &str, language: &str) -> Vec<String> {
    let mut sensors = Vec::new();
    if rgb > 0.0 {
        push_unique(&mut sensors, Sensor::Rgb.to_string());
    }
    if depth > 0.0 {
        push_unique(&mut sensors, Sensor::Depth.to_string());
    }
    if proprioception.trim().eq_ignore_ascii_case("yes") {
        push_unique(&mut sensors, Sensor::Proprioception.to_string());
    }
    if has_language_annotations(language) {
        push_unique(&mut sensors, Sensor::Language.to_string());
    }
    sensors
}

pub fn derive_viewpoints(rgb: f64, depth: f64, wrist: f64) -> Vec<String> {
    let mut viewpoints = Vec::new();
    if wrist > 0.0 {
        push_unique(&mut viewpoints, Viewpoint::Wrist.to_string());
    }
    if rgb > 0.0 || depth > 0.0 {
        push_unique(&mut viewpoints, Viewpoint::External.to_string());
    }
    viewpoints
}

fn record_from_fields(map: &HashMap<&str, &str>) -> Option<DatasetRecord> {
    let field = |name: &str| map.get(name).map(|value| value.trim()).unwrap_or("");

    let name = field(column::DATASET);
    if name.is_empty() {
        return None;
    }

    let registered_name = field(column::REGISTERED_NAME);
    let id = if registered_name.is_empty() {
        slugify(name)
    } else {
        registered_name.to_string()
    };

    let rgb = parse_count(field(column::RGB_CAMS));
    let depth = parse_count(field(column::DEPTH_CAMS));
    let wrist = parse_count(field(column::WRIST_CAMS));
    let proprioception = field(column::PROPRIOCEPTION);
    let language = field(column::LANGUAGE);

    let mut stats = Stats::new();
    for (key, header) in [
        (stat::EPISODES, column::EPISODES),
        (stat::FILE_SIZE_GB, column::FILE_SIZE),
        (stat::LANGUAGE_ANNOTATIONS, column::LANGUAGE),
        (stat::HAS_SUBOPTIMAL, column::SUBOPTIMAL),
        (stat::HAS_CAMERA_CALIBRATION, column::CAMERA_CALIBRATION),
        (stat::HAS_PROPRIOCEPTION, column::PROPRIOCEPTION),
        (stat::RGB_CAMS, column::RGB_CAMS),
        (stat::DEPTH_CAMS, column::DEPTH_CAMS),
        (stat::WRIST_CAMS, column::WRIST_CAMS),
    ] {
        stats.insert(key.to_string(), field(header).to_string());
    }

    Some(DatasetRecord {
        id,
        name: name.to_string(),
        url: non_empty(field(column::URL)),
        description: field(column::DESCRIPTION).to_string(),
        hardware: Hardware {
            robot: or_unknown(field(column::ROBOT)),
            end_effector: field(column::GRIPPER).to_string(),
            morphology: field(column::MORPHOLOGY).to_string(),
        },
        modality: Modality {
            sensors: derive_sensors(rgb, depth, proprioception, language),
            viewpoints: derive_viewpoints(rgb, depth, wrist),
        },
        task_env: TaskEnv {
            environment: or_unknown(field(column::SCENE_TYPE)),
            domain: field(column::COLLECT_METHOD).to_string(),
            language_labels: has_language_annotations(language),
        },
        engineering: Engineering {
            format: or_unknown(field(column::ACTION_SPACE)),
            frequency: normalize_frequency(field(column::CONTROL_FREQUENCY)),
        },
        stats,
        version: non_empty(field(column::VERSION)),
        registered_name: non_empty(registered_name),
        citation: non_empty(field(column::CITATION)),
        latex_reference: non_empty(field(column::LATEX_REFERENCE)),
    })
}

/// Brings a pre-shaped record up to the load invariants.
fn finish_record(mut record: DatasetRecord) -> Option<DatasetRecord> {
    record.name = record.name.trim().to_string();
    if record.name.is_empty() {
        return None;
    }

    record.id = record.id.trim().to_string();
    if record.id.is_empty() {
        record.id = match record.registered_name.as_deref().map(str::trim) {
            Some(registered) if !registered.is_empty() => registered.to_string(),
            _ => slugify(&record.name),
        };
    }

    record.hardware.robot = or_unknown(&record.hardware.robot);
    record.task_env.environment = or_unknown(&record.task_env.environment);
    record.engineering.format = or_unknown(&record.engineering.format);
    if record.engineering.frequency.trim().is_empty() {
        record.engineering.frequency = UNKNOWN.to_string();
    }
    record.url = record.url.as_deref().and_then(|url| non_empty(url.trim()));
    record.version = record.version.as_deref().and_then(|v| non_empty(v.trim()));

    let sensors = std::mem::take(&mut record.modality.sensors);
    for sensor in sensors {
        push_unique(&mut record.modality.sensors, sensor);
    }
    let viewpoints = std::mem::take(&mut record.modality.viewpoints);
    for viewpoint in viewpoints {
        push_unique(&mut record.modality.viewpoints, viewpoint);
    }

    Some(record)
}

fn dedup_ids(records: Vec<DatasetRecord>, policy: DuplicateIdPolicy) -> Vec<DatasetRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<DatasetRecord> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(&record.id) {
            Some(&position) => {
                warn!(id = %record.id, policy = %policy, "duplicate dataset id");
                if policy == DuplicateIdPolicy::KeepLast {
                    kept[position] = record;
                }
            }
            None => {
                positions.insert(record.id.clone(), kept.len());
                kept.push(record);
            }
        }
    }
    kept
}

fn or_unknown(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

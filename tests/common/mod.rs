#![allow(dead_code)]

use std::collections::HashMap;

use robodata_atlas::domain::{DatasetRecord, Engineering, Hardware, TaskEnv};

/// Column order of the sample sheet; `Description` is last so that stray
/// tabs in free text spill into it.
pub const HEADER: &[&str] = &[
    "Dataset",
    "Registered Dataset Name",
    "Dataset URL",
    "Robot",
    "Gripper",
    "Robot Morphology",
    "# RGB Cams",
    "# Depth Cams",
    "# Wrist Cams",
    "Has Proprioception?",
    "Language Annotations",
    "Control Frequency",
    "Scene Type",
    "Data Collect Method",
    "Action Space",
    "# Episodes",
    "File Size (GB)",
    "Has Suboptimal?",
    "Has Camera Calibration?",
    "Citation",
    "Latex Reference",
    "Description",
];

pub fn header_line() -> String {
    HEADER.join("\t")
}

/// A row in header order; unspecified columns are empty.
pub fn row(values: &[(&str, &str)]) -> Vec<String> {
    let values: HashMap<&str, &str> = values.iter().copied().collect();
    HEADER
        .iter()
        .map(|column| values.get(column).copied().unwrap_or("").to_string())
        .collect()
}

pub fn row_line(values: &[(&str, &str)]) -> String {
    row(values).join("\t")
}

pub fn sheet(rows: &[String]) -> String {
    let mut out = header_line();
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

pub fn record(id: &str, robot: &str, environment: &str, format: &str) -> DatasetRecord {
    DatasetRecord {
        id: id.to_string(),
        name: format!("{id} dataset"),
        url: Some(format!("https://example.org/{id}")),
        description: String::new(),
        hardware: Hardware {
            robot: robot.to_string(),
            ..Hardware::default()
        },
        modality: Default::default(),
        task_env: TaskEnv {
            environment: environment.to_string(),
            ..TaskEnv::default()
        },
        engineering: Engineering {
            format: format.to_string(),
            frequency: "10 Hz".to_string(),
        },
        stats: Default::default(),
        version: None,
        registered_name: None,
        citation: None,
        latex_reference: None,
    }
}

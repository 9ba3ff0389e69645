use serde::Serialize;

use crate::domain::{DatasetRecord, Stats};

/// One line of the "All datasets" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Robot")]
    pub robot: String,
    #[serde(rename = "Environment")]
    pub environment: String,
    #[serde(rename = "Format")]
    pub format: String,
    #[serde(rename = "Frequency")]
    pub frequency: String,
    #[serde(rename = "Sensors")]
    pub sensors: String,
    #[serde(rename = "Views")]
    pub views: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl TableRow {
    pub fn from_record(record: &DatasetRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            robot: record.robot().to_string(),
            environment: record.environment().to_string(),
            format: record.format().to_string(),
            frequency: record.engineering.frequency.clone(),
            sensors: record.modality.sensors.join(", "),
            views: record.modality.viewpoints.join(", "),
            url: record.url.clone().unwrap_or_default(),
        }
    }
}

/// The detail panel shown after a dataset node is clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub robot: String,
    pub gripper: String,
    pub sensors: Vec<String>,
    pub views: Vec<String>,
    pub format: String,
    pub frequency: String,
    pub url: Option<String>,
    pub stats: Stats,
}

impl DatasetDetail {
    pub fn from_record(record: &DatasetRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            robot: record.robot().to_string(),
            gripper: record.hardware.end_effector.clone(),
            sensors: record.modality.sensors.clone(),
            views: record.modality.viewpoints.clone(),
            format: record.format().to_string(),
            frequency: record.engineering.frequency.clone(),
            url: record.url.clone(),
            stats: record.stats.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtlasSummary {
    pub total: usize,
    pub shown: usize,
    pub robots: usize,
    pub environments: usize,
    pub robot_images: usize,
}

impl AtlasSummary {
    pub fn headline(&self) -> String {
        format!("Showing {} datasets", self.shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Engineering, Modality};

    #[test]
    fn table_row_joins_tags() {
        let record = DatasetRecord {
            id: "bridge".to_string(),
            name: "Bridge".to_string(),
            url: None,
            description: String::new(),
            hardware: Default::default(),
            modality: Modality {
                sensors: vec!["RGB".to_string(), "Language".to_string()],
                viewpoints: vec!["Wrist".to_string(), "External".to_string()],
            },
            task_env: Default::default(),
            engineering: Engineering {
                format: "RLDS".to_string(),
                frequency: "5 Hz".to_string(),
            },
            stats: Default::default(),
            version: None,
            registered_name: None,
            citation: None,
            latex_reference: None,
        };

        let row = TableRow::from_record(&record);
        assert_eq!(row.sensors, "RGB, Language");
        assert_eq!(row.views, "Wrist, External");
        assert_eq!(row.robot, "Unknown");
        assert_eq!(row.url, "");

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["ID"], "bridge");
        assert_eq!(json["Frequency"], "5 Hz");
    }
}

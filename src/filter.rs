use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use crate::domain::DatasetRecord;

/// Distinct robots and environments across all loaded records, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub robots: Vec<String>,
    pub environments: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[DatasetRecord]) -> Self {
        let robots: BTreeSet<&str> = records.iter().map(DatasetRecord::robot).collect();
        let environments: BTreeSet<&str> =
            records.iter().map(DatasetRecord::environment).collect();
        Self {
            robots: robots.into_iter().map(str::to_string).collect(),
            environments: environments.into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub robots: BTreeSet<String>,
    pub environments: BTreeSet<String>,
}

impl Selection {
    /// Everything selected; the initial state of the atlas.
    pub fn all(options: &FilterOptions) -> Self {
        Self {
            robots: options.robots.iter().cloned().collect(),
            environments: options.environments.iter().cloned().collect(),
        }
    }

    /// Builds a selection from user input, where an empty list means "all".
    /// Values that match no option are kept and reported.
    pub fn from_requested(
        options: &FilterOptions,
        robots: &[String],
        environments: &[String],
    ) -> Self {
        let robots = requested_or_all("robot", &options.robots, robots);
        let environments = requested_or_all("environment", &options.environments, environments);
        Self {
            robots,
            environments,
        }
    }

    pub fn matches(&self, record: &DatasetRecord) -> bool {
        self.robots.contains(record.robot()) && self.environments.contains(record.environment())
    }

    pub fn toggle_robot(&mut self, robot: &str) {
        toggle(&mut self.robots, robot);
    }

    pub fn toggle_environment(&mut self, environment: &str) {
        toggle(&mut self.environments, environment);
    }
}

/// Records matching `selection`, in input order.
pub fn filter_records<'a>(
    records: &'a [DatasetRecord],
    selection: &Selection,
) -> Vec<&'a DatasetRecord> {
    records
        .iter()
        .filter(|record| selection.matches(record))
        .collect()
}

fn requested_or_all(kind: &str, available: &[String], requested: &[String]) -> BTreeSet<String> {
    if requested.is_empty() {
        return available.iter().cloned().collect();
    }
    for value in requested {
        if !available.contains(value) {
            warn!(kind, value = %value, "selected value matches no dataset");
        }
    }
    requested.iter().cloned().collect()
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Hardware, TaskEnv};

    fn record(id: &str, robot: &str, environment: &str) -> DatasetRecord {
        DatasetRecord {
            id: id.to_string(),
            name: id.to_string(),
            url: None,
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
            engineering: Default::default(),
            stats: Default::default(),
            version: None,
            registered_name: None,
            citation: None,
            latex_reference: None,
        }
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        let records = vec![
            record("a", "UR5", "Kitchen"),
            record("b", "Franka", "Tabletop"),
            record("c", "UR5", "Kitchen"),
        ];
        let options = FilterOptions::from_records(&records);
        assert_eq!(options.robots, vec!["Franka", "UR5"]);
        assert_eq!(options.environments, vec!["Kitchen", "Tabletop"]);
    }

    #[test]
    fn toggle_flips_membership() {
        let mut selection = Selection::default();
        selection.toggle_robot("UR5");
        assert!(selection.robots.contains("UR5"));
        selection.toggle_robot("UR5");
        assert!(selection.robots.is_empty());
    }

    #[test]
    fn empty_request_selects_everything() {
        let records = vec![record("a", "UR5", "Kitchen")];
        let options = FilterOptions::from_records(&records);
        let selection = Selection::from_requested(&options, &[], &["Kitchen".to_string()]);
        assert_eq!(selection, Selection::all(&options));
    }
}

mod common;

use std::io::Write;

use assert_matches::assert_matches;
use flate2::Compression;
use flate2::write::GzEncoder;

use robodata_atlas::domain::{DuplicateIdPolicy, UNKNOWN, stat};
use robodata_atlas::error::AtlasError;
use robodata_atlas::loader::RecordLoader;

use common::{HEADER, row, row_line, sheet};

fn load_tsv(text: &str) -> Vec<robodata_atlas::domain::DatasetRecord> {
    RecordLoader::from_tsv_reader(text.as_bytes(), DuplicateIdPolicy::KeepFirst).unwrap()
}

#[test]
fn tsv_row_is_normalized() {
    let text = sheet(&[row_line(&[
        ("Dataset", "RT-1 Robot Data!!"),
        ("Dataset URL", " https://robotics-transformer1.github.io "),
        ("Robot", "Google Robot"),
        ("Gripper", "Default"),
        ("# RGB Cams", "3"),
        ("# Depth Cams", "0"),
        ("# Wrist Cams", "1"),
        ("Has Proprioception?", "Yes"),
        ("Language Annotations", "English"),
        ("Control Frequency", "3"),
        ("Scene Type", "Kitchen"),
        ("Data Collect Method", "Human VR"),
        ("Action Space", "EEF Position"),
        ("# Episodes", "87,212"),
        ("Description", "Mobile manipulation in offices."),
    ])]);

    let records = load_tsv(&text);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, "rt-1-robot-data");
    assert_eq!(record.name, "RT-1 Robot Data!!");
    assert_eq!(
        record.url.as_deref(),
        Some("https://robotics-transformer1.github.io")
    );
    assert_eq!(record.robot(), "Google Robot");
    assert_eq!(record.hardware.end_effector, "Default");
    assert_eq!(
        record.modality.sensors,
        vec!["RGB", "Proprioception", "Language"]
    );
    assert_eq!(record.modality.viewpoints, vec!["Wrist", "External"]);
    assert_eq!(record.environment(), "Kitchen");
    assert_eq!(record.task_env.domain, "Human VR");
    assert!(record.task_env.language_labels);
    assert_eq!(record.format(), "EEF Position");
    assert_eq!(record.engineering.frequency, "3 Hz");
    assert_eq!(record.stat(stat::EPISODES), Some("87,212"));
    assert_eq!(record.stat(stat::LANGUAGE_ANNOTATIONS), Some("English"));
    assert_eq!(record.description, "Mobile manipulation in offices.");
    assert_eq!(record.version, None);
}

#[test]
fn registered_name_wins_over_slug() {
    let text = sheet(&[row_line(&[
        ("Dataset", "Bridge"),
        ("Registered Dataset Name", " bridge_v2 "),
    ])]);
    let records = load_tsv(&text);
    assert_eq!(records[0].id, "bridge_v2");
    assert_eq!(records[0].registered_name.as_deref(), Some("bridge_v2"));
}

#[test]
fn blank_fields_default_to_unknown() {
    let text = sheet(&[row_line(&[("Dataset", "Bare")])]);
    let record = &load_tsv(&text)[0];
    assert_eq!(record.robot(), UNKNOWN);
    assert_eq!(record.environment(), UNKNOWN);
    assert_eq!(record.format(), UNKNOWN);
    assert_eq!(record.engineering.frequency, UNKNOWN);
    assert!(record.modality.sensors.is_empty());
    assert!(record.modality.viewpoints.is_empty());
    assert_eq!(record.url, None);
}

#[test]
fn leading_version_field_is_split_off() {
    let mut fields = vec!["v1.2".to_string()];
    fields.extend(row(&[("Dataset", "Versioned"), ("Robot", "UR5")]));
    let text = sheet(&[fields.join("\t")]);

    let record = &load_tsv(&text)[0];
    assert_eq!(record.version.as_deref(), Some("v1.2"));
    assert_eq!(record.name, "Versioned");
    assert_eq!(record.robot(), "UR5");
}

#[test]
fn overflowing_free_text_is_joined() {
    let mut fields = row(&[("Dataset", "Spill"), ("Description", "pick up")]);
    fields.push("the red".to_string());
    fields.push("block".to_string());
    assert_eq!(fields.len(), HEADER.len() + 2);
    let text = sheet(&[fields.join("\t")]);

    let record = &load_tsv(&text)[0];
    assert_eq!(record.description, "pick up the red block");
    assert_eq!(record.version, None);
}

#[test]
fn short_rows_are_padded() {
    let text = sheet(&["Short\t\thttps://short.example\tUR5".to_string()]);
    let record = &load_tsv(&text)[0];
    assert_eq!(record.name, "Short");
    assert_eq!(record.url.as_deref(), Some("https://short.example"));
    assert_eq!(record.robot(), "UR5");
    assert_eq!(record.description, "");
}

#[test]
fn blank_and_nameless_rows_are_dropped() {
    let text = sheet(&[
        "\t\t\t".to_string(),
        row_line(&[("Robot", "UR5")]),
        row_line(&[("Dataset", "   ")]),
        row_line(&[("Dataset", "Kept")]),
    ]);
    let records = load_tsv(&text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Kept");
}

#[test]
fn duplicate_ids_follow_policy() {
    let text = sheet(&[
        row_line(&[("Dataset", "Same Name"), ("Robot", "First")]),
        row_line(&[("Dataset", "Other")]),
        row_line(&[("Dataset", "Same  Name"), ("Robot", "Second")]),
    ]);

    let first = RecordLoader::from_tsv_reader(text.as_bytes(), DuplicateIdPolicy::KeepFirst)
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].id, "same-name");
    assert_eq!(first[0].robot(), "First");

    let last =
        RecordLoader::from_tsv_reader(text.as_bytes(), DuplicateIdPolicy::KeepLast).unwrap();
    assert_eq!(last.len(), 2);
    assert_eq!(last[0].id, "same-name");
    assert_eq!(last[0].robot(), "Second");
    assert_eq!(last[1].name, "Other");
}

#[test]
fn source_order_is_preserved() {
    let text = sheet(&[
        row_line(&[("Dataset", "Zeta")]),
        row_line(&[("Dataset", "Alpha")]),
        row_line(&[("Dataset", "Mu")]),
    ]);
    let names: Vec<String> = load_tsv(&text).into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Zeta", "Alpha", "Mu"]);
}

#[test]
fn missing_file_yields_no_records() {
    let temp = tempfile::tempdir().unwrap();
    let records = RecordLoader::load(
        &temp.path().join("nope.tsv"),
        DuplicateIdPolicy::KeepFirst,
    )
    .unwrap();
    assert!(records.is_empty());
}

#[test]
fn loading_twice_is_identical() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("datasets.tsv");
    std::fs::write(
        &path,
        sheet(&[
            row_line(&[("Dataset", "A"), ("# RGB Cams", "2")]),
            row_line(&[("Dataset", "B"), ("Control Frequency", "5Hz")]),
        ]),
    )
    .unwrap();

    let first = RecordLoader::load(&path, DuplicateIdPolicy::KeepFirst).unwrap();
    let second = RecordLoader::load(&path, DuplicateIdPolicy::KeepFirst).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[1].engineering.frequency, "5Hz");
}

#[test]
fn gzip_tsv_is_decompressed() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("datasets.tsv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(sheet(&[row_line(&[("Dataset", "Zipped")])]).as_bytes())
        .unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let records = RecordLoader::load(&path, DuplicateIdPolicy::KeepFirst).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "zipped");
}

#[test]
fn json_records_are_brought_to_invariants() {
    let json = r#"[
        {
            "id": "franka_kitchen",
            "name": "Franka Kitchen",
            "url": "https://example.org/fk",
            "hardware": {"robot": "Franka Emika Panda", "end_effector": "Parallel"},
            "modality": {"sensors": ["RGB", "RGB", "Depth"], "viewpoints": ["External"]},
            "task_env": {"environment": "Kitchen"},
            "engineering": {"format": "RLDS", "frequency": "20 Hz"},
            "stats": {"episodes": 566}
        },
        {"name": "No Id Here", "hardware": {"robot": " "}, "url": ""},
        {"id": "nameless"}
    ]"#;

    let records =
        RecordLoader::from_json_reader(json.as_bytes(), DuplicateIdPolicy::KeepFirst).unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].modality.sensors, vec!["RGB", "Depth"]);
    assert_eq!(records[0].stat(stat::EPISODES), Some("566"));
    assert_eq!(records[0].format(), "RLDS");

    assert_eq!(records[1].id, "no-id-here");
    assert_eq!(records[1].robot(), UNKNOWN);
    assert_eq!(records[1].environment(), UNKNOWN);
    assert_eq!(records[1].url, None);
}

#[test]
fn invalid_json_is_reported() {
    let err = RecordLoader::from_json_reader("{not json".as_bytes(), DuplicateIdPolicy::KeepFirst)
        .unwrap_err();
    assert_matches!(err, AtlasError::SourceParse(_));
}

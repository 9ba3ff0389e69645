mod common;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::time::{Duration, SystemTime};

use robodata_atlas::cache::{ImageCache, SourceCache};
use robodata_atlas::domain::DuplicateIdPolicy;

use common::{row_line, sheet};

fn touch(path: &std::path::Path, modified: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

#[test]
fn unchanged_source_is_read_once() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("datasets.tsv");
    fs::write(&path, sheet(&[row_line(&[("Dataset", "One")])])).unwrap();

    let mut cache = SourceCache::new();
    let first = cache.get_or_load(&path, DuplicateIdPolicy::KeepFirst).unwrap();
    let second = cache.get_or_load(&path, DuplicateIdPolicy::KeepFirst).unwrap();

    assert_eq!(cache.loads(), 1);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn modified_source_is_reloaded() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("datasets.tsv");
    let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    fs::write(&path, sheet(&[row_line(&[("Dataset", "One")])])).unwrap();
    touch(&path, start);
    let mut cache = SourceCache::new();
    assert_eq!(
        cache
            .get_or_load(&path, DuplicateIdPolicy::KeepFirst)
            .unwrap()
            .len(),
        1
    );

    fs::write(
        &path,
        sheet(&[
            row_line(&[("Dataset", "One")]),
            row_line(&[("Dataset", "Two")]),
        ]),
    )
    .unwrap();
    touch(&path, start + Duration::from_secs(60));

    let reloaded = cache.get_or_load(&path, DuplicateIdPolicy::KeepFirst).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(cache.loads(), 2);
}

#[test]
fn policy_change_and_invalidate_reload() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("datasets.tsv");
    fs::write(&path, sheet(&[row_line(&[("Dataset", "One")])])).unwrap();

    let mut cache = SourceCache::new();
    cache.get_or_load(&path, DuplicateIdPolicy::KeepFirst).unwrap();
    cache.get_or_load(&path, DuplicateIdPolicy::KeepLast).unwrap();
    assert_eq!(cache.loads(), 2);

    cache.invalidate();
    cache.get_or_load(&path, DuplicateIdPolicy::KeepLast).unwrap();
    assert_eq!(cache.loads(), 3);
}

#[test]
fn images_resolve_once_until_invalidated() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("ur5.png"), b"first").unwrap();
    let mapping = BTreeMap::from([("UR5".to_string(), "ur5.png".to_string())]);

    let mut cache = ImageCache::new();
    let first = cache.get_or_resolve(temp.path(), &mapping);
    assert_eq!(first["UR5"].byte_len, 5);

    fs::write(temp.path().join("ur5.png"), b"second").unwrap();
    let cached = cache.get_or_resolve(temp.path(), &mapping);
    assert_eq!(cached["UR5"].byte_len, 5);

    cache.invalidate();
    let fresh = cache.get_or_resolve(temp.path(), &mapping);
    assert_eq!(fresh["UR5"].byte_len, 6);
}

use std::path::{Path, PathBuf};

use dupedirs_core::path::{is_ancestor, is_hidden};
use dupedirs_core::{
    DirectoriesConfig, FileRecord, FolderRecord, FsConfig, RootError, RootSet, ScanState,
    StateStore, resolve_state,
};

fn roots(paths: &[&str]) -> RootSet {
    let mut set = RootSet::new();
    for path in paths {
        set.add(*path).unwrap();
    }
    set
}

#[test]
fn test_scan_state_values() {
    assert_eq!(ScanState::default(), ScanState::Normal);
    assert_eq!(ScanState::Reference.to_string(), "reference");
    assert_eq!(ScanState::Excluded.value(), 2);
    assert_eq!(ScanState::from_value(1), Some(ScanState::Reference));
}

#[test]
fn test_root_that_subsumes_several_roots() {
    let mut set = roots(&["/home/a", "/srv", "/home/b/c", "/home/b/d"]);

    let evicted = set.add("/home").unwrap();
    assert_eq!(evicted.len(), 3);
    let remaining: Vec<_> = set.iter().collect();
    assert_eq!(remaining, vec![Path::new("/srv"), Path::new("/home")]);

    for a in set.iter() {
        for b in set.iter() {
            assert!(!is_ancestor(a, b));
        }
    }
}

#[test]
fn test_rejected_add_leaves_set_untouched() {
    let mut set = roots(&["/a", "/b"]);
    let before = set.clone();

    for path in ["/a", "/a/x", "/b/y/z"] {
        let err = set.add(path).unwrap_err();
        assert!(matches!(err, RootError::AlreadyPresent { .. }));
        assert_eq!(set, before);
    }
}

#[test]
fn test_resolution_priority() {
    let roots = roots(&["/data"]);
    let config = DirectoriesConfig::builder()
        .excluded_paths(vec![PathBuf::from("/data/tmp")])
        .build()
        .unwrap();
    let mut store = StateStore::new();
    store.set(Path::new("/data"), ScanState::Reference, &roots, &config);

    let resolve = |path: &str, store: &StateStore| {
        resolve_state(Path::new(path), &roots, store, &config)
    };

    assert_eq!(resolve("/data/docs", &store), ScanState::Reference);
    assert_eq!(resolve("/data/tmp", &store), ScanState::Excluded);
    assert_eq!(resolve("/data/tmp/x", &store), ScanState::Excluded);
    assert_eq!(resolve("/data/.cache", &store), ScanState::Excluded);

    store.set(Path::new("/data/tmp"), ScanState::Normal, &roots, &config);
    assert_eq!(resolve("/data/tmp/x", &store), ScanState::Normal);
    assert!(store.has_override(Path::new("/data/tmp")));
}

#[test]
fn test_hidden_prefix_is_configurable() {
    let roots = roots(&["/data"]);
    let config = DirectoriesConfig::builder()
        .hidden_prefix('_')
        .build()
        .unwrap();
    let store = StateStore::new();

    assert!(is_hidden(Path::new("/data/_build"), '_'));
    assert_eq!(
        resolve_state(Path::new("/data/_build"), &roots, &store, &config),
        ScanState::Excluded
    );
    assert_eq!(
        resolve_state(Path::new("/data/.git"), &roots, &store, &config),
        ScanState::Normal
    );
}

#[test]
fn test_overrides_iterate_in_insertion_order() {
    let roots = roots(&["/data"]);
    let config = DirectoriesConfig::default();
    let mut store = StateStore::new();
    store.set(Path::new("/data/z"), ScanState::Excluded, &roots, &config);
    store.set(Path::new("/data/a"), ScanState::Reference, &roots, &config);

    let entries: Vec<_> = store.iter().collect();
    assert_eq!(
        entries,
        vec![
            (Path::new("/data/z"), ScanState::Excluded),
            (Path::new("/data/a"), ScanState::Reference),
        ]
    );
}

#[test]
fn test_records() {
    let file = FileRecord::new("/data/photo.jpg", 2048).into_bundle();
    assert_eq!(file.name.as_str(), "photo.jpg");
    assert_eq!(file.size, 2048);
    assert!(file.is_bundle);
    assert!(file.modified.is_none());

    let folder = FolderRecord::new("/data/docs", true);
    assert_eq!(folder.name.as_str(), "docs");
    assert!(folder.is_reference);
}

#[test]
fn test_fs_config_defaults() {
    let config = FsConfig::default();
    assert_eq!(config.min_size, 0);
    assert!(config.max_size.is_none());
    assert!(config.exclude_patterns.is_empty());
    assert!(config.bundle_extensions.is_empty());
}

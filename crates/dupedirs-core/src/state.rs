//! Scan states, sparse overrides and state resolution.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::DirectoriesConfig;
use crate::path::is_ancestor;
use crate::roots::RootSet;

/// How a directory tree takes part in a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    /// Files are scanned and may be deleted.
    #[default]
    Normal,
    /// Files are scanned as a baseline and never deleted.
    Reference,
    /// The tree is left out.
    Excluded,
}

impl ScanState {
    /// Integer value used in the persisted state document.
    pub fn value(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Reference => 1,
            Self::Excluded => 2,
        }
    }

    /// Parse a persisted integer value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Reference),
            2 => Some(Self::Excluded),
            _ => None,
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Reference => "reference",
            Self::Excluded => "excluded",
        };
        f.pad(name)
    }
}

/// Explicit per-path states.
///
/// An entry only exists where it changes what [`resolve_state`] would
/// otherwise return; [`StateStore::set`] maintains this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateStore {
    overrides: IndexMap<PathBuf, ScanState>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The override stored for exactly `path`.
    pub fn get(&self, path: &Path) -> Option<ScanState> {
        self.overrides.get(path).copied()
    }

    /// Check if `path` has an override.
    pub fn has_override(&self, path: &Path) -> bool {
        self.overrides.contains_key(path)
    }

    /// Check if `path` or anything under it has an override.
    pub fn has_override_under(&self, path: &Path) -> bool {
        self.overrides.keys().any(|p| p.starts_with(path))
    }

    /// Set the state of `path`, storing an override only when needed.
    ///
    /// Overrides under `path` that the change made redundant are dropped.
    pub fn set(
        &mut self,
        path: &Path,
        state: ScanState,
        roots: &RootSet,
        config: &DirectoriesConfig,
    ) {
        if resolve_state(path, roots, self, config) == state {
            return;
        }
        if inherited_state(path, roots, self, config) == state {
            self.overrides.shift_remove(path);
        } else {
            self.overrides.insert(path.to_path_buf(), state);
        }

        let redundant: Vec<PathBuf> = self
            .overrides
            .iter()
            .filter(|(p, s)| {
                is_ancestor(path, p) && inherited_state(p, roots, self, config) == **s
            })
            .map(|(p, _)| p.clone())
            .collect();
        for p in redundant {
            self.overrides.shift_remove(&p);
        }
    }

    /// Remove the override for `path`.
    pub fn remove(&mut self, path: &Path) -> Option<ScanState> {
        self.overrides.shift_remove(path)
    }

    /// Iterate overrides in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, ScanState)> {
        self.overrides.iter().map(|(p, s)| (p.as_path(), *s))
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Check if there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Remove all overrides.
    pub fn clear(&mut self) {
        self.overrides.clear();
    }
}

/// Resolve the effective state of `path`.
///
/// Priority: explicit override, then the config's default for the path,
/// then the parent's state while the parent is covered by `roots`, then
/// [`ScanState::Normal`].
pub fn resolve_state(
    path: &Path,
    roots: &RootSet,
    overrides: &StateStore,
    config: &DirectoriesConfig,
) -> ScanState {
    let mut current = path;
    loop {
        if let Some(state) = overrides.get(current) {
            return state;
        }
        if let Some(state) = config.default_state(current) {
            return state;
        }
        match current.parent() {
            Some(parent) if roots.contains(parent) => current = parent,
            _ => return ScanState::Normal,
        }
    }
}

/// The state `path` would have without its own override.
fn inherited_state(
    path: &Path,
    roots: &RootSet,
    overrides: &StateStore,
    config: &DirectoriesConfig,
) -> ScanState {
    if let Some(state) = config.default_state(path) {
        return state;
    }
    match path.parent() {
        Some(parent) if roots.contains(parent) => resolve_state(parent, roots, overrides, config),
        _ => ScanState::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (RootSet, StateStore, DirectoriesConfig) {
        let mut roots = RootSet::new();
        roots.add("/data").unwrap();
        (roots, StateStore::new(), DirectoriesConfig::default())
    }

    #[test]
    fn test_value_conversion() {
        for state in [ScanState::Normal, ScanState::Reference, ScanState::Excluded] {
            assert_eq!(ScanState::from_value(state.value()), Some(state));
        }
        assert_eq!(ScanState::from_value(3), None);
    }

    #[test]
    fn test_default_resolution() {
        let (roots, store, config) = setup();
        assert_eq!(
            resolve_state(Path::new("/data/docs"), &roots, &store, &config),
            ScanState::Normal
        );
        assert_eq!(
            resolve_state(Path::new("/data/.git"), &roots, &store, &config),
            ScanState::Excluded
        );
        assert_eq!(
            resolve_state(Path::new("/elsewhere"), &roots, &store, &config),
            ScanState::Normal
        );
    }

    #[test]
    fn test_inheritance_from_root() {
        let (roots, mut store, config) = setup();
        store.set(Path::new("/data"), ScanState::Reference, &roots, &config);

        assert_eq!(
            resolve_state(Path::new("/data/a/b/c"), &roots, &store, &config),
            ScanState::Reference
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_type_default_beats_inheritance() {
        let (roots, mut store, config) = setup();
        store.set(Path::new("/data"), ScanState::Reference, &roots, &config);

        assert_eq!(
            resolve_state(Path::new("/data/.hidden"), &roots, &store, &config),
            ScanState::Excluded
        );
        assert_eq!(
            resolve_state(Path::new("/data/.hidden/sub"), &roots, &store, &config),
            ScanState::Excluded
        );

        store.set(Path::new("/data/.hidden"), ScanState::Reference, &roots, &config);
        assert_eq!(
            resolve_state(Path::new("/data/.hidden/sub"), &roots, &store, &config),
            ScanState::Reference
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_inheritance_stops_outside_roots() {
        let (roots, mut store, config) = setup();
        store.set(Path::new("/"), ScanState::Reference, &roots, &config);

        assert_eq!(
            resolve_state(Path::new("/data"), &roots, &store, &config),
            ScanState::Normal
        );
    }

    #[test]
    fn test_redundant_set_is_noop() {
        let (roots, mut store, config) = setup();
        store.set(Path::new("/data/a"), ScanState::Excluded, &roots, &config);
        let before = store.clone();

        for path in ["/data", "/data/a", "/data/a/b", "/data/.git", "/data/b"] {
            let path = Path::new(path);
            let state = resolve_state(path, &roots, &store, &config);
            store.set(path, state, &roots, &config);
            assert_eq!(store, before);
        }
    }

    #[test]
    fn test_set_back_to_inherited_removes_override() {
        let (roots, mut store, config) = setup();
        let docs = Path::new("/data/docs");

        store.set(docs, ScanState::Reference, &roots, &config);
        assert!(store.has_override(docs));

        store.set(docs, ScanState::Normal, &roots, &config);
        assert!(!store.has_override(docs));
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_replaces_override() {
        let (roots, mut store, config) = setup();
        let docs = Path::new("/data/docs");

        store.set(docs, ScanState::Reference, &roots, &config);
        store.set(docs, ScanState::Excluded, &roots, &config);
        assert_eq!(store.get(docs), Some(ScanState::Excluded));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sparsity_invariant() {
        let (roots, mut store, config) = setup();
        let ops = [
            ("/data", ScanState::Reference),
            ("/data/a", ScanState::Excluded),
            ("/data/a/b", ScanState::Reference),
            ("/data/.git", ScanState::Normal),
            ("/data/a", ScanState::Reference),
            ("/data/.git", ScanState::Excluded),
        ];
        for (path, state) in ops {
            store.set(Path::new(path), state, &roots, &config);
            assert_eq!(resolve_state(Path::new(path), &roots, &store, &config), state);

            for (p, s) in store.clone().iter() {
                let mut without = store.clone();
                without.remove(p);
                assert_ne!(resolve_state(p, &roots, &without, &config), s);
            }
        }
    }

    #[test]
    fn test_set_drops_overrides_made_redundant() {
        let (roots, mut store, config) = setup();
        store.set(Path::new("/data/a"), ScanState::Excluded, &roots, &config);
        store.set(Path::new("/data/a/b"), ScanState::Reference, &roots, &config);
        assert_eq!(store.len(), 2);

        store.set(Path::new("/data/a"), ScanState::Reference, &roots, &config);
        assert!(!store.has_override(Path::new("/data/a/b")));
        assert_eq!(
            resolve_state(Path::new("/data/a/b"), &roots, &store, &config),
            ScanState::Reference
        );
    }

    #[test]
    fn test_has_override_under() {
        let (roots, mut store, config) = setup();
        store.set(Path::new("/data/a/b/c"), ScanState::Reference, &roots, &config);

        assert!(store.has_override_under(Path::new("/data/a")));
        assert!(store.has_override_under(Path::new("/data/a/b/c")));
        assert!(!store.has_override_under(Path::new("/data/a/b/c/d")));
        assert!(!store.has_override_under(Path::new("/data/ab")));
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `flags.rs`

#[cfg(test)]
mod tests {
    use crate::errors::StateError;
    use crate::flags::{default_state_path, FlagStore};
    use std::path::Path;

    fn state_path(dir: &Path) -> std::path::PathBuf {
        default_state_path(dir)
    }

    #[test]
    fn test_set_then_is_set() {
        let mut store = FlagStore::in_memory();
        assert!(!store.is_set("installed"));

        assert!(store.set("installed").unwrap());
        assert!(store.is_set("installed"));
    }

    #[test]
    fn test_set_twice_is_noop() {
        let mut store = FlagStore::in_memory();
        assert!(store.set("installed").unwrap());
        assert!(!store.set("installed").unwrap());
        assert_eq!(store.flags().len(), 1);
    }

    #[test]
    fn test_clear_of_absent_flag_is_noop() {
        let mut store = FlagStore::in_memory();
        assert!(!store.clear("db.synched").unwrap());
        assert!(!store.is_set("db.synched"));
    }

    #[test]
    fn test_round_trip_through_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(dir.path());

        {
            let mut store = FlagStore::open(&path).unwrap();
            store.set("installed").unwrap();
            store.set("base-config.rendered").unwrap();
            store.set("db.synched").unwrap();
            store.clear("base-config.rendered").unwrap();
        }

        let reopened = FlagStore::open(&path).unwrap();
        assert!(reopened.is_set("installed"));
        assert!(reopened.is_set("db.synched"));
        assert!(!reopened.is_set("base-config.rendered"));
        assert!(reopened.document().updated_at.is_some());
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlagStore::open(state_path(dir.path())).unwrap();
        assert!(store.flags().is_empty());
        assert!(store.config_hash().is_none());
    }

    #[test]
    fn test_noop_set_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(dir.path());

        let mut store = FlagStore::open(&path).unwrap();
        store.clear("installed").unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let err = FlagStore::open(&path).unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }));
    }

    #[test]
    fn test_file_and_config_hashes_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(dir.path());

        {
            let mut store = FlagStore::open(&path).unwrap();
            store
                .record_file_hashes([("/etc/designate/pools.yaml".to_string(), "abc".to_string())])
                .unwrap();
            store.record_config_hash("cfg1").unwrap();
        }

        let store = FlagStore::open(&path).unwrap();
        assert_eq!(store.file_hash("/etc/designate/pools.yaml"), Some("abc"));
        assert_eq!(store.file_hash("/etc/designate/other"), None);
        assert_eq!(store.config_hash(), Some("cfg1"));
    }

    #[test]
    fn test_installed_release_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(dir.path());

        FlagStore::open(&path)
            .unwrap()
            .record_installed_release("liberty")
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["installedRelease"], "liberty");
        assert_eq!(
            FlagStore::open(&path).unwrap().installed_release(),
            Some("liberty")
        );
    }

    #[test]
    fn test_document_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(dir.path());

        let mut store = FlagStore::open(&path).unwrap();
        store.set("installed").unwrap();
        store.record_config_hash("cfg").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["flags"][0], "installed");
        assert_eq!(raw["configHash"], "cfg");
        assert!(raw.get("fileHashes").is_some());
    }
}

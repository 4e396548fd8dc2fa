// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `release.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_release_from_origin() {
        assert_eq!(release_from_origin("distro"), None);
        assert_eq!(
            release_from_origin("cloud:trusty-liberty").as_deref(),
            Some("liberty")
        );
        assert_eq!(
            release_from_origin("cloud:trusty-mitaka/proposed").as_deref(),
            Some("mitaka")
        );
        assert_eq!(
            release_from_origin("cloud:trusty-updates/mitaka").as_deref(),
            Some("mitaka")
        );
        assert_eq!(release_from_origin("ppa:someone/designate"), None);
    }

    #[test]
    fn test_select_profiles() {
        assert_eq!(select("distro").unwrap().name, "mitaka");
        let liberty = select("cloud:trusty-liberty").unwrap();
        assert!(!liberty.services.contains(&"designate-zone-manager"));
        assert!(select("cloud:trusty-mitaka")
            .unwrap()
            .packages
            .contains(&"designate-zone-manager"));
    }

    #[test]
    fn test_select_unsupported() {
        let err = select("cloud:xenial-queens").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnsupportedRelease {
                release: "queens".to_string(),
                origin: "cloud:xenial-queens".to_string(),
            }
        );
    }

    #[test]
    fn test_cloud_archive_source() {
        assert_eq!(cloud_archive_source("distro"), None);
        assert_eq!(
            cloud_archive_source("cloud:trusty-mitaka").as_deref(),
            Some("cloud-archive:mitaka")
        );
        assert_eq!(
            cloud_archive_source("cloud:trusty-mitaka/proposed").as_deref(),
            Some("cloud-archive:mitaka-proposed")
        );
    }
}

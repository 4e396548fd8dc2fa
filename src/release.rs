// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-release differences as data.
//!
//! The OpenStack release is derived once from `openstack-origin` and selects a
//! [`ReleaseProfile`]; nothing else in the charm branches on release names.

use crate::errors::ConfigError;

/// Packages, services and package source for one OpenStack release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseProfile {
    pub name: &'static str,
    /// Packages installed by the install handler
    pub packages: &'static [&'static str],
    /// Services restarted when their configuration changes
    pub services: &'static [&'static str],
}

/// Release used when the origin does not name one (`distro`, PPAs, raw deb lines).
pub const DISTRO_RELEASE: &str = "mitaka";

const LIBERTY_PACKAGES: &[&str] = &[
    "designate-agent",
    "designate-api",
    "designate-central",
    "designate-common",
    "designate-mdns",
    "designate-pool-manager",
    "designate-sink",
    "bind9utils",
    "python-apt",
    "haproxy",
    "apache2",
];

const LIBERTY_SERVICES: &[&str] = &[
    "designate-mdns",
    "designate-agent",
    "designate-pool-manager",
    "designate-central",
    "designate-sink",
    "designate-api",
];

// designate-zone-manager first ships with mitaka
const MITAKA_PACKAGES: &[&str] = &[
    "designate-agent",
    "designate-api",
    "designate-central",
    "designate-common",
    "designate-mdns",
    "designate-pool-manager",
    "designate-sink",
    "designate-zone-manager",
    "bind9utils",
    "python-apt",
    "haproxy",
    "apache2",
];

const MITAKA_SERVICES: &[&str] = &[
    "designate-mdns",
    "designate-zone-manager",
    "designate-agent",
    "designate-pool-manager",
    "designate-central",
    "designate-sink",
    "designate-api",
];

/// Every supported release.
pub const RELEASES: &[ReleaseProfile] = &[
    ReleaseProfile {
        name: "liberty",
        packages: LIBERTY_PACKAGES,
        services: LIBERTY_SERVICES,
    },
    ReleaseProfile {
        name: "mitaka",
        packages: MITAKA_PACKAGES,
        services: MITAKA_SERVICES,
    },
];

/// Whether moving from `from` to `to` goes forward in [`RELEASES`].
///
/// Unknown releases never count as an upgrade.
#[must_use]
pub fn is_upgrade(from: &str, to: &str) -> bool {
    let position = |name: &str| RELEASES.iter().position(|profile| profile.name == name);
    matches!((position(from), position(to)), (Some(a), Some(b)) if b > a)
}

/// Release name named by an origin, if any.
///
/// `cloud:trusty-mitaka`, `cloud:trusty-mitaka/proposed` and
/// `cloud:trusty-updates/mitaka` all name `mitaka`.
#[must_use]
pub fn release_from_origin(origin: &str) -> Option<String> {
    let pocket = origin.trim().strip_prefix("cloud:")?;
    let (series_part, suffix) = pocket.split_once('/').unwrap_or((pocket, ""));
    let (_series, release) = series_part.split_once('-')?;

    let release = match release {
        "updates" | "proposed" => suffix,
        other => other,
    };
    (!release.is_empty()).then(|| release.to_string())
}

/// Select the profile for an `openstack-origin` value.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedRelease`] when the origin names a release
/// without a profile.
pub fn select(origin: &str) -> Result<&'static ReleaseProfile, ConfigError> {
    let release = release_from_origin(origin).unwrap_or_else(|| DISTRO_RELEASE.to_string());
    RELEASES
        .iter()
        .find(|profile| profile.name == release)
        .ok_or_else(|| ConfigError::UnsupportedRelease {
            release,
            origin: origin.to_string(),
        })
}

/// Argument for `add-apt-repository` when the origin is a cloud archive pocket.
#[must_use]
pub fn cloud_archive_source(origin: &str) -> Option<String> {
    let pocket = origin.trim().strip_prefix("cloud:")?;
    let (series_part, suffix) = pocket.split_once('/').unwrap_or((pocket, ""));
    let (_series, release) = series_part.split_once('-')?;
    Some(match (release, suffix) {
        ("updates", r) => format!("cloud-archive:{r}"),
        ("proposed", r) => format!("cloud-archive:{r}-proposed"),
        (r, "proposed") => format!("cloud-archive:{r}-proposed"),
        (r, _) => format!("cloud-archive:{r}"),
    })
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod release_tests;

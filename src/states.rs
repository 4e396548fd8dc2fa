// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Flag, relation and leader-setting names shared by every handler.
//!
//! Keeping the names here ensures the handler registry, the actions that set
//! the flags and the status assessment agree on spelling.

// ============================================================================
// Relation Names (as declared in metadata.yaml)
// ============================================================================

/// MySQL/Percona shared database relation
pub const SHARED_DB: &str = "shared-db";

/// RabbitMQ message bus relation
pub const AMQP: &str = "amqp";

/// Keystone identity relation
pub const IDENTITY_SERVICE: &str = "identity-service";

/// Designate-bind DNS backend relation
pub const DNS_BACKEND: &str = "dns-backend";

/// Peer relation between designate units
pub const CLUSTER: &str = "cluster";

/// Subordinate hacluster relation
pub const HA: &str = "ha";

/// Every relation the charm declares, in metadata order
pub const DECLARED_RELATIONS: [&str; 6] =
    [SHARED_DB, AMQP, IDENTITY_SERVICE, DNS_BACKEND, CLUSTER, HA];

/// Relations that must be present before the unit can be active
pub const REQUIRED_RELATIONS: [&str; 4] = [SHARED_DB, AMQP, IDENTITY_SERVICE, DNS_BACKEND];

// ============================================================================
// Relation State Suffixes
// ============================================================================

/// Suffix of the state raised when a remote unit is present
pub const CONNECTED_SUFFIX: &str = ".connected";

/// Suffix of the state raised when the remote side published its full data contract
pub const AVAILABLE_SUFFIX: &str = ".available";

/// Suffix reserved for departed relations
pub const DEPARTED_SUFFIX: &str = ".departed";

// ============================================================================
// Milestone Flags
// ============================================================================

/// Packages are installed
pub const INSTALLED: &str = "installed";

/// Bootstrap configuration has been written
pub const BASE_CONFIG_RENDERED: &str = "base-config.rendered";

/// The leader confirmed the database schema migration
pub const DB_SYNCHED: &str = "db.synched";

/// Initial nameservers and domains exist in Designate
pub const DOMAINS_CREATED: &str = "domains.created";

/// A service restart timed out and must be retried
pub const RESTART_PENDING: &str = "services.restart-pending";

/// Apache terminates TLS in front of designate-api
pub const SSL_ENABLED: &str = "ssl.enabled";

/// Derived (non-persisted) state raised when the charm config changed since the last pass
pub const CONFIG_CHANGED: &str = "config.changed";

/// Milestones reset by a (re)install
pub const DOWNSTREAM_MILESTONES: [&str; 3] = [BASE_CONFIG_RENDERED, DB_SYNCHED, DOMAINS_CREATED];

// ============================================================================
// Leader Settings Keys
// ============================================================================

/// Leader confirmed `designate-manage database sync`
pub const LEADER_DB_SYNC_DONE: &str = "db-sync-done";

/// Leader created the initial servers and domains
pub const LEADER_DOMAIN_INIT_DONE: &str = "domain-init-done";

/// Leader synced the pool manager cache
pub const LEADER_POOL_CACHE_SYNC_DONE: &str = "pool-manager-cache-sync-done";

/// Hash of the pools file last pushed with `designate-manage pool update`
pub const LEADER_POOL_YAML_HASH: &str = "pool-yaml-hash";

// ============================================================================
// Hook Names
// ============================================================================

/// Hook fired on the unit that just became leader
pub const HOOK_LEADER_ELECTED: &str = "leader-elected";

/// Hook fired on followers when leader settings change
pub const HOOK_LEADER_SETTINGS_CHANGED: &str = "leader-settings-changed";

/// Builds the `<relation>.connected` state name.
#[must_use]
pub fn connected(relation: &str) -> String {
    format!("{relation}{CONNECTED_SUFFIX}")
}

/// Builds the `<relation>.available` state name.
#[must_use]
pub fn available(relation: &str) -> String {
    format!("{relation}{AVAILABLE_SUFFIX}")
}

/// If `state` is a relation state (`x.connected`, `x.available`, `x.departed`),
/// returns the relation part.
#[must_use]
pub fn relation_of(state: &str) -> Option<&str> {
    [CONNECTED_SUFFIX, AVAILABLE_SUFFIX, DEPARTED_SUFFIX]
        .iter()
        .find_map(|suffix| state.strip_suffix(suffix))
}

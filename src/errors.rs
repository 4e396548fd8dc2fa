// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the Designate charm.
//!
//! This module provides specialized error types for:
//! - External command execution (hook tools, `designate`, `designate-manage`)
//! - Malformed operator-supplied charm configuration
//! - Handler registry invariants (checked once at startup)
//! - The durable flag store
//! - Designate domain and server management
//! - Leader settings
//!
//! Actions propagate these through `anyhow` with added context; the hook
//! binary inspects them to decide between a blocked status and a failed hook.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from running an external process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The process ran but exited unsuccessfully
    #[error("Command '{command}' failed with {status}: {stderr}")]
    NonZeroExit {
        /// The command line that was executed
        command: String,
        /// Exit status as reported by the OS (e.g., "exit status: 1")
        status: String,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The process did not finish within its bounded timeout and was killed
    #[error("Command '{command}' timed out after {timeout_secs}s")]
    Timeout {
        /// The command line that was executed
        command: String,
        /// Timeout in seconds
        timeout_secs: u64,
    },

    /// The process could not be started at all (missing binary, permissions)
    #[error("Failed to spawn '{command}': {reason}")]
    SpawnFailed {
        /// The command line that was attempted
        command: String,
        /// OS error text
        reason: String,
    },
}

impl CommandError {
    /// Returns true if the command hit its timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors in the operator-supplied charm configuration.
///
/// These surface as a `blocked` workload status and never crash the dispatch loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A `dns-slaves` entry is not an `address:port:key` triplet
    #[error("Invalid dns-slaves entry '{entry}': {reason}")]
    InvalidDnsSlave {
        /// The offending whitespace-separated entry
        entry: String,
        /// What is wrong with it
        reason: String,
    },

    /// `openstack-origin` names a release the charm has no profile for
    #[error("Unsupported OpenStack release '{release}' (from openstack-origin '{origin}')")]
    UnsupportedRelease {
        /// Release name derived from the origin
        release: String,
        /// The configured origin string
        origin: String,
    },

    /// The configuration document could not be decoded
    #[error("Invalid charm configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration
        reason: String,
    },
}

/// Programming-level invariant violations detected while building the handler registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A condition references `<relation>.connected` / `.available` for an undeclared relation
    #[error("Handler '{handler}' references undeclared relation '{relation}'")]
    UndeclaredRelation {
        /// Handler being registered
        handler: String,
        /// The relation name that is not declared
        relation: String,
    },

    /// Two handlers share the same name
    #[error("Handler '{handler}' is registered more than once")]
    DuplicateHandler {
        /// The duplicated handler name
        handler: String,
    },

    /// A handler was registered without any condition
    #[error("Handler '{handler}' has no conditions")]
    EmptyPredicate {
        /// Handler being registered
        handler: String,
    },

    /// A flag condition was given an empty list of names
    #[error("Handler '{handler}' has a condition with no flag names")]
    EmptyCondition {
        /// Handler being registered
        handler: String,
    },
}

/// Errors reading or writing the durable flag store.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file exists but could not be read
    #[error("Failed to read state file {path}: {source}")]
    Read {
        /// State file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The state file is not valid JSON; milestones are never silently reset
    #[error("State file {path} is corrupt: {reason}")]
    Corrupt {
        /// State file path
        path: PathBuf,
        /// What is wrong with the configuration
        reason: String,
    },

    /// The state file could not be written
    #[error("Failed to write state file {path}: {source}")]
    Write {
        /// State file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    /// Copy of this error; I/O sources keep their kind and message.
    #[must_use]
    pub fn detached(&self) -> Self {
        let copy = |e: &std::io::Error| std::io::Error::new(e.kind(), e.to_string());
        match self {
            Self::Read { path, source } => Self::Read {
                path: path.clone(),
                source: copy(source),
            },
            Self::Corrupt { path, reason } => Self::Corrupt {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::Write { path, source } => Self::Write {
                path: path.clone(),
                source: copy(source),
            },
        }
    }
}

/// Errors from the Designate client wrapper.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DesignateError {
    /// `domain-create` returned but the domain is still not listed
    #[error("Domain '{domain}' was not found after creation")]
    DomainNotCreated {
        /// Domain name
        domain: String,
    },

    /// `server-create` returned but the server is still not listed
    #[error("Server '{server}' was not found after creation")]
    ServerNotCreated {
        /// Server name
        server: String,
    },

    /// A line of `-f value` listing output did not have the expected columns
    #[error("Unexpected listing line from designate: '{line}'")]
    MalformedListing {
        /// The unparseable line
        line: String,
    },

    /// The credentials file could not be loaded
    #[error("Failed to load credentials from {path}: {reason}")]
    Credentials {
        /// Path of the rc file
        path: PathBuf,
        /// Reason
        reason: String,
    },

    /// The underlying CLI invocation failed
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors from the leader settings store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaderError {
    /// A follower attempted a leader-only write
    #[error("Cannot set leader setting '{key}': this unit is not the leader")]
    NotLeader {
        /// First key of the rejected write
        key: String,
    },

    /// `leader-get` returned something other than a JSON object of strings
    #[error("Unexpected leader settings document: {reason}")]
    MalformedSettings {
        /// What is wrong with the configuration
        reason: String,
    },

    /// The hook tool invocation failed
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Composite error type covering every charm failure category.
#[derive(Error, Debug)]
pub enum CharmError {
    /// External command failure
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Operator configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Registry invariant violation
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Flag store problem
    #[error(transparent)]
    State(#[from] StateError),

    /// Designate management problem
    #[error(transparent)]
    Designate(#[from] DesignateError),

    /// Leader settings problem
    #[error(transparent)]
    Leader(#[from] LeaderError),
}

impl CharmError {
    /// The first typed charm error in an `anyhow` chain, if any.
    ///
    /// Actions return `anyhow::Error` with context attached; this recovers the
    /// underlying category for reporting.
    #[must_use]
    pub fn from_chain(error: &anyhow::Error) -> Option<Self> {
        error.chain().find_map(|cause| {
            if let Some(e) = cause.downcast_ref::<CommandError>() {
                Some(Self::Command(e.clone()))
            } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
                Some(Self::Config(e.clone()))
            } else if let Some(e) = cause.downcast_ref::<RegistryError>() {
                Some(Self::Registry(e.clone()))
            } else if let Some(e) = cause.downcast_ref::<DesignateError>() {
                Some(Self::Designate(e.clone()))
            } else if let Some(e) = cause.downcast_ref::<LeaderError>() {
                Some(Self::Leader(e.clone()))
            } else {
                cause
                    .downcast_ref::<StateError>()
                    .map(|e| Self::State(e.detached()))
            }
        })
    }

    /// Returns true if this error is transient and the hook should simply be retried.
    ///
    /// Transient errors are external-call failures; the next invocation re-runs the
    /// same milestone because its flag was never set. Configuration and registry
    /// errors need operator or developer action.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Command(_)
            | Self::Designate(
                DesignateError::Command(_)
                | DesignateError::DomainNotCreated { .. }
                | DesignateError::ServerNotCreated { .. },
            )
            | Self::Leader(LeaderError::NotLeader { .. } | LeaderError::Command(_)) => true,

            Self::Config(_)
            | Self::Registry(_)
            | Self::State(_)
            | Self::Designate(
                DesignateError::MalformedListing { .. } | DesignateError::Credentials { .. },
            )
            | Self::Leader(LeaderError::MalformedSettings { .. }) => false,
        }
    }

    /// Returns a short CamelCase reason code for logs and status messages.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Command(CommandError::NonZeroExit { .. }) => "CommandFailed",
            Self::Command(CommandError::Timeout { .. }) => "CommandTimeout",
            Self::Command(CommandError::SpawnFailed { .. }) => "CommandSpawnFailed",

            Self::Config(ConfigError::InvalidDnsSlave { .. }) => "InvalidDnsSlave",
            Self::Config(ConfigError::UnsupportedRelease { .. }) => "UnsupportedRelease",
            Self::Config(ConfigError::InvalidConfig { .. }) => "InvalidConfig",

            Self::Registry(_) => "RegistryInvalid",

            Self::State(StateError::Read { .. }) => "StateReadFailed",
            Self::State(StateError::Corrupt { .. }) => "StateCorrupt",
            Self::State(StateError::Write { .. }) => "StateWriteFailed",

            Self::Designate(DesignateError::DomainNotCreated { .. }) => "DomainNotCreated",
            Self::Designate(DesignateError::ServerNotCreated { .. }) => "ServerNotCreated",
            Self::Designate(DesignateError::MalformedListing { .. }) => "MalformedListing",
            Self::Designate(DesignateError::Credentials { .. }) => "CredentialsUnavailable",
            Self::Designate(DesignateError::Command(_)) => "DesignateCommandFailed",

            Self::Leader(LeaderError::NotLeader { .. }) => "NotLeader",
            Self::Leader(LeaderError::MalformedSettings { .. }) => "LeaderSettingsMalformed",
            Self::Leader(LeaderError::Command(_)) => "LeaderCommandFailed",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;

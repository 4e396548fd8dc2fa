// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line interface of the `designate-charm` binary.
//!
//! Juju runs `hooks/<name>`, a symlink to the binary, with no arguments. The
//! hook name is then taken from the executable name or `JUJU_HOOK_NAME`.
//! Operators can also run `designate-charm hook <name>` by hand, inspect and
//! edit flags, and print the handler registry.

use crate::constants::{CHARM_DIR_ENV, JUJU_HOOK_NAME_ENV};
use crate::dispatcher::FailurePolicy;
use crate::flags::default_state_path;
use crate::hookenv::hook_name_from_argv0;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Name the binary is installed under.
pub const BINARY_NAME: &str = "designate-charm";

#[derive(Debug, Parser)]
#[command(
    name = BINARY_NAME,
    about = "Reactive Juju charm for OpenStack Designate",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Durable flag state (default: $CHARM_DIR/.designate-charm/state.json)
    #[arg(long, global = true, env = "DESIGNATE_CHARM_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Serve relations from a JSON snapshot instead of the hook tools
    #[arg(long, global = true)]
    pub relations_file: Option<PathBuf>,

    /// Render configuration below this directory instead of /
    #[arg(long, global = true, default_value = "/", env = "DESIGNATE_CHARM_ROOT")]
    pub root: PathBuf,

    /// Override the timeout of every external command, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Keep running handlers after one fails
    #[arg(long, global = true)]
    pub keep_going: bool,

    /// Print the dispatch report on stdout
    #[arg(long, global = true, value_enum)]
    pub report: Option<ReportFormat>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one hook invocation
    Hook {
        /// Hook name, e.g. `config-changed`
        name: String,
    },

    /// Inspect or edit persisted flags
    Flags {
        #[command(subcommand)]
        subcommand: FlagsCommand,
    },

    /// List registered handlers and their predicates
    Handlers,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum FlagsCommand {
    /// Print every set flag
    List,
    /// Set a flag
    Set { name: String },
    /// Clear a flag
    Clear { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
}

impl Cli {
    /// Failure policy selected by `--keep-going`.
    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        }
    }

    #[must_use]
    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// State file from `--state-file`, else beneath `charm_dir`.
    #[must_use]
    pub fn state_path(&self, charm_dir: Option<PathBuf>) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| {
            default_state_path(&charm_dir.unwrap_or_else(|| PathBuf::from(".")))
        })
    }

    /// State file resolved against `$CHARM_DIR`.
    #[must_use]
    pub fn state_path_from_env(&self) -> PathBuf {
        self.state_path(std::env::var_os(CHARM_DIR_ENV).map(PathBuf::from))
    }
}

/// Hook to run when no subcommand was given.
///
/// The executable name wins over `JUJU_HOOK_NAME` because Juju always invokes
/// the symlink named after the hook.
#[must_use]
pub fn resolve_hook_name(argv0: Option<&str>, env_hook: Option<String>) -> Option<String> {
    argv0
        .and_then(|a| hook_name_from_argv0(a, BINARY_NAME))
        .or_else(|| env_hook.filter(|h| !h.is_empty()))
}

/// [`resolve_hook_name`] applied to the running process.
#[must_use]
pub fn hook_name_from_env() -> Option<String> {
    let argv0 = std::env::args().next();
    resolve_hook_name(argv0.as_deref(), std::env::var(JUJU_HOOK_NAME_ENV).ok())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Thin async wrappers over the Juju hook tools.
//!
//! Every call goes through the injected [`CommandRunner`], so tests can script
//! the hook tool output instead of needing a Juju agent.

use crate::command::{CommandRunner, CommandSpec};
use crate::constants::HOOK_TOOL_TIMEOUT_SECS;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Juju workload status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkloadStatus {
    Maintenance,
    Waiting,
    Blocked,
    Active,
}

impl WorkloadStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Waiting => "waiting",
            Self::Blocked => "blocked",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hook tool client.
#[derive(Clone)]
pub struct HookTools {
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for HookTools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookTools").finish_non_exhaustive()
    }
}

/// Convert a JSON object of relation or leader settings into strings.
///
/// Juju publishes every value as a string; anything else is stringified so a
/// stray number in a static snapshot does not fail the whole hook.
pub(crate) fn settings_from_json(value: serde_json::Value) -> Option<BTreeMap<String, String>> {
    match value {
        serde_json::Value::Null => Some(BTreeMap::new()),
        serde_json::Value::Object(map) => Some(
            map.into_iter()
                .filter_map(|(k, v)| match v {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(s) => Some((k, s)),
                    other => Some((k, other.to_string())),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Render `key=value` arguments for `relation-set` / `leader-set`.
pub(crate) fn key_value_args(settings: &BTreeMap<String, String>) -> Vec<String> {
    settings.iter().map(|(k, v)| format!("{k}={v}")).collect()
}

impl HookTools {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn tool<I, S>(&self, program: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new(program)
            .args(args)
            .timeout_secs(HOOK_TOOL_TIMEOUT_SECS);
        let output = self.runner.run(&spec).await?;
        Ok(output.stdout)
    }

    /// The charm configuration as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if `config-get` fails or prints invalid JSON.
    pub async fn config_get(&self) -> Result<serde_json::Value> {
        let out = self.tool("config-get", ["--format=json"]).await?;
        serde_json::from_str(&out).context("config-get returned invalid JSON")
    }

    /// The unit's private address.
    ///
    /// # Errors
    ///
    /// Returns an error if `unit-get` fails or prints nothing.
    pub async fn unit_private_address(&self) -> Result<String> {
        let out = self.tool("unit-get", ["private-address"]).await?;
        let address = out.trim();
        if address.is_empty() {
            anyhow::bail!("unit-get private-address returned an empty address");
        }
        Ok(address.to_string())
    }

    /// Set the workload status shown by `juju status`.
    ///
    /// # Errors
    ///
    /// Returns an error if `status-set` fails.
    pub async fn status_set(&self, status: WorkloadStatus, message: &str) -> Result<()> {
        debug!(status = %status, message, "Setting workload status");
        self.tool("status-set", [status.as_str(), message]).await?;
        Ok(())
    }

    /// Relation ids for a relation name (e.g. `["shared-db:3"]`).
    ///
    /// # Errors
    ///
    /// Returns an error if `relation-ids` fails or prints invalid JSON.
    pub async fn relation_ids(&self, relation: &str) -> Result<Vec<String>> {
        let out = self.tool("relation-ids", ["--format=json", relation]).await?;
        let ids: Option<Vec<String>> = serde_json::from_str(&out)
            .with_context(|| format!("relation-ids {relation} returned invalid JSON"))?;
        Ok(ids.unwrap_or_default())
    }

    /// Remote units on a relation id.
    ///
    /// # Errors
    ///
    /// Returns an error if `relation-list` fails or prints invalid JSON.
    pub async fn relation_list(&self, relation_id: &str) -> Result<Vec<String>> {
        let out = self
            .tool("relation-list", ["--format=json", "-r", relation_id])
            .await?;
        let units: Option<Vec<String>> = serde_json::from_str(&out)
            .with_context(|| format!("relation-list -r {relation_id} returned invalid JSON"))?;
        Ok(units.unwrap_or_default())
    }

    /// All settings a remote unit published on a relation id.
    ///
    /// # Errors
    ///
    /// Returns an error if `relation-get` fails or prints something other than an object.
    pub async fn relation_get(
        &self,
        relation_id: &str,
        unit: &str,
    ) -> Result<BTreeMap<String, String>> {
        let out = self
            .tool("relation-get", ["--format=json", "-r", relation_id, "-", unit])
            .await?;
        let value: serde_json::Value = serde_json::from_str(&out)
            .with_context(|| format!("relation-get -r {relation_id} - {unit} returned invalid JSON"))?;
        settings_from_json(value).with_context(|| {
            format!("relation-get -r {relation_id} - {unit} did not return an object")
        })
    }

    /// Publish this unit's settings on a relation id.
    ///
    /// # Errors
    ///
    /// Returns an error if `relation-set` fails.
    pub async fn relation_set(
        &self,
        relation_id: &str,
        settings: &BTreeMap<String, String>,
    ) -> Result<()> {
        if settings.is_empty() {
            return Ok(());
        }
        let mut args = vec!["-r".to_string(), relation_id.to_string()];
        args.extend(key_value_args(settings));
        self.tool("relation-set", args).await?;
        Ok(())
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }
}

/// Derive the hook name from the executable name.
///
/// Juju runs `hooks/<name>`, which is a symlink to the charm binary. Returns
/// `None` when invoked under the binary's own name.
#[must_use]
pub fn hook_name_from_argv0(argv0: &str, binary_name: &str) -> Option<String> {
    let name = Path::new(argv0).file_name()?.to_str()?;
    if name.is_empty() || name == binary_name {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
#[path = "hookenv_tests.rs"]
mod hookenv_tests;

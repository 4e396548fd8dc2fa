// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Leader settings: a small key/value store shared by every unit of the
//! application, readable by all and writable only by the elected leader.

use crate::command::{CommandRunner, CommandSpec};
use crate::constants::HOOK_TOOL_TIMEOUT_SECS;
use crate::errors::LeaderError;
use crate::hookenv::{key_value_args, settings_from_json};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Access to leadership and leader settings.
#[async_trait]
pub trait LeaderStore: Send + Sync {
    /// Whether this unit currently holds leadership.
    async fn is_leader(&self) -> Result<bool, LeaderError>;

    /// All leader settings.
    async fn get_all(&self) -> Result<BTreeMap<String, String>, LeaderError>;

    /// Write settings. Fails with [`LeaderError::NotLeader`] on followers.
    async fn set(&self, settings: &BTreeMap<String, String>) -> Result<(), LeaderError>;

    /// One leader setting; empty values read as unset.
    async fn get(&self, key: &str) -> Result<Option<String>, LeaderError> {
        Ok(self
            .get_all()
            .await?
            .remove(key)
            .filter(|value| !value.is_empty()))
    }

    /// Convenience for a single key.
    async fn set_one(&self, key: &str, value: &str) -> Result<(), LeaderError> {
        let mut settings = BTreeMap::new();
        settings.insert(key.to_string(), value.to_string());
        self.set(&settings).await
    }
}

/// Leader store backed by `is-leader`, `leader-get` and `leader-set`.
pub struct JujuLeaderStore {
    runner: Arc<dyn CommandRunner>,
}

impl JujuLeaderStore {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn tool(&self, program: &str, args: Vec<String>) -> Result<String, LeaderError> {
        let spec = CommandSpec::new(program)
            .args(args)
            .timeout_secs(HOOK_TOOL_TIMEOUT_SECS);
        Ok(self.runner.run(&spec).await?.stdout)
    }
}

#[async_trait]
impl LeaderStore for JujuLeaderStore {
    async fn is_leader(&self) -> Result<bool, LeaderError> {
        let out = self
            .tool("is-leader", vec!["--format=json".to_string()])
            .await?;
        serde_json::from_str(out.trim()).map_err(|e| LeaderError::MalformedSettings {
            reason: format!("is-leader: {e}"),
        })
    }

    async fn get_all(&self) -> Result<BTreeMap<String, String>, LeaderError> {
        let out = self
            .tool("leader-get", vec!["--format=json".to_string()])
            .await?;
        let value: serde_json::Value =
            serde_json::from_str(&out).map_err(|e| LeaderError::MalformedSettings {
                reason: e.to_string(),
            })?;
        settings_from_json(value).ok_or_else(|| LeaderError::MalformedSettings {
            reason: "leader-get did not return an object".to_string(),
        })
    }

    async fn set(&self, settings: &BTreeMap<String, String>) -> Result<(), LeaderError> {
        let Some(first) = settings.keys().next() else {
            return Ok(());
        };
        if !self.is_leader().await? {
            return Err(LeaderError::NotLeader { key: first.clone() });
        }
        self.tool("leader-set", key_value_args(settings)).await?;
        info!(keys = ?settings.keys().collect::<Vec<_>>(), "Updated leader settings");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    leader: bool,
    settings: BTreeMap<String, String>,
    writes: usize,
    fail_next_set: bool,
}

/// In-memory leader store for tests and dry runs.
///
/// Several units of a simulated application can share one store through
/// [`MemoryLeaderStore::follower_view`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaderStore {
    state: Arc<Mutex<MemoryState>>,
    leader_override: Option<bool>,
}

impl MemoryLeaderStore {
    /// A store where this unit is the leader.
    #[must_use]
    pub fn leader() -> Self {
        let store = Self::default();
        store.lock().leader = true;
        store
    }

    /// A store where this unit is a follower.
    #[must_use]
    pub fn follower() -> Self {
        Self::default()
    }

    /// Same settings, but seen from a unit that is never the leader.
    #[must_use]
    pub fn follower_view(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            leader_override: Some(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn leading(&self) -> bool {
        self.leader_override.unwrap_or_else(|| self.lock().leader)
    }

    /// Change leadership of the primary view.
    pub fn set_leader(&self, leader: bool) {
        self.lock().leader = leader;
    }

    /// Make the next `set` fail as if the process died before committing.
    pub fn fail_next_set(&self) {
        self.lock().fail_next_set = true;
    }

    /// Insert a setting directly, bypassing the leadership check.
    pub fn seed(&self, key: &str, value: &str) {
        self.lock()
            .settings
            .insert(key.to_string(), value.to_string());
    }

    /// Current settings.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().settings.clone()
    }

    /// Number of successful `set` calls.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.lock().writes
    }
}

#[async_trait]
impl LeaderStore for MemoryLeaderStore {
    async fn is_leader(&self) -> Result<bool, LeaderError> {
        Ok(self.leading())
    }

    async fn get_all(&self) -> Result<BTreeMap<String, String>, LeaderError> {
        Ok(self.snapshot())
    }

    async fn set(&self, settings: &BTreeMap<String, String>) -> Result<(), LeaderError> {
        let Some(first) = settings.keys().next() else {
            return Ok(());
        };
        if !self.leading() {
            return Err(LeaderError::NotLeader { key: first.clone() });
        }
        let mut state = self.lock();
        if state.fail_next_set {
            state.fail_next_set = false;
            return Err(LeaderError::Command(crate::errors::CommandError::SpawnFailed {
                command: "leader-set".to_string(),
                reason: "simulated failure".to_string(),
            }));
        }
        state
            .settings
            .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "leadership_tests.rs"]
mod leadership_tests;

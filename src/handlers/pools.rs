// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pushes the rendered pool topology into Designate.
//!
//! The leader runs `designate-manage pool update` whenever the content of
//! `pools.yaml` differs from the hash recorded in leader settings. The same
//! action runs on `leader-elected` so a new leader catches up with changes its
//! predecessor never pushed.

use crate::command::CommandSpec;
use crate::constants::{DB_SYNC_TIMEOUT_SECS, POOLS_YAML};
use crate::context::HookContext;
use crate::hashing::{file_content_hash, ABSENT_HASH};
use crate::registry::Action;
use crate::states::LEADER_POOL_YAML_HASH;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Leader updates the Designate pools from `pools.yaml` when it changed.
pub struct UpdatePools;

#[async_trait]
impl Action for UpdatePools {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if !ctx.leader.is_leader().await? {
            debug!("Not the leader; skipping pool update");
            return Ok(());
        }

        let path = ctx.paths.pools_yaml();
        let hash = file_content_hash(&path)
            .with_context(|| format!("Failed to hash {}", path.display()))?;
        if hash == ABSENT_HASH {
            debug!(path = %path.display(), "Pools file not rendered yet");
            return Ok(());
        }
        if ctx.leader.get(LEADER_POOL_YAML_HASH).await?.as_deref() == Some(hash.as_str()) {
            debug!("Pools already up to date");
            return Ok(());
        }

        info!(path = %path.display(), "Updating Designate pools");
        let spec = CommandSpec::new("designate-manage")
            .args(["pool", "update", "--file"])
            .arg(path.display().to_string())
            .timeout_secs(DB_SYNC_TIMEOUT_SECS);
        ctx.runner
            .run(&spec)
            .await
            .with_context(|| format!("Failed to update pools from {POOLS_YAML}"))?;
        ctx.leader.set_one(LEADER_POOL_YAML_HASH, &hash).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "pools_tests.rs"]
mod pools_tests;

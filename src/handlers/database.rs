// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Database migration and pool manager cache sync, both leader-only.

use super::service::restart_services;
use crate::command::CommandSpec;
use crate::constants::DB_SYNC_TIMEOUT_SECS;
use crate::context::HookContext;
use crate::registry::Action;
use crate::states::{DB_SYNCHED, LEADER_DB_SYNC_DONE, LEADER_POOL_CACHE_SYNC_DONE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

pub(crate) fn designate_manage(args: &[&str]) -> CommandSpec {
    CommandSpec::new("designate-manage")
        .args(args.iter().copied())
        .timeout_secs(DB_SYNC_TIMEOUT_SECS)
}

/// Leader syncs the schema once; every unit sets `db.synched` when the leader
/// marker is present.
pub struct RunDbMigration;

#[async_trait]
impl Action for RunDbMigration {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let done = ctx.leader.get(LEADER_DB_SYNC_DONE).await?.is_some();

        if !done && ctx.leader.is_leader().await? {
            info!("Running database migration");
            match ctx.runner.run(&designate_manage(&["database", "sync"])).await {
                Ok(_) => {}
                Err(e) if e.is_timeout() => {
                    warn!(error = %e, "Database migration timed out; retrying next invocation");
                    return Ok(());
                }
                Err(e) => return Err(e).context("Database migration failed"),
            }
            let services = ctx.release.services;
            restart_services(ctx, services).await?;
            ctx.leader.set_one(LEADER_DB_SYNC_DONE, "true").await?;
        }

        if ctx.leader.get(LEADER_DB_SYNC_DONE).await?.is_some() {
            ctx.flags.set(DB_SYNCHED)?;
        } else {
            info!("Waiting for the leader to migrate the database");
        }
        Ok(())
    }
}

/// Leader populates the pool manager cache once.
pub struct SyncPoolManagerCache;

#[async_trait]
impl Action for SyncPoolManagerCache {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if !ctx.leader.is_leader().await? {
            return Ok(());
        }
        if ctx.leader.get(LEADER_POOL_CACHE_SYNC_DONE).await?.is_some() {
            return Ok(());
        }

        info!("Syncing pool manager cache");
        ctx.runner
            .run(&designate_manage(&["pool-manager-cache", "sync"]))
            .await
            .context("Pool manager cache sync failed")?;
        ctx.leader
            .set_one(LEADER_POOL_CACHE_SYNC_DONE, "true")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod database_tests;

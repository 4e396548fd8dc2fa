// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OpenStack release upgrades.
//!
//! Changing `openstack-origin` to a later release upgrades the packages in
//! place the next time the full configuration is rendered, unless
//! `action-managed-upgrade` hands the upgrade to the operator.

use super::database::designate_manage;
use super::install::{apt_env, configure_source};
use crate::command::CommandSpec;
use crate::constants::DEFAULT_COMMAND_TIMEOUT_SECS;
use crate::context::HookContext;
use crate::hookenv::WorkloadStatus;
use crate::release::is_upgrade;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Upgrade the installed packages when `openstack-origin` names a later
/// release than the one installed.
///
/// Returns `true` when packages were upgraded; the caller restarts the
/// services after rendering.
///
/// # Errors
///
/// Returns an error if a package or database command fails; the installed
/// release stays recorded as the old one so the upgrade runs again.
pub async fn upgrade_if_available(ctx: &mut HookContext) -> Result<bool> {
    let target = ctx.release.name;
    let Some(installed) = ctx.flags.installed_release().map(str::to_string) else {
        return Ok(false);
    };
    if installed == target {
        return Ok(false);
    }
    if !is_upgrade(&installed, target) {
        warn!(installed = %installed, requested = target, "Refusing to move to an older release");
        return Ok(false);
    }
    if ctx.config.action_managed_upgrade {
        info!(
            installed = %installed,
            available = target,
            "Upgrade available; waiting for the operator"
        );
        return Ok(false);
    }

    info!(from = %installed, to = target, "Upgrading OpenStack release");
    ctx.tools
        .status_set(WorkloadStatus::Maintenance, "Running openstack upgrade")
        .await?;
    configure_source(ctx).await?;

    let env = apt_env();
    let confnew = [
        "--option=Dpkg::Options::=--force-confnew",
        "--option=Dpkg::Options::=--force-confdef",
    ];
    let dist_upgrade = CommandSpec::new("apt-get")
        .args(["dist-upgrade", "-y"])
        .args(confnew)
        .envs(&env)
        .timeout_secs(DEFAULT_COMMAND_TIMEOUT_SECS * 2);
    ctx.runner
        .run(&dist_upgrade)
        .await
        .context("Failed to upgrade packages")?;

    let install = CommandSpec::new("apt-get")
        .args(["install", "-y"])
        .args(confnew)
        .args(ctx.release.packages.iter().copied())
        .envs(&env)
        .timeout_secs(DEFAULT_COMMAND_TIMEOUT_SECS * 2);
    ctx.runner
        .run(&install)
        .await
        .context("Failed to install packages for the new release")?;

    if ctx.leader.is_leader().await? {
        ctx.runner
            .run(&designate_manage(&["database", "sync"]))
            .await
            .context("Database migration after upgrade failed")?;
    }

    ctx.flags.record_installed_release(target)?;
    info!(release = target, "OpenStack upgrade complete");
    Ok(true)
}

#[cfg(test)]
#[path = "upgrade_tests.rs"]
mod upgrade_tests;

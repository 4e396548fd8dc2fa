// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Package installation.

use crate::command::CommandSpec;
use crate::constants::DEFAULT_COMMAND_TIMEOUT_SECS;
use crate::context::HookContext;
use crate::hookenv::WorkloadStatus;
use crate::registry::Action;
use crate::release::cloud_archive_source;
use crate::states::{DOWNSTREAM_MILESTONES, INSTALLED};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::info;

pub(crate) fn apt_env() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "DEBIAN_FRONTEND".to_string(),
        "noninteractive".to_string(),
    )])
}

/// Add the cloud archive named by `openstack-origin`, if any, and refresh the
/// package lists.
///
/// # Errors
///
/// Returns an error if either command fails.
pub(crate) async fn configure_source(ctx: &HookContext) -> Result<()> {
    let env = apt_env();
    if let Some(source) = cloud_archive_source(&ctx.config.openstack_origin) {
        info!(source = %source, "Adding package source");
        let spec = CommandSpec::new("add-apt-repository")
            .args(["--yes", source.as_str()])
            .envs(&env);
        ctx.runner
            .run(&spec)
            .await
            .with_context(|| format!("Failed to add package source {source}"))?;
    }

    let update = CommandSpec::new("apt-get").arg("update").envs(&env);
    ctx.runner
        .run(&update)
        .await
        .context("Failed to update package lists")?;
    Ok(())
}

/// Configures the package source and installs the release's packages.
///
/// Installing (or re-installing) invalidates every later milestone, so their
/// flags are cleared before `installed` is set.
pub struct InstallPackages;

#[async_trait]
impl Action for InstallPackages {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        ctx.tools
            .status_set(WorkloadStatus::Maintenance, "Installing packages")
            .await?;

        configure_source(ctx).await?;

        let install = CommandSpec::new("apt-get")
            .args(["install", "-y", "--option=Dpkg::Options::=--force-confold"])
            .args(ctx.release.packages.iter().copied())
            .envs(&apt_env())
            .timeout_secs(DEFAULT_COMMAND_TIMEOUT_SECS * 2);
        ctx.runner
            .run(&install)
            .await
            .context("Failed to install packages")?;
        info!(release = ctx.release.name, packages = ctx.release.packages.len(), "Installed packages");

        for flag in DOWNSTREAM_MILESTONES {
            ctx.flags.clear(flag)?;
        }
        ctx.flags.record_installed_release(ctx.release.name)?;
        ctx.flags.set(INSTALLED)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod install_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration rendering handlers.

use super::domains::{managed_domains, publish_zone_ids, zone_ids};
use super::service::{restart_services, unit_services};
use super::upgrade::upgrade_if_available;
use crate::context::HookContext;
use crate::registry::Action;
use crate::render::{base_config, full_config, write_files, RenderContext, RenderOutcome};
use crate::states::{BASE_CONFIG_RENDERED, LEADER_DOMAIN_INIT_DONE};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

async fn apply(ctx: &mut HookContext, outcome: RenderOutcome) -> Result<()> {
    if outcome.is_unchanged() {
        debug!("Configuration unchanged");
        return Ok(());
    }
    info!(
        files = outcome.written.len(),
        services = outcome.restart.len(),
        "Configuration changed"
    );
    restart_services(ctx, &outcome.restart).await?;
    Ok(())
}

/// Renders the configuration needed to migrate the database.
pub struct ConfigureBasic;

#[async_trait]
impl Action for ConfigureBasic {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let files = base_config(&RenderContext::from_hook(ctx)?);
        let outcome = write_files(&files)?;
        apply(ctx, outcome).await?;
        ctx.flags.set(BASE_CONFIG_RENDERED)?;
        Ok(())
    }
}

/// Ids of the nova and neutron domains, once the leader has created them.
///
/// On the leader, ids that no longer match `domain-init-done` are published
/// again so the other units re-render their sinks.
async fn sink_domain_ids(ctx: &HookContext) -> Result<(Option<String>, Option<String>)> {
    if ctx.leader.get(LEADER_DOMAIN_INIT_DONE).await?.is_none() {
        return Ok((None, None));
    }

    let client = ctx.designate_client()?;
    let ids = zone_ids(&client, &managed_domains(ctx)).await?;
    if ctx.leader.is_leader().await? {
        publish_zone_ids(ctx, &ids).await?;
    }

    let lookup = |domain: &Option<String>| {
        domain
            .as_ref()
            .and_then(|name| ids.get(name).cloned().flatten())
    };
    Ok((lookup(&ctx.config.nova_domain), lookup(&ctx.config.neutron_domain)))
}

/// Renders the full configuration: sinks, secondary keys and the pool descriptor.
///
/// A pending release upgrade runs first; every unit service restarts after it.
pub struct ConfigureFull;

#[async_trait]
impl Action for ConfigureFull {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let upgraded = upgrade_if_available(ctx).await?;
        let (nova, neutron) = sink_domain_ids(ctx).await?;
        let files = full_config(&RenderContext::from_hook(ctx)?.with_domain_ids(nova, neutron))?;
        let outcome = write_files(&files)?;
        if upgraded {
            let services = unit_services(ctx);
            restart_services(ctx, &services).await?;
            return Ok(());
        }
        apply(ctx, outcome).await
    }
}

#[cfg(test)]
#[path = "configure_tests.rs"]
mod configure_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Initial servers and domains.
//!
//! The leader registers the configured nameservers and creates the nova and
//! neutron domains. Designate itself is the source of truth: every create is
//! preceded by a lookup, so a retry after a crash between the create call and
//! the leader write is a no-op.
//!
//! The leader marker `domain-init-done` holds a hash of the domain ids. When
//! the ids differ before and after a create window (or from the recorded
//! marker), the marker is rewritten so every unit sees
//! `leader-settings-changed` and re-renders its sink configuration.

use crate::context::HookContext;
use crate::designate::DesignateClient;
use crate::errors::DesignateError;
use crate::hashing::calculate_hash;
use crate::registry::Action;
use crate::states::{DOMAINS_CREATED, LEADER_DOMAIN_INIT_DONE};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Domain name → id (`None` while the domain does not exist).
pub type ZoneIds = BTreeMap<String, Option<String>>;

/// Names of the domains the charm manages.
#[must_use]
pub fn managed_domains(ctx: &HookContext) -> Vec<String> {
    [&ctx.config.nova_domain, &ctx.config.neutron_domain]
        .into_iter()
        .flatten()
        .filter(|d| !d.is_empty())
        .cloned()
        .collect()
}

/// Look up the ids of `names` with a single listing.
///
/// # Errors
///
/// Returns the listing error.
pub async fn zone_ids(client: &DesignateClient, names: &[String]) -> Result<ZoneIds, DesignateError> {
    let domains = client.list_domains().await?;
    Ok(names
        .iter()
        .map(|name| {
            let id = domains.iter().find(|d| &d.name == name).map(|d| d.id.clone());
            (name.clone(), id)
        })
        .collect())
}

/// Leader marker value for a set of domain ids.
#[must_use]
pub fn zone_ids_marker(ids: &ZoneIds) -> String {
    calculate_hash(ids)
}

/// Rewrite `domain-init-done` if it does not match `ids`. Leader only.
///
/// Returns whether the marker was written.
///
/// # Errors
///
/// Returns an error if leader settings cannot be read or written.
pub async fn publish_zone_ids(ctx: &HookContext, ids: &ZoneIds) -> Result<bool> {
    let marker = zone_ids_marker(ids);
    if ctx.leader.get(LEADER_DOMAIN_INIT_DONE).await?.as_deref() == Some(marker.as_str()) {
        return Ok(false);
    }
    ctx.leader.set_one(LEADER_DOMAIN_INIT_DONE, &marker).await?;
    info!(marker = %marker, "Published domain ids to peers");
    Ok(true)
}

/// Create the configured servers and domains, then publish the leader marker.
///
/// Returns whether the domain ids changed across the create window. Nothing
/// is created while a configured domain name is invalid; status reports the
/// problem and the marker stays unset until the operator fixes it.
///
/// # Errors
///
/// Returns an error if the API does not respond, a create cannot be verified,
/// or the leader marker cannot be written.
pub async fn create_initial_servers_and_domains(ctx: &HookContext) -> Result<bool> {
    let problems = ctx.config.domain_problems();
    if !problems.is_empty() {
        for problem in &problems {
            warn!(error = %problem, "Not creating domains");
        }
        return Ok(false);
    }

    let client = ctx.designate_client()?;
    client.ensure_api_responding().await?;

    let names = managed_domains(ctx);
    let before = zone_ids(&client, &names).await?;

    for server in ctx.config.nameservers() {
        client.create_server(&server).await?;
    }
    for (domain, email) in ctx.config.initial_domains() {
        client.create_domain(&domain, &email).await?;
    }

    let after = zone_ids(&client, &names).await?;
    let changed = before != after;
    if changed {
        info!(before = ?before, after = ?after, "Domain ids changed");
    }
    publish_zone_ids(ctx, &after).await?;
    Ok(changed)
}

/// Leader creates; every unit sets `domains.created` once the marker exists.
pub struct CreateServersAndDomains;

#[async_trait]
impl Action for CreateServersAndDomains {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if ctx.leader.is_leader().await? {
            create_initial_servers_and_domains(ctx).await?;
        }

        if ctx.leader.get(LEADER_DOMAIN_INIT_DONE).await?.is_some() {
            ctx.flags.set(DOMAINS_CREATED)?;
        } else {
            info!("Waiting for the leader to create the initial domains");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "domains_tests.rs"]
mod domains_tests;

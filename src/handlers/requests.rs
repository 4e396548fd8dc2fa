// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Requests published to the database, message bus and identity service.

use crate::constants::{DATABASE_PREFIXES, DESIGNATE_API_PORT, POOL_MANAGER_DATABASE, SERVICE_TYPE};
use crate::context::HookContext;
use crate::registry::Action;
use crate::relations::UnitData;
use crate::render::frontends::https_enabled;
use crate::states::{AMQP, IDENTITY_SERVICE, SHARED_DB};
use crate::status::assess_status;
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

/// Settings requesting broker access.
#[must_use]
pub fn amqp_request(ctx: &HookContext) -> UnitData {
    UnitData::from([
        ("username".to_string(), ctx.config.rabbit_user.clone()),
        ("vhost".to_string(), ctx.config.rabbit_vhost.clone()),
    ])
}

/// Settings requesting the main and pool manager databases.
#[must_use]
pub fn database_request(ctx: &HookContext) -> UnitData {
    let mut settings = UnitData::new();
    for prefix in DATABASE_PREFIXES {
        let (database, username) = if prefix == POOL_MANAGER_DATABASE {
            (POOL_MANAGER_DATABASE, POOL_MANAGER_DATABASE)
        } else {
            (ctx.config.database.as_str(), ctx.config.database_user.as_str())
        };
        settings.insert(format!("{prefix}_database"), database.to_string());
        settings.insert(format!("{prefix}_username"), username.to_string());
        settings.insert(format!("{prefix}_hostname"), ctx.unit_address.clone());
    }
    settings
}

/// The API endpoint, on the first VIP when clustered and over HTTPS once apache
/// terminates TLS.
///
/// # Errors
///
/// Returns an error if the host does not form a valid URL.
pub fn api_url(ctx: &HookContext) -> Result<Url> {
    let host = ctx
        .config
        .vips()
        .into_iter()
        .next()
        .unwrap_or_else(|| ctx.unit_address.clone());
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host
    };
    let scheme = if https_enabled(ctx) { "https" } else { "http" };
    Url::parse(&format!("{scheme}://{host}:{DESIGNATE_API_PORT}"))
        .with_context(|| format!("Invalid API endpoint host '{host}'"))
}

/// Settings registering the DNS endpoint in the service catalogue.
///
/// # Errors
///
/// Returns an error if the endpoint URL cannot be built.
pub fn endpoint_request(ctx: &HookContext) -> Result<UnitData> {
    let url = api_url(ctx)?.to_string();
    let url = url.trim_end_matches('/').to_string();
    Ok(UnitData::from([
        ("service".to_string(), SERVICE_TYPE.to_string()),
        ("region".to_string(), ctx.config.region.clone()),
        ("public_url".to_string(), url.clone()),
        ("internal_url".to_string(), url.clone()),
        ("admin_url".to_string(), url),
    ]))
}

pub struct SetupAmqp;

#[async_trait]
impl Action for SetupAmqp {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        ctx.publish(AMQP, &amqp_request(ctx)).await?;
        assess_status(ctx).await?;
        Ok(())
    }
}

pub struct SetupDatabase;

#[async_trait]
impl Action for SetupDatabase {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        ctx.publish(SHARED_DB, &database_request(ctx)).await?;
        assess_status(ctx).await?;
        Ok(())
    }
}

pub struct SetupEndpoint;

#[async_trait]
impl Action for SetupEndpoint {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        ctx.publish(IDENTITY_SERVICE, &endpoint_request(ctx)?).await?;
        assess_status(ctx).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod requests_tests;

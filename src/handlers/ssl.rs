// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTPS termination in front of designate-api.
//!
//! Certificates come from `ssl_cert`/`ssl_key`/`ssl_ca` or from keystone over
//! identity-service. Apache listens where the API used to; the API port itself
//! moves down when the base configuration is next rendered.

use super::service::restart_services;
use crate::command::CommandSpec;
use crate::constants::{
    APACHE_MODULES, APACHE_SERVICE, APACHE_SITE_NAME, CONFIG_FILE_MODE, SECRET_FILE_MODE,
    SERVICE_CONFIG_FILE_MODE,
};
use crate::context::HookContext;
use crate::registry::Action;
use crate::render::frontends::{api_ports, apache_site, ssl_material, SslMaterial};
use crate::render::{write_files, RenderedFile};
use crate::states::SSL_ENABLED;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

fn ssl_files(ctx: &HookContext, material: &SslMaterial) -> Vec<RenderedFile> {
    let paths = &ctx.paths;
    let restart = || vec![APACHE_SERVICE];
    let mut files = vec![
        RenderedFile::new(
            paths.ssl_cert(&material.cn),
            material.pem.cert.clone(),
            SERVICE_CONFIG_FILE_MODE,
        )
        .restarts(restart()),
        RenderedFile::new(
            paths.ssl_key(&material.cn),
            material.pem.key.clone(),
            SECRET_FILE_MODE,
        )
        .restarts(restart()),
    ];
    if let Some(ca) = &material.pem.ca {
        files.push(RenderedFile::new(paths.ca_cert(), ca.clone(), CONFIG_FILE_MODE));
    }
    if let Some(site) = apache_site(&api_ports(ctx), &material.cn) {
        files.push(
            RenderedFile::new(paths.apache_site(), site, CONFIG_FILE_MODE).restarts(restart()),
        );
    }
    files
}

async fn run_tool(ctx: &HookContext, program: &str, args: &[&str]) -> Result<()> {
    let spec = CommandSpec::new(program).args(args.iter().copied());
    ctx.runner
        .run(&spec)
        .await
        .with_context(|| format!("Failed to run {}", spec.display()))?;
    Ok(())
}

async fn disable(ctx: &mut HookContext) -> Result<()> {
    if !ctx.flags.is_set(SSL_ENABLED) {
        return Ok(());
    }
    info!("TLS material withdrawn; disabling HTTPS frontend");
    run_tool(ctx, "a2dissite", &[APACHE_SITE_NAME]).await?;
    restart_services(ctx, &[APACHE_SERVICE]).await?;
    ctx.flags.clear(SSL_ENABLED)?;
    Ok(())
}

/// Installs certificates and enables the apache HTTPS site.
pub struct ConfigureSsl;

#[async_trait]
impl Action for ConfigureSsl {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let material = match ssl_material(ctx) {
            Ok(Some(material)) => material,
            Ok(None) => return disable(ctx).await,
            Err(e) => {
                warn!(error = %e, "Not configuring HTTPS");
                return Ok(());
            }
        };

        let files = ssl_files(ctx, &material);
        let outcome = write_files(&files)?;
        if outcome.is_unchanged() && ctx.flags.is_set(SSL_ENABLED) {
            debug!("HTTPS frontend unchanged");
            return Ok(());
        }
        ctx.flags.clear(SSL_ENABLED)?;

        if outcome.written.contains(&ctx.paths.ca_cert()) {
            run_tool(ctx, "update-ca-certificates", &[]).await?;
        }
        run_tool(ctx, "a2enmod", &APACHE_MODULES).await?;
        run_tool(ctx, "a2ensite", &[APACHE_SITE_NAME]).await?;
        if restart_services(ctx, &[APACHE_SERVICE]).await? {
            ctx.flags.set(SSL_ENABLED)?;
            info!(cn = %material.cn, "HTTPS frontend enabled");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "ssl_tests.rs"]
mod ssl_tests;

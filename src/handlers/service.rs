// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service restarts.
//!
//! A restart that times out is deferred: `services.restart-pending` is set and
//! `retry_restarts` restarts every unit service on a later invocation. Any other
//! failure fails the handler, but still leaves the flag set. The rendered
//! files are already on disk by then, so the next render sees no change and
//! only the flag remembers that the services are owed a restart.

use crate::command::CommandSpec;
use crate::constants::{APACHE_SERVICE, HAPROXY_SERVICE, SERVICE_RESTART_TIMEOUT_SECS};
use crate::context::HookContext;
use crate::registry::Action;
use crate::render::frontends::{haproxy_enabled, https_enabled};
use crate::states::RESTART_PENDING;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// Restart `services` in order.
///
/// Returns `true` when every restart completed.
///
/// # Errors
///
/// Returns an error if a restart fails for a reason other than a timeout
/// (after marking the restart pending), or if the pending flag cannot be
/// persisted.
pub async fn restart_services(ctx: &mut HookContext, services: &[&str]) -> Result<bool> {
    let mut deferred = Vec::new();

    for service in services {
        let spec = CommandSpec::new("service")
            .args([*service, "restart"])
            .timeout_secs(SERVICE_RESTART_TIMEOUT_SECS);
        match ctx.runner.run(&spec).await {
            Ok(_) => info!(service = %service, "Restarted service"),
            Err(e) if e.is_timeout() => {
                warn!(service = %service, error = %e, "Service restart timed out; deferring");
                deferred.push(*service);
            }
            Err(e) => {
                ctx.flags.set(RESTART_PENDING)?;
                return Err(e).with_context(|| format!("Failed to restart {service}"));
            }
        }
    }

    if deferred.is_empty() {
        return Ok(true);
    }
    ctx.flags.set(RESTART_PENDING)?;
    Ok(false)
}

/// Every service this unit runs: the release's services plus the frontends
/// currently in front of the API.
#[must_use]
pub fn unit_services(ctx: &HookContext) -> Vec<&'static str> {
    let mut services = ctx.release.services.to_vec();
    if haproxy_enabled(ctx) {
        services.push(HAPROXY_SERVICE);
    }
    if https_enabled(ctx) {
        services.push(APACHE_SERVICE);
    }
    services
}

/// Restarts every service of the unit after an earlier failed restart.
pub struct RetryRestarts;

#[async_trait]
impl Action for RetryRestarts {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let services = unit_services(ctx);
        if restart_services(ctx, &services).await? {
            ctx.flags.clear(RESTART_PENDING)?;
            info!("Deferred service restarts completed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Designate milestone handlers.
//!
//! Every handler is an [`Action`](crate::registry::Action) registered with a
//! predicate in [`build_registry`]. Handlers are safe to re-run: milestones
//! that cost something externally check the external system first and only set
//! their flag (or leader marker) after inspecting the result.
//!
//! # Registered handlers
//!
//! | handler | runs when |
//! |---|---|
//! | `install_packages` | `installed` is not set |
//! | `setup_amqp_req` | amqp is connected |
//! | `setup_database` | shared-db is connected |
//! | `setup_endpoint` | identity-service is connected |
//! | `configure_ssl` | installed, identity-service available |
//! | `configure_designate_basic` | all interfaces available, base config not rendered |
//! | `run_db_migration` | base config rendered, database not synced |
//! | `update_peers` | cluster is available |
//! | `create_servers_and_domains` | database synced, domains not created |
//! | `configure_designate_full` | all interfaces available, database synced |
//! | `sync_pool_manager_cache` | database synced, domains created |
//! | `update_pools` | database synced, `pools.yaml` changed |
//! | `update_pools_on_election` | database synced, `leader-elected` hook |
//! | `cluster_connected` | ha is connected |
//! | `retry_restarts` | a service restart timed out earlier |
//! | `config_changed` | charm configuration changed |

pub mod configure;
pub mod database;
pub mod domains;
pub mod ha;
pub mod install;
pub mod peers;
pub mod pools;
pub mod requests;
pub mod service;
pub mod ssl;
pub mod upgrade;

use crate::conditions::{Condition, Predicate};
use crate::constants::POOLS_YAML;
use crate::errors::RegistryError;
use crate::registry::{Action, HandlerRegistry};
use crate::states::{
    self, BASE_CONFIG_RENDERED, CONFIG_CHANGED, DB_SYNCHED, DECLARED_RELATIONS, DOMAINS_CREATED,
    HOOK_LEADER_ELECTED, INSTALLED, RESTART_PENDING,
};
use std::sync::Arc;

/// `dns-backend`, `shared-db`, `identity-service` and `amqp` are all available.
#[must_use]
pub fn all_interfaces() -> Vec<String> {
    [
        states::DNS_BACKEND,
        states::SHARED_DB,
        states::IDENTITY_SERVICE,
        states::AMQP,
    ]
    .iter()
    .map(|r| states::available(r))
    .collect()
}

fn when(names: impl IntoIterator<Item = String>) -> Condition {
    Condition::when(names)
}

fn with_interfaces(extra: &[&str]) -> Condition {
    when(
        all_interfaces()
            .into_iter()
            .chain(extra.iter().map(|s| (*s).to_string())),
    )
}

/// Register every handler, in dispatch order.
///
/// # Errors
///
/// Returns a [`RegistryError`] if a registration violates a registry invariant.
pub fn build_registry() -> Result<HandlerRegistry, RegistryError> {
    let update_pools: Arc<dyn Action> = Arc::new(pools::UpdatePools);

    HandlerRegistry::builder(&DECLARED_RELATIONS)
        .register(
            "install_packages",
            Predicate::new().and(Condition::when_not([INSTALLED])),
            install::InstallPackages,
        )
        .register(
            "setup_amqp_req",
            Predicate::new().and(when([states::connected(states::AMQP)])),
            requests::SetupAmqp,
        )
        .register(
            "setup_database",
            Predicate::new().and(when([states::connected(states::SHARED_DB)])),
            requests::SetupDatabase,
        )
        .register(
            "setup_endpoint",
            Predicate::new().and(when([states::connected(states::IDENTITY_SERVICE)])),
            requests::SetupEndpoint,
        )
        .register(
            "configure_ssl",
            Predicate::new().and(Condition::when([
                INSTALLED.to_string(),
                states::available(states::IDENTITY_SERVICE),
            ])),
            ssl::ConfigureSsl,
        )
        .register(
            "configure_designate_basic",
            Predicate::new()
                .and(with_interfaces(&[]))
                .and(Condition::when_not([BASE_CONFIG_RENDERED])),
            configure::ConfigureBasic,
        )
        .register(
            "run_db_migration",
            Predicate::new()
                .and(with_interfaces(&[BASE_CONFIG_RENDERED]))
                .and(Condition::when_not([DB_SYNCHED])),
            database::RunDbMigration,
        )
        .register(
            "update_peers",
            Predicate::new().and(when([states::available(states::CLUSTER)])),
            peers::UpdatePeers,
        )
        .register(
            "create_servers_and_domains",
            Predicate::new()
                .and(with_interfaces(&[BASE_CONFIG_RENDERED, DB_SYNCHED]))
                .and(Condition::when_not([DOMAINS_CREATED])),
            domains::CreateServersAndDomains,
        )
        .register(
            "configure_designate_full",
            Predicate::new().and(with_interfaces(&[DB_SYNCHED])),
            configure::ConfigureFull,
        )
        .register(
            "sync_pool_manager_cache",
            Predicate::new().and(Condition::when([DB_SYNCHED, DOMAINS_CREATED])),
            database::SyncPoolManagerCache,
        )
        .register_shared(
            "update_pools",
            Predicate::new()
                .and(Condition::when([DB_SYNCHED]))
                .and(Condition::file_changed(POOLS_YAML)),
            Arc::clone(&update_pools),
        )
        .register_shared(
            "update_pools_on_election",
            Predicate::new()
                .and(Condition::hook(HOOK_LEADER_ELECTED))
                .and(Condition::when([DB_SYNCHED])),
            update_pools,
        )
        .register(
            "cluster_connected",
            Predicate::new().and(when([states::connected(states::HA)])),
            ha::ClusterConnected,
        )
        .register(
            "retry_restarts",
            Predicate::new().and(Condition::when([RESTART_PENDING])),
            service::RetryRestarts,
        )
        .register(
            "config_changed",
            Predicate::new().and(Condition::when([CONFIG_CHANGED])),
            AssessStatus,
        )
        .build()
}

/// Publish the unit's workload status.
pub struct AssessStatus;

#[async_trait::async_trait]
impl Action for AssessStatus {
    async fn run(&self, ctx: &mut crate::context::HookContext) -> anyhow::Result<()> {
        crate::status::assess_status(ctx).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Multi-invocation convergence tests.
//!
//! Each test drives one or more simulated units through repeated hook
//! invocations against a fake Designate API and an in-memory leader store,
//! the way Juju keeps firing hooks until a unit settles.
//!
//! Run with: cargo test --test convergence_integration

mod common;

use common::{leader_unit, Unit};
use designate_charm::dispatcher::FailurePolicy;
use designate_charm::leadership::MemoryLeaderStore;
use designate_charm::relations::Relations;
use designate_charm::states::{
    BASE_CONFIG_RENDERED, DB_SYNCHED, DOMAINS_CREATED, INSTALLED, LEADER_DB_SYNC_DONE,
    LEADER_DOMAIN_INIT_DONE, LEADER_POOL_CACHE_SYNC_DONE, LEADER_POOL_YAML_HASH,
};
use designate_charm::testing::{
    amqp_relation, dns_backend_relation, identity_relation, shared_db_relation, FakeRunner,
};
use std::sync::Arc;

// ============================================================================
// Single Unit
// ============================================================================

#[tokio::test]
async fn test_leader_converges_and_settles() {
    let unit = leader_unit();

    let first = unit.invoke("install").await;
    assert!(first.is_success(), "{first:?}");
    assert!(first.fired.contains(&"install_packages".to_string()));
    assert!(first.fired.contains(&"configure_designate_basic".to_string()));
    // Migration waits for the next invocation
    assert!(first.skipped.contains(&"run_db_migration".to_string()));

    unit.invoke_times("config-changed", 4).await;

    let flags = unit.flags();
    for flag in [INSTALLED, BASE_CONFIG_RENDERED, DB_SYNCHED, DOMAINS_CREATED] {
        assert!(flags.is_set(flag), "{flag} should be set");
    }
    let settings = unit.leader.snapshot();
    for key in [
        LEADER_DB_SYNC_DONE,
        LEADER_DOMAIN_INIT_DONE,
        LEADER_POOL_CACHE_SYNC_DONE,
        LEADER_POOL_YAML_HASH,
    ] {
        assert!(settings.contains_key(key), "{key} should be published");
    }

    let paths = unit.paths();
    assert!(paths.designate_conf().exists());
    assert!(paths.pools_yaml().exists());
    let nova = std::fs::read_to_string(paths.nova_sink()).unwrap();
    assert!(nova.contains("zone_id = domain-0002"));
}

#[tokio::test]
async fn test_milestones_run_at_most_once_across_invocations() {
    let unit = leader_unit();
    unit.invoke_times("update-status", 8).await;

    let runner = &unit.runner;
    assert_eq!(runner.count("apt-get install"), 1);
    assert_eq!(runner.count("designate-manage database sync"), 1);
    assert_eq!(runner.count("designate-manage pool-manager-cache sync"), 1);
    assert_eq!(runner.count("designate-manage pool update"), 1);
    assert_eq!(runner.count("designate domain-create"), 2);
    assert_eq!(runner.count("designate server-create"), 1);

    runner.reset_calls();
    let settled = unit.invoke("update-status").await;
    assert_eq!(runner.count("service "), 0);
    assert_eq!(runner.count("designate-manage"), 0);
    // Relation requests are re-published every pass; nothing else moves
    assert_eq!(
        settled.fired,
        vec![
            "setup_amqp_req",
            "setup_database",
            "setup_endpoint",
            "configure_ssl",
            "configure_designate_full",
        ]
    );
}

#[tokio::test]
async fn test_zone_creation_twice_yields_one_zone_per_name() {
    let unit = leader_unit();
    unit.invoke_times("config-changed", 4).await;

    // Operator clears the milestone; the next pass re-checks Designate
    let mut flags = unit.flags();
    flags.clear(DOMAINS_CREATED).unwrap();
    unit.invoke("config-changed").await;

    assert!(unit.flags().is_set(DOMAINS_CREATED));
    assert_eq!(
        unit.runner.domain_names(),
        vec!["nova.example.com.", "neutron.example.com."]
    );
    assert_eq!(unit.runner.count("designate domain-create"), 2);
}

#[tokio::test]
async fn test_basic_config_waits_for_database_passwords() {
    let mut unit = leader_unit();
    unit.relations = Relations::new()
        .with(shared_db_relation(false))
        .with(amqp_relation())
        .with(identity_relation())
        .with(dns_backend_relation());

    let report = unit.invoke("shared-db-relation-joined").await;
    assert!(report.fired.contains(&"setup_database".to_string()));
    assert!(report.skipped.contains(&"configure_designate_basic".to_string()));
    assert!(!unit.flags().is_set(BASE_CONFIG_RENDERED));
    assert!(!unit.paths().designate_conf().exists());

    unit.relations.insert(shared_db_relation(true));
    let report = unit.invoke("shared-db-relation-changed").await;
    assert!(report.fired.contains(&"configure_designate_basic".to_string()));
    assert!(unit.flags().is_set(BASE_CONFIG_RENDERED));

    let report = unit.invoke("shared-db-relation-changed").await;
    assert!(!report.fired.contains(&"configure_designate_basic".to_string()));
}

#[tokio::test]
async fn test_crash_after_domain_create_retries_without_duplicates() {
    let unit = leader_unit();
    unit.invoke_times("config-changed", 2).await;
    assert!(unit.flags().is_set(DB_SYNCHED));

    // Domains are created but the leader marker write dies
    unit.leader.fail_next_set();
    let failed = unit.invoke("config-changed").await;
    assert!(!failed.is_success());
    assert_eq!(failed.failed[0].name, "create_servers_and_domains");
    assert!(failed
        .not_reached
        .contains(&"configure_designate_full".to_string()));
    assert!(!unit.flags().is_set(DOMAINS_CREATED));
    assert_eq!(unit.runner.domain_names().len(), 2);

    let retried = unit.invoke("config-changed").await;
    assert!(retried.is_success(), "{retried:?}");
    assert!(unit.flags().is_set(DOMAINS_CREATED));
    assert_eq!(unit.runner.count("designate domain-create"), 2);
}

#[tokio::test]
async fn test_keep_going_runs_later_handlers() {
    let mut unit = leader_unit();
    unit.policy = FailurePolicy::Continue;
    unit.invoke_times("config-changed", 2).await;

    unit.leader.fail_next_set();
    let report = unit.invoke("config-changed").await;

    assert_eq!(report.failed.len(), 1);
    assert!(report.not_reached.is_empty());
    assert!(report
        .fired
        .contains(&"configure_designate_full".to_string()));
}

// ============================================================================
// Leader and Follower
// ============================================================================

#[tokio::test]
async fn test_follower_converges_from_leader_markers() {
    let runner = Arc::new(FakeRunner::new());
    let leader_store = MemoryLeaderStore::leader();
    let leader = Unit::new(&runner, leader_store.clone(), "10.0.0.5");
    let follower = Unit::new(&runner, leader_store.follower_view(), "10.0.0.6");

    follower.invoke_times("install", 2).await;
    assert!(follower.flags().is_set(BASE_CONFIG_RENDERED));
    assert!(!follower.flags().is_set(DB_SYNCHED));

    leader.invoke_times("config-changed", 3).await;
    assert!(leader.flags().is_set(DOMAINS_CREATED));

    follower.invoke_times("leader-settings-changed", 2).await;
    let flags = follower.flags();
    assert!(flags.is_set(DB_SYNCHED));
    assert!(flags.is_set(DOMAINS_CREATED));

    // Only the leader migrated and created
    assert_eq!(runner.count("designate-manage database sync"), 1);
    assert_eq!(runner.count("designate domain-create"), 2);

    let leader_sink = std::fs::read_to_string(leader.paths().nova_sink()).unwrap();
    let follower_sink = std::fs::read_to_string(follower.paths().nova_sink()).unwrap();
    assert_eq!(leader_sink, follower_sink);
}

#[tokio::test]
async fn test_new_leader_pushes_pools_on_election() {
    let runner = Arc::new(FakeRunner::new());
    let leader_store = MemoryLeaderStore::leader();
    let leader = Unit::new(&runner, leader_store.clone(), "10.0.0.5");
    leader.invoke_times("config-changed", 4).await;
    assert_eq!(runner.count("designate-manage pool update"), 1);

    // The recorded hash is lost, as if the previous leader never pushed
    leader_store.seed(LEADER_POOL_YAML_HASH, "stale");
    runner.reset_calls();

    let report = leader.invoke("leader-elected").await;
    assert!(report
        .fired
        .contains(&"update_pools_on_election".to_string()));
    assert_eq!(runner.count("designate-manage pool update"), 1);
    assert_ne!(
        leader_store.snapshot()[LEADER_POOL_YAML_HASH],
        "stale".to_string()
    );
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the handler registry wiring

use super::*;
use crate::conditions::Snapshot;
use std::collections::BTreeSet;

fn registry() -> HandlerRegistry {
    build_registry().expect("handler registrations must be valid")
}

fn fired(registry: &HandlerRegistry, snapshot: &Snapshot) -> Vec<String> {
    registry
        .handlers()
        .iter()
        .filter(|h| h.predicate().evaluate(snapshot))
        .map(|h| h.name().to_string())
        .collect()
}

#[test]
fn test_registration_order() {
    let names: Vec<String> = registry()
        .handlers()
        .iter()
        .map(|h| h.name().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "install_packages",
            "setup_amqp_req",
            "setup_database",
            "setup_endpoint",
            "configure_ssl",
            "configure_designate_basic",
            "run_db_migration",
            "update_peers",
            "create_servers_and_domains",
            "configure_designate_full",
            "sync_pool_manager_cache",
            "update_pools",
            "update_pools_on_election",
            "cluster_connected",
            "retry_restarts",
            "config_changed",
        ]
    );
}

#[test]
fn test_pools_file_is_watched() {
    assert_eq!(
        registry().watched_files(),
        BTreeSet::from([POOLS_YAML.to_string()])
    );
}

#[test]
fn test_pool_handlers_share_one_action() {
    let registry = registry();
    let on_change = registry.get("update_pools").unwrap();
    let on_election = registry.get("update_pools_on_election").unwrap();
    assert!(Arc::ptr_eq(on_change.action(), on_election.action()));
}

#[test]
fn test_fresh_unit_only_installs() {
    assert_eq!(fired(&registry(), &Snapshot::new()), vec!["install_packages"]);
}

#[test]
fn test_basic_config_waits_for_every_interface() {
    let registry = registry();
    let mut interfaces = all_interfaces();
    interfaces.pop();
    let partial = Snapshot::new()
        .with_state(INSTALLED)
        .with_states(interfaces);
    assert!(!fired(&registry, &partial).contains(&"configure_designate_basic".to_string()));

    let complete = partial.with_state(states::available(states::AMQP));
    assert_eq!(
        fired(&registry, &complete),
        vec!["configure_ssl", "configure_designate_basic"]
    );
}

#[test]
fn test_milestones_gate_later_handlers() {
    let registry = registry();
    let synched = Snapshot::new()
        .with_states([INSTALLED, BASE_CONFIG_RENDERED, DB_SYNCHED])
        .with_states(all_interfaces());
    assert_eq!(
        fired(&registry, &synched),
        vec![
            "configure_ssl",
            "create_servers_and_domains",
            "configure_designate_full",
        ]
    );

    let done = synched
        .with_state(DOMAINS_CREATED)
        .with_hook(HOOK_LEADER_ELECTED);
    assert_eq!(
        fired(&registry, &done),
        vec![
            "configure_ssl",
            "configure_designate_full",
            "sync_pool_manager_cache",
            "update_pools_on_election",
        ]
    );
}

#[test]
fn test_describe_renders_predicates() {
    let described = registry().describe();
    assert_eq!(
        described[0],
        ("install_packages".to_string(), "when_not(installed)".to_string())
    );
    let (_, update_pools) = described
        .iter()
        .find(|(name, _)| name == "update_pools")
        .unwrap();
    assert_eq!(
        update_pools,
        "when(db.synched) & when_file_changed(/etc/designate/pools.yaml)"
    );
}

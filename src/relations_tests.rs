// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `relations.rs`

use crate::relations::{
    dns_backend_slaves, Interface, RelationDescriptor, RelationProvider, Relations,
    StaticRelationProvider,
};
use crate::states;
use crate::testing::{
    amqp_relation, complete_relations, dns_backend_relation, identity_relation,
    shared_db_relation, unit_data, FakeRunner,
};
use std::sync::Arc;

#[test]
fn test_shared_db_requires_both_passwords() {
    assert!(!shared_db_relation(false).available());
    assert!(shared_db_relation(true).available());

    let only_one = RelationDescriptor::new(states::SHARED_DB).with_unit(
        "mysql/0",
        unit_data(&[("db_host", "10.0.0.10"), ("designate_password", "x")]),
    );
    assert!(only_one.connected());
    assert!(!only_one.available());
}

#[test]
fn test_amqp_and_identity_completeness() {
    assert!(amqp_relation().available());
    assert!(identity_relation().available());

    let partial = RelationDescriptor::new(states::AMQP)
        .with_unit("rabbitmq-server/0", unit_data(&[("hostname", "10.0.0.20")]));
    assert!(!partial.available());
}

#[test]
fn test_empty_values_do_not_count() {
    let relation = RelationDescriptor::new(states::AMQP).with_unit(
        "rabbitmq-server/0",
        unit_data(&[("hostname", "10.0.0.20"), ("password", "")]),
    );
    assert!(!relation.available());
}

#[test]
fn test_dns_backend_prefers_slave_address() {
    let relation = RelationDescriptor::new(states::DNS_BACKEND)
        .with_unit(
            "designate-bind/0",
            unit_data(&[
                ("private-address", "10.0.0.40"),
                ("slave-address", "192.168.1.40"),
                ("rndckey", "a2V5"),
                ("algorithm", "hmac-md5"),
            ]),
        )
        .with_unit(
            "designate-bind/1",
            unit_data(&[("private-address", "10.0.0.41")]),
        );

    let slaves = dns_backend_slaves(&relation);
    assert_eq!(slaves.len(), 1);
    assert_eq!(slaves[0].unit, "designate-bind/0");
    assert_eq!(slaves[0].address, "192.168.1.40");
    assert!(relation.available());
}

#[test]
fn test_ha_is_never_available() {
    let ha = RelationDescriptor::new(states::HA)
        .with_unit("hacluster/0", unit_data(&[("clustered", "yes")]));
    assert!(ha.connected());
    assert!(!Interface::Ha.is_complete(&ha));
    assert_eq!(ha.get("clustered").as_deref(), Some("yes"));
}

#[test]
fn test_payload_first_unit_wins() {
    let relation = RelationDescriptor::new(states::CLUSTER)
        .with_unit("designate/1", unit_data(&[("private-address", "10.0.0.2")]))
        .with_unit("designate/2", unit_data(&[("private-address", "10.0.0.3")]));

    assert_eq!(
        relation.payload().get("private-address").map(String::as_str),
        Some("10.0.0.2")
    );
    assert!(relation.available());
}

#[test]
fn test_payload_skips_empty_values_from_earlier_units() {
    let relation = RelationDescriptor::new(states::AMQP)
        .with_unit(
            "rabbitmq-server/0",
            unit_data(&[("hostname", "10.0.0.20"), ("password", "")]),
        )
        .with_unit(
            "rabbitmq-server/1",
            unit_data(&[("hostname", "10.0.0.21"), ("password", "s3cret")]),
        );

    let payload = relation.payload();
    assert_eq!(payload.get("password").map(String::as_str), Some("s3cret"));
    assert_eq!(payload.get("hostname").map(String::as_str), Some("10.0.0.20"));
    assert_eq!(relation.get("password").as_deref(), Some("s3cret"));
    assert!(relation.available());
}

#[test]
fn test_states_for_complete_relations() {
    let relations = complete_relations().with(RelationDescriptor::new(states::CLUSTER));
    let active = relations.states();

    for name in [
        states::SHARED_DB,
        states::AMQP,
        states::IDENTITY_SERVICE,
        states::DNS_BACKEND,
    ] {
        assert!(active.contains(&states::connected(name)), "{name}");
        assert!(active.contains(&states::available(name)), "{name}");
    }
    assert!(!active.contains("cluster.connected"));
}

#[test]
fn test_from_json() {
    let relations = Relations::from_json(
        r#"{"amqp": {"rabbitmq-server/0": {"hostname": "h", "password": "p"}}, "ha": {}}"#,
    )
    .unwrap();

    assert!(relations.is_available(states::AMQP));
    assert!(!relations.is_connected(states::HA));
    assert!(Relations::from_json(r#"{"amqp": {"rabbitmq-server/0": "x"}}"#).is_err());
}

#[tokio::test]
async fn test_static_provider_fills_undeclared_and_records_publish() {
    let provider = StaticRelationProvider::new(Relations::new().with(dns_backend_relation()));

    let snapshot = provider
        .snapshot(&[states::DNS_BACKEND, states::AMQP])
        .await
        .unwrap();
    assert!(snapshot.is_available(states::DNS_BACKEND));
    assert!(snapshot.get(states::AMQP).is_some());
    assert!(!snapshot.is_connected(states::AMQP));

    provider
        .publish(states::DNS_BACKEND, &unit_data(&[("k", "v")]))
        .await
        .unwrap();
    provider
        .publish(states::AMQP, &unit_data(&[("username", "designate")]))
        .await
        .unwrap();

    let published = provider.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[states::DNS_BACKEND]["k"], "v");
}

#[tokio::test]
async fn test_juju_provider_reads_hook_tools() {
    use crate::hookenv::HookTools;
    use crate::relations::JujuRelationProvider;

    let runner = Arc::new(FakeRunner::new());
    runner.respond("relation-ids --format=json amqp", r#"["amqp:4"]"#);
    runner.respond("relation-ids", "[]");
    runner.respond("relation-list --format=json -r amqp:4", r#"["rabbitmq-server/0"]"#);
    runner.respond(
        "relation-get --format=json -r amqp:4 - rabbitmq-server/0",
        r#"{"hostname": "10.0.0.20", "password": "secret"}"#,
    );

    let provider = JujuRelationProvider::new(HookTools::new(runner.clone()));
    let relations = provider
        .snapshot(&[states::AMQP, states::SHARED_DB])
        .await
        .unwrap();

    assert!(relations.is_available(states::AMQP));
    assert!(!relations.is_connected(states::SHARED_DB));

    provider
        .publish(states::AMQP, &unit_data(&[("username", "designate")]))
        .await
        .unwrap();
    assert_eq!(runner.count("relation-set -r amqp:4 username=designate"), 1);
}

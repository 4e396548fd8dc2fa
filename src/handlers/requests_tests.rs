// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `requests.rs`

use super::*;
use crate::config::CharmConfig;
use crate::leadership::MemoryLeaderStore;
use crate::relations::StaticRelationProvider;
use crate::testing::{complete_relations, FakeRunner};
use std::sync::Arc;

fn context(config: CharmConfig) -> (HookContext, StaticRelationProvider, Arc<FakeRunner>) {
    let runner = Arc::new(FakeRunner::new());
    let provider = StaticRelationProvider::new(complete_relations());
    let ctx = HookContext::builder(Arc::clone(&runner) as Arc<dyn crate::command::CommandRunner>)
        .config(config)
        .relations(complete_relations())
        .relation_provider(Arc::new(provider.clone()))
        .leader(Arc::new(MemoryLeaderStore::leader()))
        .unit_address("10.0.0.5")
        .build()
        .unwrap();
    (ctx, provider, runner)
}

#[test]
fn test_database_request_covers_both_prefixes() {
    let (ctx, _, _) = context(CharmConfig::default());
    let request = database_request(&ctx);

    assert_eq!(request["designate_database"], "designate");
    assert_eq!(request["designate_username"], "designate");
    assert_eq!(request["designate_hostname"], "10.0.0.5");
    assert_eq!(request["dpm_database"], "dpm");
    assert_eq!(request["dpm_username"], "dpm");
    assert_eq!(request.len(), 6);
}

#[test]
fn test_endpoint_prefers_vip() {
    let (ctx, _, _) = context(CharmConfig::default());
    assert_eq!(
        endpoint_request(&ctx).unwrap()["public_url"],
        "http://10.0.0.5:9001"
    );

    let (ctx, _, _) = context(CharmConfig {
        vip: Some("10.0.0.100 10.0.0.101".to_string()),
        ..CharmConfig::default()
    });
    let request = endpoint_request(&ctx).unwrap();
    assert_eq!(request["admin_url"], "http://10.0.0.100:9001");
    assert_eq!(request["service"], "designate");
    assert_eq!(request["region"], "RegionOne");
}

#[test]
fn test_ipv6_endpoint_is_bracketed() {
    let (mut ctx, _, _) = context(CharmConfig::default());
    ctx.unit_address = "2001:db8::5".to_string();
    assert_eq!(api_url(&ctx).unwrap().as_str(), "http://[2001:db8::5]:9001/");
}

#[test]
fn test_endpoint_uses_https_behind_tls() {
    let (ctx, _, _) = context(CharmConfig {
        ssl_cert: Some("Y2VydA==".to_string()),
        ssl_key: Some("a2V5".to_string()),
        ..CharmConfig::default()
    });
    assert_eq!(api_url(&ctx).unwrap().as_str(), "https://10.0.0.5:9001/");
}

#[tokio::test]
async fn test_requests_are_published_and_status_assessed() {
    let (mut ctx, provider, runner) = context(CharmConfig {
        rabbit_vhost: "designate".to_string(),
        ..CharmConfig::default()
    });

    SetupAmqp.run(&mut ctx).await.unwrap();
    SetupDatabase.run(&mut ctx).await.unwrap();
    SetupEndpoint.run(&mut ctx).await.unwrap();

    let published = provider.published();
    assert_eq!(published["amqp"]["vhost"], "designate");
    assert_eq!(published["shared-db"]["dpm_hostname"], "10.0.0.5");
    assert_eq!(published["identity-service"]["internal_url"], "http://10.0.0.5:9001");
    assert_eq!(runner.count("status-set"), 3);
}

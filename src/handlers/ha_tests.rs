// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ha.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::CharmConfig;
    use crate::leadership::MemoryLeaderStore;
    use crate::relations::{RelationDescriptor, Relations, StaticRelationProvider};
    use crate::testing::{unit_data, FakeRunner};
    use std::sync::Arc;

    fn context(config: CharmConfig) -> (HookContext, StaticRelationProvider) {
        let relations = Relations::new().with(
            RelationDescriptor::new(HA)
                .with_unit("hacluster/0", unit_data(&[("clustered", "yes")])),
        );
        let provider = StaticRelationProvider::new(relations.clone());
        let ctx = HookContext::builder(Arc::new(FakeRunner::new()))
            .config(config)
            .relations(relations)
            .relation_provider(Arc::new(provider.clone()))
            .leader(Arc::new(MemoryLeaderStore::leader()))
            .build()
            .unwrap();
        (ctx, provider)
    }

    #[test]
    fn no_settings_without_vip() {
        let (ctx, _) = context(CharmConfig::default());
        assert!(ha_settings(&ctx).is_none());
    }

    #[tokio::test]
    async fn publishes_vip_and_haproxy_resources() {
        let (mut ctx, provider) = context(CharmConfig {
            vip: Some("10.0.0.100 10.0.0.101".to_string()),
            vip_cidr: 16,
            ..CharmConfig::default()
        });

        ClusterConnected.run(&mut ctx).await.unwrap();

        let published = &provider.published()[HA];
        let resources: Value = serde_json::from_str(&published["json_resources"]).unwrap();
        assert_eq!(resources["res_designate_eth0_vip"], "ocf:heartbeat:IPaddr2");
        assert_eq!(resources["res_designate_eth0_vip_1"], "ocf:heartbeat:IPaddr2");
        assert_eq!(resources["res_designate_haproxy"], "lsb:haproxy");

        let params: Value = serde_json::from_str(&published["json_resource_params"]).unwrap();
        assert_eq!(
            params["res_designate_eth0_vip"],
            r#"params ip="10.0.0.100" cidr_netmask="16" nic="eth0""#
        );

        let clones: Value = serde_json::from_str(&published["json_clones"]).unwrap();
        assert_eq!(clones["cl_designate_haproxy"], "res_designate_haproxy");
        assert_eq!(published["corosync_mcastport"], "5424");
        assert_eq!(published["corosync_bindiface"], "eth0");
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster resources handed to the hacluster subordinate.
//!
//! Each configured VIP becomes an `IPaddr2` resource and haproxy runs as a
//! clone on every unit. The subordinate owns the corosync semantics; the charm
//! only publishes the resource descriptions as JSON strings.

use crate::context::HookContext;
use crate::registry::Action;
use crate::relations::UnitData;
use crate::states::HA;
use crate::status::assess_status;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::info;

const HAPROXY_RESOURCE: &str = "res_designate_haproxy";
const HAPROXY_CLONE: &str = "cl_designate_haproxy";

/// Resource name for a VIP on `iface`; several VIPs on one interface are numbered.
fn vip_resource(iface: &str, index: usize) -> String {
    if index == 0 {
        format!("res_designate_{iface}_vip")
    } else {
        format!("res_designate_{iface}_vip_{index}")
    }
}

/// Settings published on the `ha` relation, or `None` without VIPs.
#[must_use]
pub fn ha_settings(ctx: &HookContext) -> Option<UnitData> {
    let vips = ctx.config.vips();
    if vips.is_empty() {
        return None;
    }

    let iface = &ctx.config.vip_iface;
    let mut resources = Map::new();
    let mut params = Map::new();
    for (index, vip) in vips.iter().enumerate() {
        let name = vip_resource(iface, index);
        resources.insert(name.clone(), json!("ocf:heartbeat:IPaddr2"));
        params.insert(
            name,
            json!(format!(
                r#"params ip="{vip}" cidr_netmask="{}" nic="{iface}""#,
                ctx.config.vip_cidr
            )),
        );
    }
    resources.insert(HAPROXY_RESOURCE.to_string(), json!("lsb:haproxy"));
    params.insert(
        HAPROXY_RESOURCE.to_string(),
        json!(r#"op monitor interval="5s""#),
    );
    let clones = json!({ HAPROXY_CLONE: HAPROXY_RESOURCE });

    Some(UnitData::from([
        ("json_resources".to_string(), Value::Object(resources).to_string()),
        ("json_resource_params".to_string(), Value::Object(params).to_string()),
        ("json_clones".to_string(), clones.to_string()),
        ("corosync_bindiface".to_string(), ctx.config.ha_bindiface.clone()),
        ("corosync_mcastport".to_string(), ctx.config.ha_mcastport.to_string()),
    ]))
}

/// Publishes HA resources when the subordinate connects.
pub struct ClusterConnected;

#[async_trait]
impl Action for ClusterConnected {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        match ha_settings(ctx) {
            Some(settings) => {
                info!(vips = ?ctx.config.vips(), "Publishing HA resources");
                ctx.publish(HA, &settings).await?;
            }
            None => info!("No VIP configured; nothing to publish to hacluster"),
        }
        assess_status(ctx).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "ha_tests.rs"]
mod ha_tests;

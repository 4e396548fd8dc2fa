// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Peer relation updates.

use crate::context::HookContext;
use crate::registry::Action;
use crate::relations::UnitData;
use crate::states::CLUSTER;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Settings this unit publishes to its peers.
#[must_use]
pub fn peer_settings(ctx: &HookContext) -> UnitData {
    UnitData::from([("private-address".to_string(), ctx.unit_address.clone())])
}

/// Publishes this unit's address on the peer relation.
pub struct UpdatePeers;

#[async_trait]
impl Action for UpdatePeers {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        debug!(address = %ctx.unit_address, "Publishing address to peers");
        ctx.publish(CLUSTER, &peer_settings(ctx)).await
    }
}

#[cfg(test)]
#[path = "peers_tests.rs"]
mod peers_tests;

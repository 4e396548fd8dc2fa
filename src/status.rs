// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Workload status assessment.
//!
//! [`compute_status`] is a pure function of configuration, relations and
//! flags; [`assess_status`] publishes its result with `status-set`.

use crate::config::CharmConfig;
use crate::context::HookContext;
use crate::flags::FlagStore;
use crate::hookenv::WorkloadStatus;
use crate::relations::Relations;
use crate::states::{
    DB_SYNCHED, DOMAINS_CREATED, INSTALLED, REQUIRED_RELATIONS, RESTART_PENDING,
};
use anyhow::Result;
use tracing::info;

/// Status to report for the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitStatus {
    pub status: WorkloadStatus,
    pub message: String,
}

impl UnitStatus {
    fn new(status: WorkloadStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Work out the unit's status. The first problem found wins.
#[must_use]
pub fn compute_status(config: &CharmConfig, relations: &Relations, flags: &FlagStore) -> UnitStatus {
    let missing: Vec<&str> = REQUIRED_RELATIONS
        .iter()
        .copied()
        .filter(|r| !relations.is_connected(r))
        .collect();
    if !missing.is_empty() {
        return UnitStatus::new(
            WorkloadStatus::Blocked,
            format!("Missing relations: {}", missing.join(", ")),
        );
    }

    let problems = config.validate();
    if !problems.is_empty() {
        let reasons: Vec<String> = problems.iter().map(ToString::to_string).collect();
        return UnitStatus::new(
            WorkloadStatus::Blocked,
            format!("Invalid configuration: {}", reasons.join("; ")),
        );
    }

    let incomplete: Vec<&str> = REQUIRED_RELATIONS
        .iter()
        .copied()
        .filter(|r| !relations.is_available(r))
        .collect();
    if !incomplete.is_empty() {
        return UnitStatus::new(
            WorkloadStatus::Waiting,
            format!("Incomplete relations: {}", incomplete.join(", ")),
        );
    }

    if !flags.is_set(INSTALLED) {
        return UnitStatus::new(WorkloadStatus::Maintenance, "Installing packages");
    }
    if !flags.is_set(DB_SYNCHED) {
        return UnitStatus::new(WorkloadStatus::Waiting, "Waiting for database migration");
    }
    if !flags.is_set(DOMAINS_CREATED) {
        return UnitStatus::new(WorkloadStatus::Waiting, "Waiting for initial domains");
    }
    if flags.is_set(RESTART_PENDING) {
        return UnitStatus::new(WorkloadStatus::Maintenance, "Service restarts pending");
    }

    UnitStatus::new(WorkloadStatus::Active, "Unit is ready")
}

/// Compute and publish the unit's status.
///
/// # Errors
///
/// Returns an error if `status-set` fails.
pub async fn assess_status(ctx: &HookContext) -> Result<UnitStatus> {
    let status = compute_status(&ctx.config, &ctx.relations, &ctx.flags);
    info!(status = %status.status, message = %status.message, "Assessed unit status");
    ctx.tools.status_set(status.status, &status.message).await?;
    Ok(status)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;

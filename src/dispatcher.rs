// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Single-sweep dispatcher.
//!
//! One invocation runs exactly one pass:
//!
//! 1. Observe: persisted flags, relation states, `config.changed`, the hook
//!    name and the changed-file set for every watched path become a
//!    [`Snapshot`]
//! 2. Sweep: handlers are evaluated against that snapshot in registration
//!    order and matching actions run once each
//! 3. Commit: when no action failed, the observed file hashes and config hash
//!    are recorded so the next pass compares against them
//!
//! Actions write flags through the live store, but the snapshot is never
//! refreshed mid-pass. A milestone that depends on a flag set during this
//! pass advances on the next invocation.

use crate::conditions::Snapshot;
use crate::context::HookContext;
use crate::errors::CharmError;
use crate::hashing::file_content_hash;
use crate::registry::HandlerRegistry;
use crate::states::CONFIG_CHANGED;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What to do when an action fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Stop the pass at the first failure
    #[default]
    Abort,
    /// Log the failure and keep sweeping
    Continue,
}

/// A handler whose action returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedHandler {
    pub name: String,
    pub error: String,
    /// Reason code of the underlying charm error, when it is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Whether a plain retry of the hook is expected to succeed
    pub transient: bool,
}

impl FailedHandler {
    fn new(name: &str, error: &anyhow::Error) -> Self {
        let classified = CharmError::from_chain(error);
        Self {
            name: name.to_string(),
            error: format!("{error:#}"),
            reason: classified.as_ref().map(CharmError::status_reason),
            transient: classified.as_ref().is_none_or(CharmError::is_transient),
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub hook: Option<String>,
    /// Handlers whose action ran to completion
    pub fired: Vec<String>,
    /// Handlers whose predicate did not hold
    pub skipped: Vec<String>,
    pub failed: Vec<FailedHandler>,
    /// Handlers never evaluated because an earlier failure aborted the pass
    pub not_reached: Vec<String>,
    pub duration_ms: u64,
}

impl DispatchReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Everything observed before the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub snapshot: Snapshot,
    /// Watched path → current content hash
    pub file_hashes: BTreeMap<String, String>,
    pub config_hash: String,
}

/// Runs a registry against a hook context.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r HandlerRegistry,
    policy: FailurePolicy,
}

impl<'r> Dispatcher<'r> {
    #[must_use]
    pub fn new(registry: &'r HandlerRegistry) -> Self {
        Self {
            registry,
            policy: FailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the pass snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a watched file exists but cannot be read.
    pub fn observe(&self, ctx: &HookContext) -> Result<Observation> {
        let mut snapshot = Snapshot::new()
            .with_states(ctx.flags.flags().iter().cloned())
            .with_states(ctx.relations.states());

        let config_hash = ctx.config.hash();
        if ctx.flags.config_hash() != Some(config_hash.as_str()) {
            debug!("Charm configuration changed since the last pass");
            snapshot = snapshot.with_state(CONFIG_CHANGED);
        }

        if let Some(hook) = &ctx.hook {
            snapshot = snapshot.with_hook(hook);
        }

        let mut file_hashes = BTreeMap::new();
        for path in self.registry.watched_files() {
            let resolved = ctx.paths.resolve(&path);
            let hash = file_content_hash(&resolved)
                .with_context(|| format!("Failed to hash {}", resolved.display()))?;
            if ctx.flags.file_hash(&path) != Some(hash.as_str()) {
                debug!(path = %path, "Watched file changed");
                snapshot = snapshot.with_changed_file(&path);
            }
            file_hashes.insert(path, hash);
        }

        Ok(Observation {
            snapshot,
            file_hashes,
            config_hash,
        })
    }

    /// Run one pass.
    ///
    /// Action failures are reported in the returned [`DispatchReport`], not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be built or the observed hashes
    /// cannot be persisted.
    pub async fn dispatch(&self, ctx: &mut HookContext) -> Result<DispatchReport> {
        let start = Instant::now();
        let observation = self.observe(ctx)?;
        let snapshot = &observation.snapshot;

        info!(
            hook = ctx.hook.as_deref().unwrap_or("-"),
            states = snapshot.states().len(),
            changed_files = snapshot.changed_files().len(),
            "Starting dispatch pass"
        );

        let mut report = DispatchReport {
            hook: ctx.hook.clone(),
            ..DispatchReport::default()
        };

        let mut handlers = self.registry.handlers().iter();
        for handler in handlers.by_ref() {
            if !handler.predicate().evaluate(snapshot) {
                debug!(handler = handler.name(), "Predicate does not hold");
                report.skipped.push(handler.name().to_string());
                continue;
            }

            info!(handler = handler.name(), "Running handler");
            match handler.action().run(ctx).await {
                Ok(()) => report.fired.push(handler.name().to_string()),
                Err(e) => {
                    let failed = FailedHandler::new(handler.name(), &e);
                    error!(
                        handler = handler.name(),
                        reason = failed.reason.unwrap_or("Unknown"),
                        transient = failed.transient,
                        error = %failed.error,
                        "Handler failed"
                    );
                    report.failed.push(failed);
                    if self.policy == FailurePolicy::Abort {
                        break;
                    }
                }
            }
        }
        report.not_reached = handlers.map(|h| h.name().to_string()).collect();

        if report.is_success() {
            ctx.flags
                .record_file_hashes(observation.file_hashes)
                .context("Failed to record watched file hashes")?;
            ctx.flags
                .record_config_hash(&observation.config_hash)
                .context("Failed to record configuration hash")?;
        } else {
            warn!(
                failed = report.failed.len(),
                "Pass did not complete; changes will be seen again next invocation"
            );
        }

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            fired = report.fired.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            duration_ms = report.duration_ms,
            "Dispatch pass finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;

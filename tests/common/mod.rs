// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use designate_charm::command::CommandRunner;
use designate_charm::config::CharmConfig;
use designate_charm::context::{CharmPaths, HookContext};
use designate_charm::dispatcher::{DispatchReport, Dispatcher, FailurePolicy};
use designate_charm::flags::{default_state_path, FlagStore};
use designate_charm::handlers::build_registry;
use designate_charm::leadership::MemoryLeaderStore;
use designate_charm::relations::Relations;
use designate_charm::testing::{complete_relations, domains_config, FakeRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// One simulated unit: its own charm dir and filesystem root, plus a command
/// runner and leader store that may be shared with other units.
pub struct Unit {
    pub dir: TempDir,
    pub runner: Arc<FakeRunner>,
    pub leader: MemoryLeaderStore,
    pub relations: Relations,
    pub config: CharmConfig,
    pub address: String,
    pub policy: FailurePolicy,
}

impl Unit {
    /// A unit with every relation complete and both domains configured.
    pub fn new(runner: &Arc<FakeRunner>, leader: MemoryLeaderStore, address: &str) -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create unit dir"),
            runner: Arc::clone(runner),
            leader,
            relations: complete_relations(),
            config: domains_config(),
            address: address.to_string(),
            policy: FailurePolicy::Abort,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        default_state_path(&self.dir.path().join("charm"))
    }

    pub fn paths(&self) -> CharmPaths {
        CharmPaths::new(self.dir.path().join("root"))
    }

    /// Flags as persisted after the last invocation.
    pub fn flags(&self) -> FlagStore {
        FlagStore::open(self.state_path()).expect("state file must decode")
    }

    pub fn context(&self, hook: &str) -> HookContext {
        HookContext::builder(Arc::clone(&self.runner) as Arc<dyn CommandRunner>)
            .hook(Some(hook.to_string()))
            .config(self.config.clone())
            .flags(self.flags())
            .relations(self.relations.clone())
            .leader(Arc::new(self.leader.clone()))
            .paths(self.paths())
            .unit_address(self.address.clone())
            .build()
            .expect("release must be supported")
    }

    /// Run one hook invocation, as Juju would.
    pub async fn invoke(&self, hook: &str) -> DispatchReport {
        let registry = build_registry().expect("registry must build");
        let mut ctx = self.context(hook);
        Dispatcher::new(&registry)
            .with_policy(self.policy)
            .dispatch(&mut ctx)
            .await
            .expect("dispatch must not fail outright")
    }

    /// Invoke `hook` `times` times and return the last report.
    pub async fn invoke_times(&self, hook: &str, times: usize) -> DispatchReport {
        let mut report = DispatchReport::default();
        for _ in 0..times {
            report = self.invoke(hook).await;
        }
        report
    }
}

/// A leader unit with its own fake Designate.
pub fn leader_unit() -> Unit {
    Unit::new(
        &Arc::new(FakeRunner::new()),
        MemoryLeaderStore::leader(),
        "10.0.0.5",
    )
}

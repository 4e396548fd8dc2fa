// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-invocation context passed to every handler action.
//!
//! The hook binary builds one [`HookContext`] per invocation. It owns:
//! - The charm configuration and the release profile selected from it
//! - The durable flag store
//! - The relation snapshot read at startup
//! - Handles to the leader store, the relation provider and the command runner
//!
//! Actions receive it by `&mut` and never reach for global state.

use crate::command::CommandRunner;
use crate::config::CharmConfig;
use crate::constants::{
    APACHE_SITE_CONF, APACHE_SSL_DIR, CA_CERT_FILE, DESIGNATE_CONF,
    DESIGNATE_DEFAULT, DESIGNATE_DIR, HAPROXY_CONF, NEUTRON_SINK_FILE, NOVA_SINK_FILE,
    POOLS_YAML, RC_FILE, RNDC_KEY_CONF,
};
use crate::designate::DesignateClient;
use crate::errors::{ConfigError, DesignateError};
use crate::flags::FlagStore;
use crate::hookenv::HookTools;
use crate::leadership::LeaderStore;
use crate::relations::{RelationProvider, Relations, StaticRelationProvider, UnitData};
use crate::release::{self, ReleaseProfile};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem locations, optionally re-rooted for dry runs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharmPaths {
    root: PathBuf,
}

impl Default for CharmPaths {
    fn default() -> Self {
        Self::new("/")
    }
}

impl CharmPaths {
    /// Paths below `root` (use `/` in production).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an absolute system path below the root.
    #[must_use]
    pub fn resolve(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    #[must_use]
    pub fn designate_conf(&self) -> PathBuf {
        self.resolve(DESIGNATE_CONF)
    }

    #[must_use]
    pub fn rndc_key(&self) -> PathBuf {
        self.resolve(RNDC_KEY_CONF)
    }

    #[must_use]
    pub fn pools_yaml(&self) -> PathBuf {
        self.resolve(POOLS_YAML)
    }

    #[must_use]
    pub fn nova_sink(&self) -> PathBuf {
        self.resolve(NOVA_SINK_FILE)
    }

    #[must_use]
    pub fn neutron_sink(&self) -> PathBuf {
        self.resolve(NEUTRON_SINK_FILE)
    }

    #[must_use]
    pub fn default_openstack(&self) -> PathBuf {
        self.resolve(DESIGNATE_DEFAULT)
    }

    #[must_use]
    pub fn rc_file(&self) -> PathBuf {
        self.resolve(RC_FILE)
    }

    #[must_use]
    pub fn haproxy_conf(&self) -> PathBuf {
        self.resolve(HAPROXY_CONF)
    }

    #[must_use]
    pub fn apache_site(&self) -> PathBuf {
        self.resolve(APACHE_SITE_CONF)
    }

    /// System path (not re-rooted) of the certificate served for `cn`.
    #[must_use]
    pub fn ssl_cert_system_path(cn: &str) -> String {
        format!("{APACHE_SSL_DIR}/cert_{cn}")
    }

    /// System path (not re-rooted) of the key for `cn`.
    #[must_use]
    pub fn ssl_key_system_path(cn: &str) -> String {
        format!("{APACHE_SSL_DIR}/key_{cn}")
    }

    #[must_use]
    pub fn ssl_cert(&self, cn: &str) -> PathBuf {
        self.resolve(&Self::ssl_cert_system_path(cn))
    }

    #[must_use]
    pub fn ssl_key(&self, cn: &str) -> PathBuf {
        self.resolve(&Self::ssl_key_system_path(cn))
    }

    #[must_use]
    pub fn ca_cert(&self) -> PathBuf {
        self.resolve(CA_CERT_FILE)
    }

    /// System path (not re-rooted) of the key file for one external secondary.
    #[must_use]
    pub fn slave_rndc_key_system_path(sanitized_address: &str) -> String {
        format!("{DESIGNATE_DIR}/rndc_{sanitized_address}.key")
    }

    #[must_use]
    pub fn slave_rndc_key(&self, sanitized_address: &str) -> PathBuf {
        self.resolve(&Self::slave_rndc_key_system_path(sanitized_address))
    }
}

/// Shared context for one hook invocation.
pub struct HookContext {
    /// Hook being run, if known
    pub hook: Option<String>,

    /// Decoded charm configuration
    pub config: CharmConfig,

    /// Release profile selected from `openstack-origin`
    pub release: &'static ReleaseProfile,

    /// Durable flags
    pub flags: FlagStore,

    /// Relation snapshot taken at startup
    pub relations: Relations,

    /// Outbound relation settings go through here
    pub relation_provider: Arc<dyn RelationProvider>,

    /// Leader settings
    pub leader: Arc<dyn LeaderStore>,

    /// Every external command goes through here
    pub runner: Arc<dyn CommandRunner>,

    /// Hook tool client sharing `runner`
    pub tools: HookTools,

    /// Filesystem layout
    pub paths: CharmPaths,

    /// This unit's private address
    pub unit_address: String,
}

impl std::fmt::Debug for HookContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookContext")
            .field("hook", &self.hook)
            .field("release", &self.release.name)
            .field("flags", self.flags.flags())
            .field("paths", &self.paths)
            .field("unit_address", &self.unit_address)
            .finish_non_exhaustive()
    }
}

impl HookContext {
    /// Start building a context around a command runner.
    pub fn builder(runner: Arc<dyn CommandRunner>) -> HookContextBuilder {
        HookContextBuilder {
            runner,
            hook: None,
            config: CharmConfig::default(),
            flags: FlagStore::in_memory(),
            relations: Relations::new(),
            relation_provider: None,
            leader: None,
            paths: CharmPaths::default(),
            unit_address: "127.0.0.1".to_string(),
        }
    }

    /// Designate client authenticated with the rendered rc file.
    ///
    /// # Errors
    ///
    /// Returns [`DesignateError::Credentials`] until the rc file exists.
    pub fn designate_client(&self) -> Result<DesignateClient, DesignateError> {
        DesignateClient::from_rc_file(Arc::clone(&self.runner), &self.paths.rc_file())
    }

    /// Publish this unit's settings on a relation.
    ///
    /// # Errors
    ///
    /// Returns any relation tool failure.
    pub async fn publish(&self, relation: &str, settings: &UnitData) -> anyhow::Result<()> {
        self.relation_provider.publish(relation, settings).await
    }
}

/// Builder for [`HookContext`].
pub struct HookContextBuilder {
    runner: Arc<dyn CommandRunner>,
    hook: Option<String>,
    config: CharmConfig,
    flags: FlagStore,
    relations: Relations,
    relation_provider: Option<Arc<dyn RelationProvider>>,
    leader: Option<Arc<dyn LeaderStore>>,
    paths: CharmPaths,
    unit_address: String,
}

impl HookContextBuilder {
    #[must_use]
    pub fn hook(mut self, hook: Option<String>) -> Self {
        self.hook = hook;
        self
    }

    #[must_use]
    pub fn config(mut self, config: CharmConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: FlagStore) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn relations(mut self, relations: Relations) -> Self {
        self.relations = relations;
        self
    }

    #[must_use]
    pub fn relation_provider(mut self, provider: Arc<dyn RelationProvider>) -> Self {
        self.relation_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn leader(mut self, leader: Arc<dyn LeaderStore>) -> Self {
        self.leader = Some(leader);
        self
    }

    #[must_use]
    pub fn paths(mut self, paths: CharmPaths) -> Self {
        self.paths = paths;
        self
    }

    #[must_use]
    pub fn unit_address(mut self, address: impl Into<String>) -> Self {
        self.unit_address = address.into();
        self
    }

    /// Finish the context, selecting the release profile.
    ///
    /// Without an explicit relation provider, outbound settings are recorded
    /// by a [`StaticRelationProvider`] over the snapshot; without an explicit
    /// leader store, leader settings go through the Juju hook tools.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedRelease`] for an unknown release.
    pub fn build(self) -> Result<HookContext, ConfigError> {
        let release = release::select(&self.config.openstack_origin)?;
        let relation_provider = self.relation_provider.unwrap_or_else(|| {
            Arc::new(StaticRelationProvider::new(self.relations.clone()))
        });
        let leader = self.leader.unwrap_or_else(|| {
            Arc::new(crate::leadership::JujuLeaderStore::new(Arc::clone(&self.runner)))
        });

        Ok(HookContext {
            hook: self.hook,
            config: self.config,
            release,
            flags: self.flags,
            relations: self.relations,
            relation_provider,
            leader,
            tools: HookTools::new(Arc::clone(&self.runner)),
            runner: self.runner,
            paths: self.paths,
            unit_address: self.unit_address,
        })
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;

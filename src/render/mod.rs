// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration rendering.
//!
//! Rendering happens in two steps:
//! 1. [`base_config`] / [`full_config`] turn a [`RenderContext`] into a list of
//!    [`RenderedFile`]s (pure, no I/O apart from checking which sink files exist)
//! 2. [`write_files`] writes the files whose content changed and reports which
//!    services must restart
//!
//! The base set is enough to run `designate-manage database sync`; the full set
//! adds the notification sinks, the per-secondary RNDC keys and `pools.yaml`.
//! Clustered units also get `haproxy.cfg` in the base set, see [`frontends`].

pub mod adapters;
pub mod frontends;
pub mod pools;
pub mod rndc;
pub mod templates;

use crate::config::{CharmConfig, DnsSlave};
use crate::constants::{
    CONFIG_FILE_MODE, HAPROXY_SERVICE, RNDC_KEY_FILE_MODE, RNDC_KEY_NAME, SECRET_FILE_MODE,
    SERVICE_CONFIG_FILE_MODE,
};
use crate::context::{CharmPaths, HookContext};
use crate::designate::Credentials;
use crate::io::{atomic_write, read_optional};
use crate::release::ReleaseProfile;
use crate::relations::dns_backend_slaves;
use crate::states;
use adapters::{
    backend_pool_members, config_pool_members, AmqpAdapter, DatabaseAdapter, IdentityAdapter,
    PoolMember,
};
use anyhow::{Context, Result};
use frontends::ApiPorts;
use rndc::RndcKeyData;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Everything the templates need, resolved from one hook context.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub config: &'a CharmConfig,
    pub release: &'static ReleaseProfile,
    pub paths: &'a CharmPaths,
    /// Address designate-mdns listens on; pool targets transfer from here
    pub unit_address: &'a str,
    pub database: DatabaseAdapter,
    pub amqp: AmqpAdapter,
    pub identity: IdentityAdapter,
    pub credentials: Credentials,
    /// Key shared with the dns-backend secondaries
    pub backend_key: RndcKeyData,
    pub backend_members: Vec<PoolMember>,
    /// Valid `dns-slaves` entries; malformed ones are reported by status assessment
    pub config_slaves: Vec<DnsSlave>,
    pub nova_domain_id: Option<String>,
    pub neutron_domain_id: Option<String>,
    pub ports: ApiPorts,
    /// Units haproxy balances over, this one included
    pub peers: Vec<String>,
}

impl<'a> RenderContext<'a> {
    /// Resolve adapters from the relation snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if any required interface is incomplete.
    pub fn from_hook(ctx: &'a HookContext) -> Result<Self> {
        let relation = |name: &str| {
            ctx.relations
                .get(name)
                .with_context(|| format!("{name} relation is not connected"))
        };

        let shared_db = relation(states::SHARED_DB)?;
        let database = DatabaseAdapter::from_relation(shared_db)
            .context("shared-db relation has not published database credentials")?;
        let amqp = AmqpAdapter::from_relation(relation(states::AMQP)?)
            .context("amqp relation has not published broker credentials")?;
        let identity_relation = relation(states::IDENTITY_SERVICE)?;
        let identity = IdentityAdapter::from_relation(identity_relation)
            .context("identity-service relation has not published service credentials")?;
        let credentials = Credentials::from_identity(&identity_relation.payload(), &ctx.config.region)
            .context("identity-service relation has not published service credentials")?;

        let backend = relation(states::DNS_BACKEND)?;
        let first_slave = dns_backend_slaves(backend)
            .into_iter()
            .next()
            .context("dns-backend relation has not published an rndc key")?;
        let backend_key = RndcKeyData {
            name: RNDC_KEY_NAME.to_string(),
            algorithm: first_slave.algorithm,
            secret: first_slave.rndc_key,
        };

        let config_slaves = ctx
            .config
            .dns_slaves
            .split_whitespace()
            .filter_map(|entry| match DnsSlave::parse(entry) {
                Ok(slave) => Some(slave),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed dns-slaves entry");
                    None
                }
            })
            .collect();

        Ok(Self {
            config: &ctx.config,
            release: ctx.release,
            paths: &ctx.paths,
            unit_address: &ctx.unit_address,
            database,
            amqp,
            identity,
            credentials,
            backend_key,
            backend_members: backend_pool_members(backend),
            config_slaves,
            nova_domain_id: None,
            neutron_domain_id: None,
            ports: frontends::api_ports(ctx),
            peers: frontends::peer_addresses(ctx),
        })
    }

    /// Attach the ids of the nova and neutron domains, when they exist.
    #[must_use]
    pub fn with_domain_ids(mut self, nova: Option<String>, neutron: Option<String>) -> Self {
        self.nova_domain_id = nova;
        self.neutron_domain_id = neutron;
        self
    }

    /// Relation secondaries followed by configured ones.
    #[must_use]
    pub fn pool_members(&self) -> Vec<PoolMember> {
        let mut members = self.backend_members.clone();
        members.extend(config_pool_members(&self.config_slaves));
        members
    }

    fn services(&self) -> Vec<&'static str> {
        self.release.services.to_vec()
    }
}

/// One file to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub content: String,
    pub mode: u32,
    /// Services to restart when this file changes
    pub services: Vec<&'static str>,
}

impl RenderedFile {
    #[must_use]
    pub fn new(path: PathBuf, content: String, mode: u32) -> Self {
        Self {
            path,
            content,
            mode,
            services: Vec::new(),
        }
    }

    #[must_use]
    pub fn restarts(mut self, services: Vec<&'static str>) -> Self {
        self.services = services;
        self
    }
}

/// Files needed before the database can be synced.
#[must_use]
pub fn base_config(ctx: &RenderContext<'_>) -> Vec<RenderedFile> {
    let paths = ctx.paths;
    let mut files = vec![
        RenderedFile::new(paths.rc_file(), ctx.credentials.render(), SECRET_FILE_MODE),
        RenderedFile::new(
            paths.designate_conf(),
            templates::designate_conf(ctx),
            SERVICE_CONFIG_FILE_MODE,
        )
        .restarts(ctx.services()),
        RenderedFile::new(
            paths.rndc_key(),
            ctx.backend_key.to_key_file(),
            RNDC_KEY_FILE_MODE,
        )
        .restarts(ctx.services()),
        RenderedFile::new(
            paths.default_openstack(),
            templates::default_openstack(
                paths.nova_sink().exists(),
                paths.neutron_sink().exists(),
            ),
            CONFIG_FILE_MODE,
        )
        .restarts(ctx.services()),
    ];

    if ctx.ports.haproxy.is_some() {
        files.push(
            RenderedFile::new(
                paths.haproxy_conf(),
                frontends::haproxy_cfg(&ctx.ports, &ctx.peers),
                CONFIG_FILE_MODE,
            )
            .restarts(vec![HAPROXY_SERVICE]),
        );
    }
    files
}

/// The complete file set for a synced deployment.
///
/// # Errors
///
/// Returns an error if the pool descriptor cannot be serialized.
pub fn full_config(ctx: &RenderContext<'_>) -> Result<Vec<RenderedFile>> {
    let paths = ctx.paths;
    let mut files = base_config(ctx);

    // Sinks referenced by /etc/default/openstack must include the ones
    // rendered in this pass, not only those already on disk.
    let nova = ctx.nova_domain_id.is_some() || paths.nova_sink().exists();
    let neutron = ctx.neutron_domain_id.is_some() || paths.neutron_sink().exists();
    if let Some(file) = files
        .iter_mut()
        .find(|f| f.path == paths.default_openstack())
    {
        file.content = templates::default_openstack(nova, neutron);
    }

    if let Some(id) = &ctx.nova_domain_id {
        files.push(
            RenderedFile::new(paths.nova_sink(), templates::nova_sink(id), CONFIG_FILE_MODE)
                .restarts(ctx.services()),
        );
    }
    if let Some(id) = &ctx.neutron_domain_id {
        files.push(
            RenderedFile::new(
                paths.neutron_sink(),
                templates::neutron_sink(id),
                CONFIG_FILE_MODE,
            )
            .restarts(ctx.services()),
        );
    }

    for slave in &ctx.config_slaves {
        files.push(RenderedFile::new(
            paths.slave_rndc_key(&slave.sanitized_address()),
            RndcKeyData::for_slave(&slave.key).to_key_file(),
            RNDC_KEY_FILE_MODE,
        ));
    }

    let pool = pools::default_pool(
        &ctx.config.nameservers(),
        &ctx.pool_members(),
        ctx.unit_address,
    );
    files.push(RenderedFile::new(
        paths.pools_yaml(),
        pools::to_yaml(&[pool])?,
        CONFIG_FILE_MODE,
    ));

    Ok(files)
}

/// What [`write_files`] changed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    pub written: Vec<PathBuf>,
    /// Services to restart, in release order, without duplicates
    pub restart: Vec<&'static str>,
}

impl RenderOutcome {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.written.is_empty()
    }
}

/// Write every file whose content differs from what is on disk.
///
/// # Errors
///
/// Returns an error if a file cannot be read or written; files written before
/// the failure stay written.
pub fn write_files(files: &[RenderedFile]) -> Result<RenderOutcome> {
    let mut outcome = RenderOutcome::default();

    for file in files {
        let existing = read_optional(&file.path)
            .with_context(|| format!("Failed to read {}", file.path.display()))?;
        if existing.as_deref() == Some(file.content.as_bytes()) {
            debug!(path = %file.path.display(), "Rendered file unchanged");
            continue;
        }

        atomic_write(&file.path, file.content.as_bytes(), file.mode)
            .with_context(|| format!("Failed to write {}", file.path.display()))?;
        info!(path = %file.path.display(), "Rendered file");

        outcome.written.push(file.path.clone());
        for service in &file.services {
            if !outcome.restart.contains(service) {
                outcome.restart.push(service);
            }
        }
    }

    Ok(outcome)
}

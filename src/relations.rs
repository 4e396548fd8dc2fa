// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Relation snapshots.
//!
//! A [`RelationProvider`] reads, once per invocation, what every remote unit
//! published on each declared relation. Each relation then reports two derived
//! states for the condition evaluator:
//!
//! - `<relation>.connected`: at least one remote unit is present
//! - `<relation>.available`: the remote side published the full data contract
//!   this charm needs (see [`Interface::is_complete`])
//!
//! The provider is also the way out: outbound settings are published through
//! [`RelationProvider::publish`] on every relation id of a relation.

use crate::hookenv::{settings_from_json, HookTools};
use crate::states;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Settings published by one unit.
pub type UnitData = BTreeMap<String, String>;

/// The interfaces this charm speaks, one per declared relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    SharedDb,
    Amqp,
    IdentityService,
    DnsBackend,
    Cluster,
    Ha,
}

const IDENTITY_KEYS: [&str; 7] = [
    "service_host",
    "service_port",
    "auth_host",
    "auth_port",
    "service_tenant",
    "service_username",
    "service_password",
];

impl Interface {
    /// Interface for a declared relation name.
    #[must_use]
    pub fn from_relation(name: &str) -> Option<Self> {
        match name {
            states::SHARED_DB => Some(Self::SharedDb),
            states::AMQP => Some(Self::Amqp),
            states::IDENTITY_SERVICE => Some(Self::IdentityService),
            states::DNS_BACKEND => Some(Self::DnsBackend),
            states::CLUSTER => Some(Self::Cluster),
            states::HA => Some(Self::Ha),
            _ => None,
        }
    }

    /// Whether the remote side published everything this charm needs.
    #[must_use]
    pub fn is_complete(self, relation: &RelationDescriptor) -> bool {
        if !relation.connected() {
            return false;
        }
        let payload = relation.payload();
        let has = |key: &str| payload.get(key).is_some_and(|v| !v.is_empty());

        match self {
            Self::SharedDb => {
                has("db_host")
                    && crate::constants::DATABASE_PREFIXES
                        .iter()
                        .all(|prefix| has(&format!("{prefix}_password")))
            }
            Self::Amqp => has("hostname") && has("password"),
            Self::IdentityService => IDENTITY_KEYS.iter().all(|key| has(key)),
            Self::DnsBackend => !dns_backend_slaves(relation).is_empty(),
            Self::Cluster => relation
                .units
                .values()
                .any(|data| data.get("private-address").is_some_and(|v| !v.is_empty())),
            Self::Ha => false,
        }
    }
}

/// One DNS secondary published over the dns-backend relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSlave {
    /// Remote unit name (e.g. `designate-bind/0`)
    pub unit: String,
    pub address: String,
    pub rndc_key: String,
    pub algorithm: String,
}

/// Secondaries that published an address, an RNDC key and an algorithm.
#[must_use]
pub fn dns_backend_slaves(relation: &RelationDescriptor) -> Vec<BackendSlave> {
    relation
        .units
        .iter()
        .filter_map(|(unit, data)| {
            let non_empty = |key: &str| data.get(key).filter(|v| !v.is_empty()).cloned();
            Some(BackendSlave {
                unit: unit.clone(),
                address: non_empty("slave-address").or_else(|| non_empty("private-address"))?,
                rndc_key: non_empty("rndckey")?,
                algorithm: non_empty("algorithm")?,
            })
        })
        .collect()
}

/// What is known about one relation during this invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub name: String,
    /// Remote unit → published settings
    pub units: BTreeMap<String, UnitData>,
}

impl RelationDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>, data: UnitData) -> Self {
        self.units.insert(unit.into(), data);
        self
    }

    #[must_use]
    pub fn connected(&self) -> bool {
        !self.units.is_empty()
    }

    #[must_use]
    pub fn available(&self) -> bool {
        Interface::from_relation(&self.name).is_some_and(|iface| iface.is_complete(self))
    }

    /// Merged view over all remote units; for a key published by several
    /// units the first unit (by name) with a non-empty value wins.
    #[must_use]
    pub fn payload(&self) -> UnitData {
        let mut merged = UnitData::new();
        for data in self.units.values() {
            for (key, value) in data {
                match merged.get_mut(key) {
                    Some(existing) if existing.is_empty() => existing.clone_from(value),
                    Some(_) => {}
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        merged
    }

    /// A value from the merged payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let mut values = self.units.values().filter_map(|data| data.get(key));
        let first = values.next()?;
        if first.is_empty() {
            Some(values.find(|v| !v.is_empty()).unwrap_or(first).clone())
        } else {
            Some(first.clone())
        }
    }
}

/// Snapshot of every declared relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    relations: BTreeMap<String, RelationDescriptor>,
}

impl Relations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: RelationDescriptor) {
        self.relations.insert(relation.name.clone(), relation);
    }

    #[must_use]
    pub fn with(mut self, relation: RelationDescriptor) -> Self {
        self.insert(relation);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.get(name)
    }

    #[must_use]
    pub fn is_connected(&self, name: &str) -> bool {
        self.get(name).is_some_and(RelationDescriptor::connected)
    }

    #[must_use]
    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some_and(RelationDescriptor::available)
    }

    /// The `.connected` / `.available` states to merge into a dispatch snapshot.
    #[must_use]
    pub fn states(&self) -> BTreeSet<String> {
        let mut active = BTreeSet::new();
        for relation in self.relations.values() {
            if relation.connected() {
                active.insert(states::connected(&relation.name));
            }
            if relation.available() {
                active.insert(states::available(&relation.name));
            }
        }
        active
    }

    /// Load a snapshot from JSON of the form
    /// `{"relation": {"remote/0": {"key": "value"}}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not of that shape.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
            serde_json::from_str(json).context("Invalid relation snapshot")?;
        let mut relations = Self::new();
        for (name, units) in raw {
            let mut descriptor = RelationDescriptor::new(&name);
            for (unit, value) in units {
                let data = settings_from_json(value).with_context(|| {
                    format!("Settings for {unit} on {name} must be an object")
                })?;
                descriptor.units.insert(unit, data);
            }
            relations.insert(descriptor);
        }
        Ok(relations)
    }
}

/// Source of relation snapshots and sink for outbound relation settings.
#[async_trait]
pub trait RelationProvider: Send + Sync {
    /// Read every relation in `declared`.
    async fn snapshot(&self, declared: &[&str]) -> Result<Relations>;

    /// Publish this unit's settings on every relation id of `relation`.
    async fn publish(&self, relation: &str, settings: &UnitData) -> Result<()>;
}

/// Reads relations through `relation-ids`, `relation-list` and `relation-get`.
pub struct JujuRelationProvider {
    tools: HookTools,
}

impl JujuRelationProvider {
    pub fn new(tools: HookTools) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl RelationProvider for JujuRelationProvider {
    async fn snapshot(&self, declared: &[&str]) -> Result<Relations> {
        let mut relations = Relations::new();
        for name in declared {
            let mut descriptor = RelationDescriptor::new(*name);
            for relation_id in self.tools.relation_ids(name).await? {
                for unit in self.tools.relation_list(&relation_id).await? {
                    let data = self.tools.relation_get(&relation_id, &unit).await?;
                    descriptor.units.insert(unit, data);
                }
            }
            debug!(
                relation = name,
                units = descriptor.units.len(),
                available = descriptor.available(),
                "Read relation"
            );
            relations.insert(descriptor);
        }
        Ok(relations)
    }

    async fn publish(&self, relation: &str, settings: &UnitData) -> Result<()> {
        for relation_id in self.tools.relation_ids(relation).await? {
            self.tools.relation_set(&relation_id, settings).await?;
        }
        Ok(())
    }
}

/// Serves a fixed snapshot and records what actions publish.
#[derive(Debug, Clone, Default)]
pub struct StaticRelationProvider {
    relations: Relations,
    published: Arc<Mutex<BTreeMap<String, UnitData>>>,
}

impl StaticRelationProvider {
    #[must_use]
    pub fn new(relations: Relations) -> Self {
        Self {
            relations,
            published: Arc::default(),
        }
    }

    /// Load the snapshot from a JSON file (see [`Relations::from_json`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read relation snapshot {}", path.display()))?;
        Ok(Self::new(Relations::from_json(&json)?))
    }

    /// Everything published so far, per relation.
    #[must_use]
    pub fn published(&self) -> BTreeMap<String, UnitData> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RelationProvider for StaticRelationProvider {
    async fn snapshot(&self, declared: &[&str]) -> Result<Relations> {
        let mut relations = Relations::new();
        for name in declared {
            relations.insert(
                self.relations
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| RelationDescriptor::new(*name)),
            );
        }
        Ok(relations)
    }

    async fn publish(&self, relation: &str, settings: &UnitData) -> Result<()> {
        if !self.relations.is_connected(relation) {
            return Ok(());
        }
        let mut published = self
            .published
            .lock()
            .map_err(|_| anyhow::anyhow!("published settings lock poisoned"))?;
        published
            .entry(relation.to_string())
            .or_default()
            .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

#[cfg(test)]
#[path = "relations_tests.rs"]
mod relations_tests;

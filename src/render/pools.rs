// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The pool topology descriptor consumed by `designate-manage pool update`.

use super::adapters::PoolMember;
use crate::constants::{DEFAULT_POOL_ID, MDNS_PORT, RNDC_PORT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub ns_records: Vec<NsRecord>,
    pub nameservers: Vec<HostPort>,
    pub targets: Vec<Target>,
    #[serde(default)]
    pub also_notifies: Vec<HostPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsRecord {
    pub hostname: String,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    /// Where the secondary transfers zones from (designate-mdns)
    pub masters: Vec<HostPort>,
    pub options: TargetOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOptions {
    pub host: String,
    pub port: u16,
    pub rndc_host: String,
    pub rndc_port: u16,
    pub rndc_key_file: String,
}

/// Build the default pool.
///
/// `ns_names` become the pool's NS records in order with increasing priority;
/// every member becomes a nameserver and a bind9 target mastered from the
/// mini-DNS service on `mdns_address`.
#[must_use]
pub fn default_pool(ns_names: &[String], members: &[PoolMember], mdns_address: &str) -> Pool {
    Pool {
        name: "default".to_string(),
        id: DEFAULT_POOL_ID.to_string(),
        description: "Default Pool".to_string(),
        attributes: BTreeMap::new(),
        ns_records: ns_names
            .iter()
            .zip(1u32..)
            .map(|(hostname, n)| NsRecord {
                hostname: hostname.clone(),
                priority: n * 10,
            })
            .collect(),
        nameservers: members
            .iter()
            .map(|m| HostPort {
                host: m.address.clone(),
                port: m.port,
            })
            .collect(),
        targets: members
            .iter()
            .map(|m| Target {
                kind: "bind9".to_string(),
                description: m.nameserver.clone(),
                masters: vec![HostPort {
                    host: mdns_address.to_string(),
                    port: MDNS_PORT,
                }],
                options: TargetOptions {
                    host: m.address.clone(),
                    port: m.port,
                    rndc_host: m.address.clone(),
                    rndc_port: RNDC_PORT,
                    rndc_key_file: m.rndc_key_file.clone(),
                },
            })
            .collect(),
        also_notifies: Vec::new(),
    }
}

/// Serialize pools to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_yaml(pools: &[Pool]) -> Result<String> {
    serde_yaml::to_string(pools).context("Failed to serialize pools.yaml")
}

/// Parse a pools document.
///
/// # Errors
///
/// Returns an error if the YAML does not describe a list of pools.
pub fn from_yaml(yaml: &str) -> Result<Vec<Pool>> {
    serde_yaml::from_str(yaml).context("Failed to parse pools.yaml")
}

#[cfg(test)]
#[path = "pools_tests.rs"]
mod pools_tests;

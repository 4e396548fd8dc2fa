// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed views over relation payloads and config used by the templates.

use crate::config::{CharmConfig, DnsSlave};
use crate::constants::{DNS_PORT, POOL_MANAGER_DATABASE};
use crate::context::CharmPaths;
use crate::relations::{dns_backend_slaves, RelationDescriptor};
use url::Url;

/// Connection data from the shared-db relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseAdapter {
    pub host: String,
    pub designate_password: String,
    pub dpm_password: String,
}

impl DatabaseAdapter {
    #[must_use]
    pub fn from_relation(relation: &RelationDescriptor) -> Option<Self> {
        Some(Self {
            host: relation.get("db_host")?,
            designate_password: relation.get("designate_password")?,
            dpm_password: relation.get("dpm_password")?,
        })
    }

    fn uri(&self, user: &str, password: &str, database: &str) -> String {
        let Ok(mut url) = Url::parse(&format!("mysql://{}", self.host)) else {
            return format!("mysql://{user}:{password}@{}/{database}", self.host);
        };
        // Only fails for cannot-be-a-base URLs, which mysql:// never is
        let _ = url.set_username(user);
        let _ = url.set_password(Some(password));
        url.set_path(database);
        url.to_string()
    }

    /// SQLAlchemy URI for the main database.
    #[must_use]
    pub fn designate_uri(&self, config: &CharmConfig) -> String {
        self.uri(
            &config.database_user,
            &self.designate_password,
            &config.database,
        )
    }

    /// SQLAlchemy URI for the pool manager cache database.
    #[must_use]
    pub fn pool_manager_uri(&self) -> String {
        self.uri(
            POOL_MANAGER_DATABASE,
            &self.dpm_password,
            POOL_MANAGER_DATABASE,
        )
    }
}

/// Broker data from the amqp relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmqpAdapter {
    /// Every broker that published a hostname, sorted by unit name
    pub hosts: Vec<String>,
    pub password: String,
}

impl AmqpAdapter {
    #[must_use]
    pub fn from_relation(relation: &RelationDescriptor) -> Option<Self> {
        let hosts: Vec<String> = relation
            .units
            .values()
            .filter_map(|data| data.get("hostname").filter(|h| !h.is_empty()).cloned())
            .collect();
        if hosts.is_empty() {
            return None;
        }
        Some(Self {
            hosts,
            password: relation.get("password")?,
        })
    }
}

/// Keystone data from the identity-service relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAdapter {
    pub auth_uri: String,
    pub auth_url: String,
    pub tenant: String,
    pub username: String,
    pub password: String,
}

impl IdentityAdapter {
    #[must_use]
    pub fn from_relation(relation: &RelationDescriptor) -> Option<Self> {
        let protocol = |key: &str| relation.get(key).unwrap_or_else(|| "http".to_string());
        Some(Self {
            auth_uri: format!(
                "{}://{}:{}",
                protocol("service_protocol"),
                relation.get("service_host")?,
                relation.get("service_port")?
            ),
            auth_url: format!(
                "{}://{}:{}",
                protocol("auth_protocol"),
                relation.get("auth_host")?,
                relation.get("auth_port")?
            ),
            tenant: relation.get("service_tenant")?,
            username: relation.get("service_username")?,
            password: relation.get("service_password")?,
        })
    }
}

/// One nameserver/target pair in the default pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMember {
    /// `nameserver_<sanitized>`; also used as the pool target name
    pub nameserver: String,
    pub address: String,
    pub port: u16,
    /// System path of the RNDC key used to control this secondary
    pub rndc_key_file: String,
}

/// Pool members from the dns-backend relation, sharing `/etc/designate/rndc.key`.
#[must_use]
pub fn backend_pool_members(relation: &RelationDescriptor) -> Vec<PoolMember> {
    dns_backend_slaves(relation)
        .into_iter()
        .map(|slave| PoolMember {
            nameserver: format!("nameserver_{}", slave.unit.replace(['/', '-'], "_")),
            address: slave.address,
            port: DNS_PORT,
            rndc_key_file: crate::constants::RNDC_KEY_CONF.to_string(),
        })
        .collect()
}

/// Pool members from the `dns-slaves` option, each with its own key file.
#[must_use]
pub fn config_pool_members(slaves: &[DnsSlave]) -> Vec<PoolMember> {
    slaves
        .iter()
        .map(|slave| {
            let sanitized = slave.sanitized_address();
            PoolMember {
                nameserver: format!("nameserver_{sanitized}"),
                address: slave.address.clone(),
                port: DNS_PORT,
                rndc_key_file: CharmPaths::slave_rndc_key_system_path(&sanitized),
            }
        })
        .collect()
}

/// `a, b, c` join used by the INI templates.
#[must_use]
pub fn comma_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items.into_iter().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[path = "adapters_tests.rs"]
mod adapters_tests;

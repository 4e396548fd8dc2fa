// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator-supplied charm configuration.
//!
//! The document comes from `config-get --format=json`. Juju reports unset
//! options as `null`; those are dropped before decoding so the defaults below
//! (which mirror `config.yaml`) apply.

use crate::constants::{
    DEFAULT_HA_BINDIFACE, DEFAULT_HA_MCASTPORT, DEFAULT_OPENSTACK_ORIGIN, DEFAULT_RABBIT_USER,
    DEFAULT_RABBIT_VHOST, DEFAULT_REGION, DEFAULT_VIP_CIDR, DEFAULT_VIP_IFACE, SERVICE_NAME,
};
use crate::errors::ConfigError;
use crate::hashing::calculate_hash;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

fn default_origin() -> String {
    DEFAULT_OPENSTACK_ORIGIN.to_string()
}
fn default_region() -> String {
    DEFAULT_REGION.to_string()
}
fn default_rabbit_user() -> String {
    DEFAULT_RABBIT_USER.to_string()
}
fn default_rabbit_vhost() -> String {
    DEFAULT_RABBIT_VHOST.to_string()
}
fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}
fn default_vip_iface() -> String {
    DEFAULT_VIP_IFACE.to_string()
}
fn default_vip_cidr() -> u8 {
    DEFAULT_VIP_CIDR
}
fn default_ha_bindiface() -> String {
    DEFAULT_HA_BINDIFACE.to_string()
}
fn default_ha_mcastport() -> u16 {
    DEFAULT_HA_MCASTPORT
}

/// Charm configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CharmConfig {
    /// Package source, e.g. `distro` or `cloud:trusty-mitaka`
    #[serde(default = "default_origin")]
    pub openstack_origin: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_rabbit_user")]
    pub rabbit_user: String,

    #[serde(default = "default_rabbit_vhost")]
    pub rabbit_vhost: String,

    /// Name of the main database requested over shared-db
    #[serde(default = "default_service_name")]
    pub database: String,

    #[serde(default = "default_service_name")]
    pub database_user: String,

    /// Whitespace-separated `address:port:key` entries for external secondaries
    #[serde(default)]
    pub dns_slaves: String,

    /// Whitespace-separated NS record names to register as Designate servers
    #[serde(default)]
    pub nameservers: String,

    /// Domain for instance records, with a trailing dot
    #[serde(default)]
    pub nova_domain: Option<String>,

    #[serde(default)]
    pub nova_domain_email: Option<String>,

    /// Domain for floating IP records, with a trailing dot
    #[serde(default)]
    pub neutron_domain: Option<String>,

    #[serde(default)]
    pub neutron_domain_email: Option<String>,

    /// Space-separated virtual IPs for clustered deployments
    #[serde(default)]
    pub vip: Option<String>,

    #[serde(default = "default_vip_iface", rename = "vip_iface")]
    pub vip_iface: String,

    #[serde(default = "default_vip_cidr", rename = "vip_cidr")]
    pub vip_cidr: u8,

    #[serde(default = "default_ha_bindiface")]
    pub ha_bindiface: String,

    #[serde(default = "default_ha_mcastport")]
    pub ha_mcastport: u16,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub use_syslog: bool,

    /// Base64 PEM certificate served on the API endpoint
    #[serde(default, rename = "ssl_cert")]
    pub ssl_cert: Option<String>,

    /// Base64 PEM key for `ssl_cert`
    #[serde(default, rename = "ssl_key")]
    pub ssl_key: Option<String>,

    /// Base64 PEM CA that signed `ssl_cert`
    #[serde(default, rename = "ssl_ca")]
    pub ssl_ca: Option<String>,

    /// Leave release upgrades to the `openstack-upgrade` action
    #[serde(default)]
    pub action_managed_upgrade: bool,
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self {
            openstack_origin: default_origin(),
            region: default_region(),
            rabbit_user: default_rabbit_user(),
            rabbit_vhost: default_rabbit_vhost(),
            database: default_service_name(),
            database_user: default_service_name(),
            dns_slaves: String::new(),
            nameservers: String::new(),
            nova_domain: None,
            nova_domain_email: None,
            neutron_domain: None,
            neutron_domain_email: None,
            vip: None,
            vip_iface: default_vip_iface(),
            vip_cidr: default_vip_cidr(),
            ha_bindiface: default_ha_bindiface(),
            ha_mcastport: default_ha_mcastport(),
            debug: false,
            verbose: false,
            use_syslog: false,
            ssl_cert: None,
            ssl_key: None,
            ssl_ca: None,
            action_managed_upgrade: false,
        }
    }
}

/// Decoded TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslPem {
    pub cert: String,
    pub key: String,
    pub ca: Option<String>,
}

/// Decode a base64 PEM value published by an operator or a relation.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidConfig`] naming `option` when the value is
/// not base64 text.
pub fn decode_pem(option: &str, value: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidConfig {
        reason: format!("{option} must be a base64 encoded PEM"),
    };
    let bytes = BASE64.decode(value.trim()).map_err(|_| invalid())?;
    String::from_utf8(bytes).map_err(|_| invalid())
}

/// An external DNS secondary from the `dns-slaves` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsSlave {
    pub address: String,
    pub port: u16,
    /// Base64 RNDC secret
    pub key: String,
}

impl DnsSlave {
    /// Parse one `address:port:key` entry.
    ///
    /// The address may itself contain colons (IPv6); the last two fields are
    /// always port and key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDnsSlave`] for a wrong field count, a
    /// non-numeric port or a key that is not base64.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidDnsSlave {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = entry.rsplitn(3, ':');
        let (Some(key), Some(port), Some(address)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid("expected address:port:key"));
        };
        if address.is_empty() || key.is_empty() {
            return Err(invalid("expected address:port:key"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| invalid("port must be a number between 0 and 65535"))?;
        BASE64
            .decode(key)
            .map_err(|_| invalid("key must be a base64 RNDC secret"))?;

        Ok(Self {
            address: address.to_string(),
            port,
            key: key.to_string(),
        })
    }

    /// Address with separators replaced, for file and nameserver names.
    #[must_use]
    pub fn sanitized_address(&self) -> String {
        self.address.replace(['.', ':'], "_")
    }
}

impl CharmConfig {
    /// Decode a `config-get --format=json` document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when a present value has the wrong type.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        let value = match value {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            ),
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            other => other,
        };
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Parsed `dns-slaves` entries.
    ///
    /// # Errors
    ///
    /// Returns the first malformed entry.
    pub fn dns_slaves(&self) -> Result<Vec<DnsSlave>, ConfigError> {
        self.dns_slaves.split_whitespace().map(DnsSlave::parse).collect()
    }

    /// NS record names to register.
    #[must_use]
    pub fn nameservers(&self) -> Vec<String> {
        self.nameservers
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// `(domain, email)` pairs for the nova and neutron domains that are fully configured.
    #[must_use]
    pub fn initial_domains(&self) -> Vec<(String, String)> {
        [
            (&self.nova_domain, &self.nova_domain_email),
            (&self.neutron_domain, &self.neutron_domain_email),
        ]
        .into_iter()
        .filter_map(|(domain, email)| match (domain, email) {
            (Some(d), Some(e)) if !d.is_empty() && !e.is_empty() => Some((d.clone(), e.clone())),
            _ => None,
        })
        .collect()
    }

    /// Virtual IPs, if any.
    #[must_use]
    pub fn vips(&self) -> Vec<String> {
        self.vip
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Problems an operator must fix before the unit can be active.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems: Vec<ConfigError> = self
            .dns_slaves
            .split_whitespace()
            .filter_map(|entry| DnsSlave::parse(entry).err())
            .collect();
        problems.extend(self.domain_problems());
        if let Err(e) = self.ssl_pem() {
            problems.push(e);
        }
        problems
    }

    /// TLS material from `ssl_cert`, `ssl_key` and `ssl_ca`, if configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when only one of certificate and
    /// key is set or a value does not decode.
    pub fn ssl_pem(&self) -> Result<Option<SslPem>, ConfigError> {
        fn set(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.trim().is_empty())
        }
        match (set(&self.ssl_cert), set(&self.ssl_key)) {
            (None, None) => Ok(None),
            (Some(cert), Some(key)) => Ok(Some(SslPem {
                cert: decode_pem("ssl_cert", cert)?,
                key: decode_pem("ssl_key", key)?,
                ca: set(&self.ssl_ca)
                    .map(|ca| decode_pem("ssl_ca", ca))
                    .transpose()?,
            })),
            _ => Err(ConfigError::InvalidConfig {
                reason: "ssl_cert and ssl_key must be set together".to_string(),
            }),
        }
    }

    /// Domain names Designate would reject.
    #[must_use]
    pub fn domain_problems(&self) -> Vec<ConfigError> {
        [
            ("nova-domain", &self.nova_domain),
            ("neutron-domain", &self.neutron_domain),
        ]
        .into_iter()
        .filter(|(_, domain)| domain.as_deref().is_some_and(|d| !d.ends_with('.')))
        .map(|(key, _)| ConfigError::InvalidConfig {
            reason: format!("{key} must end with a full stop"),
        })
        .collect()
    }

    /// Stable hash used to raise `config.changed`.
    #[must_use]
    pub fn hash(&self) -> String {
        calculate_hash(self)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

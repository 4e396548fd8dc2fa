// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admin credentials for the `designate` client.
//!
//! The charm writes them as `export KEY=value` lines to `/root/novarc` from
//! the identity-service relation, and the client reads them back into its
//! process environment.

use crate::errors::DesignateError;
use std::collections::BTreeMap;
use std::path::Path;

/// Keystone credentials for the Designate service user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub tenant: String,
    pub auth_url: String,
    pub region: String,
}

impl Credentials {
    /// Build from an identity-service payload. Returns `None` until the
    /// relation carries the service credentials.
    #[must_use]
    pub fn from_identity(payload: &BTreeMap<String, String>, region: &str) -> Option<Self> {
        let get = |key: &str| payload.get(key).filter(|v| !v.is_empty()).cloned();
        let protocol = get("auth_protocol").unwrap_or_else(|| "http".to_string());
        let auth_url = format!(
            "{protocol}://{}:{}/v2.0",
            get("auth_host")?,
            get("auth_port")?
        );
        Some(Self {
            username: get("service_username")?,
            password: get("service_password")?,
            tenant: get("service_tenant")?,
            auth_url,
            region: region.to_string(),
        })
    }

    /// Environment variables the OpenStack clients expect.
    #[must_use]
    pub fn env(&self) -> BTreeMap<String, String> {
        [
            ("OS_AUTH_URL", &self.auth_url),
            ("OS_PASSWORD", &self.password),
            ("OS_REGION_NAME", &self.region),
            ("OS_TENANT_NAME", &self.tenant),
            ("OS_USERNAME", &self.username),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }

    /// Content of the rc file.
    #[must_use]
    pub fn render(&self) -> String {
        self.env()
            .iter()
            .map(|(k, v)| format!("export {k}={v}\n"))
            .collect()
    }
}

/// Parse `export KEY=value` lines. Blank lines and comments are skipped;
/// surrounding quotes on values are removed.
///
/// # Errors
///
/// Returns [`DesignateError::Credentials`] for a line without `=`.
pub fn parse(content: &str, path: &Path) -> Result<BTreeMap<String, String>, DesignateError> {
    let mut env = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let assignment = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(DesignateError::Credentials {
                path: path.to_path_buf(),
                reason: format!("cannot parse line '{line}'"),
            });
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        env.insert(key.trim().to_string(), value.to_string());
    }
    Ok(env)
}

/// Read and parse an rc file.
///
/// # Errors
///
/// Returns [`DesignateError::Credentials`] if the file is unreadable or malformed.
pub fn load(path: &Path) -> Result<BTreeMap<String, String>, DesignateError> {
    let content = std::fs::read_to_string(path).map_err(|e| DesignateError::Credentials {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse(&content, path)
}

#[cfg(test)]
#[path = "novarc_tests.rs"]
mod novarc_tests;

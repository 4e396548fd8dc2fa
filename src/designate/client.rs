// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Idempotent domain and server management.
//!
//! Designate itself is the source of truth for whether a domain or server
//! exists. Creation is always check, then create, then verify by listing
//! again, so a retry after a crash between the create call and any local
//! bookkeeping never produces a duplicate.

use crate::command::{CommandRunner, CommandSpec};
use crate::errors::DesignateError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A domain as listed by `designate domain-list -f value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub serial: String,
}

/// A server as listed by `designate server-list -f value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub name: String,
}

/// Parse `id name serial` lines.
///
/// # Errors
///
/// Returns [`DesignateError::MalformedListing`] for a non-blank line with
/// fewer than three columns.
pub fn parse_domain_list(output: &str) -> Result<Vec<Domain>, DesignateError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut cols = line.split_whitespace();
            match (cols.next(), cols.next(), cols.next()) {
                (Some(id), Some(name), Some(serial)) => Ok(Domain {
                    id: id.to_string(),
                    name: name.to_string(),
                    serial: serial.to_string(),
                }),
                _ => Err(DesignateError::MalformedListing {
                    line: line.to_string(),
                }),
            }
        })
        .collect()
}

/// Parse `id name` lines.
///
/// # Errors
///
/// Returns [`DesignateError::MalformedListing`] for a non-blank line with
/// fewer than two columns.
pub fn parse_server_list(output: &str) -> Result<Vec<Server>, DesignateError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut cols = line.split_whitespace();
            match (cols.next(), cols.next()) {
                (Some(id), Some(name)) => Ok(Server {
                    id: id.to_string(),
                    name: name.to_string(),
                }),
                _ => Err(DesignateError::MalformedListing {
                    line: line.to_string(),
                }),
            }
        })
        .collect()
}

/// Wrapper around the `designate` CLI.
#[derive(Clone)]
pub struct DesignateClient {
    runner: Arc<dyn CommandRunner>,
    env: BTreeMap<String, String>,
}

impl std::fmt::Debug for DesignateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignateClient")
            .field("env_keys", &self.env.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DesignateClient {
    /// Client authenticating with the given environment.
    pub fn new(runner: Arc<dyn CommandRunner>, env: BTreeMap<String, String>) -> Self {
        Self { runner, env }
    }

    /// Client authenticating with the credentials in an rc file.
    ///
    /// # Errors
    ///
    /// Returns [`DesignateError::Credentials`] if the file cannot be loaded.
    pub fn from_rc_file(runner: Arc<dyn CommandRunner>, path: &Path) -> Result<Self, DesignateError> {
        Ok(Self::new(runner, super::novarc::load(path)?))
    }

    async fn designate<I, S>(&self, args: I) -> Result<String, DesignateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("designate").args(args).envs(&self.env);
        Ok(self.runner.run(&spec).await?.stdout)
    }

    /// # Errors
    ///
    /// Returns an error if the CLI fails or its output cannot be parsed.
    pub async fn list_domains(&self) -> Result<Vec<Domain>, DesignateError> {
        parse_domain_list(&self.designate(["domain-list", "-f", "value"]).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the CLI fails or its output cannot be parsed.
    pub async fn list_servers(&self) -> Result<Vec<Server>, DesignateError> {
        parse_server_list(&self.designate(["server-list", "-f", "value"]).await?)
    }

    /// Id of the named domain, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn domain_id(&self, name: &str) -> Result<Option<String>, DesignateError> {
        Ok(self
            .list_domains()
            .await?
            .into_iter()
            .find(|d| d.name == name)
            .map(|d| d.id))
    }

    /// Id of the named server, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn server_id(&self, name: &str) -> Result<Option<String>, DesignateError> {
        Ok(self
            .list_servers()
            .await?
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.id))
    }

    /// Fail unless the API answers a listing request.
    ///
    /// # Errors
    ///
    /// Returns the listing error.
    pub async fn ensure_api_responding(&self) -> Result<(), DesignateError> {
        self.list_servers().await.map(|_| ())
    }

    /// Create a domain unless it exists; returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`DesignateError::DomainNotCreated`] when the domain is still
    /// missing after the create call, or any CLI error.
    pub async fn create_domain(&self, name: &str, email: &str) -> Result<String, DesignateError> {
        if let Some(id) = self.domain_id(name).await? {
            debug!(domain = name, id = %id, "Domain already exists");
            return Ok(id);
        }

        self.designate([
            "domain-create",
            "--name",
            name,
            "--email",
            email,
            "-f",
            "value",
        ])
        .await?;

        let id = self
            .domain_id(name)
            .await?
            .ok_or_else(|| DesignateError::DomainNotCreated {
                domain: name.to_string(),
            })?;
        info!(domain = name, id = %id, "Created domain");
        Ok(id)
    }

    /// Create a server unless it exists; returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`DesignateError::ServerNotCreated`] when the server is still
    /// missing after the create call, or any CLI error.
    pub async fn create_server(&self, name: &str) -> Result<String, DesignateError> {
        if let Some(id) = self.server_id(name).await? {
            debug!(server = name, id = %id, "Server already exists");
            return Ok(id);
        }

        self.designate(["server-create", "--name", name, "-f", "value"])
            .await?;

        let id = self
            .server_id(name)
            .await?
            .ok_or_else(|| DesignateError::ServerNotCreated {
                server: name.to_string(),
            })?;
        info!(server = name, id = %id, "Created server");
        Ok(id)
    }

    /// Delete a domain by name. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns any CLI error.
    pub async fn delete_domain(&self, name: &str) -> Result<bool, DesignateError> {
        let Some(id) = self.domain_id(name).await? else {
            return Ok(false);
        };
        self.designate(["domain-delete", id.as_str()]).await?;
        info!(domain = name, id = %id, "Deleted domain");
        Ok(true)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;

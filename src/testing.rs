// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Test doubles shared by unit and integration tests.
//!
//! [`FakeRunner`] records every command, answers scripted prefixes, and
//! emulates the `designate` client against an in-memory set of domains and
//! servers so create/verify sequences behave like the real API.

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::errors::CommandError;
use crate::relations::{RelationDescriptor, Relations};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// A domain known to the fake Designate API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeDomain {
    pub id: String,
    pub name: String,
    pub email: String,
    pub serial: u64,
}

/// In-memory Designate API.
#[derive(Debug, Default)]
pub struct FakeDesignate {
    pub domains: Vec<FakeDomain>,
    /// (id, name)
    pub servers: Vec<(String, String)>,
    next_id: u64,
}

impl FakeDesignate {
    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{:04}", self.next_id)
    }

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    fn handle(&mut self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let args = &spec.args;
        let sub = args.first().map(String::as_str).unwrap_or_default();
        match sub {
            "domain-list" => Ok(CommandOutput::stdout(
                self.domains
                    .iter()
                    .map(|d| format!("{} {} {}\n", d.id, d.name, d.serial))
                    .collect::<String>(),
            )),
            "server-list" => Ok(CommandOutput::stdout(
                self.servers
                    .iter()
                    .map(|(id, name)| format!("{id} {name}\n"))
                    .collect::<String>(),
            )),
            "domain-create" => {
                let name = Self::flag_value(args, "--name").unwrap_or_default().to_string();
                let email = Self::flag_value(args, "--email").unwrap_or_default().to_string();
                if self.domains.iter().any(|d| d.name == name) {
                    return Err(CommandError::NonZeroExit {
                        command: spec.display(),
                        status: "exit status: 1".to_string(),
                        stderr: format!("Duplicate Domain {name}"),
                    });
                }
                let id = self.next_id("domain");
                self.domains.push(FakeDomain {
                    id: id.clone(),
                    name,
                    email,
                    serial: 1,
                });
                Ok(CommandOutput::stdout(format!("{id}\n")))
            }
            "server-create" => {
                let name = Self::flag_value(args, "--name").unwrap_or_default().to_string();
                if self.servers.iter().any(|(_, n)| *n == name) {
                    return Err(CommandError::NonZeroExit {
                        command: spec.display(),
                        status: "exit status: 1".to_string(),
                        stderr: format!("Duplicate Server {name}"),
                    });
                }
                let id = self.next_id("server");
                self.servers.push((id.clone(), name));
                Ok(CommandOutput::stdout(format!("{id}\n")))
            }
            "domain-delete" => {
                let id = args.get(1).cloned().unwrap_or_default();
                self.domains.retain(|d| d.id != id);
                Ok(CommandOutput::default())
            }
            _ => Err(CommandError::NonZeroExit {
                command: spec.display(),
                status: "exit status: 2".to_string(),
                stderr: format!("unknown subcommand '{sub}'"),
            }),
        }
    }
}

struct Script {
    prefix: String,
    outcome: Result<CommandOutput, CommandError>,
    once: bool,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<CommandSpec>,
    scripts: Vec<Script>,
    designate: FakeDesignate,
}

/// Scripted [`CommandRunner`].
///
/// Unscripted commands succeed with empty output, except `designate`, which is
/// served by [`FakeDesignate`].
#[derive(Default)]
pub struct FakeRunner {
    state: Mutex<FakeState>,
}

impl FakeRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panic inside a test poisons the lock; the data is still usable
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Answer every command whose display line starts with `prefix`.
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.lock().scripts.push(Script {
            prefix: prefix.to_string(),
            outcome: Ok(CommandOutput::stdout(stdout)),
            once: false,
        });
    }

    /// Fail every command whose display line starts with `prefix`.
    pub fn fail(&self, prefix: &str, error: CommandError) {
        self.lock().scripts.push(Script {
            prefix: prefix.to_string(),
            outcome: Err(error),
            once: false,
        });
    }

    /// Fail only the next command whose display line starts with `prefix`.
    pub fn fail_once(&self, prefix: &str, error: CommandError) {
        self.lock().scripts.push(Script {
            prefix: prefix.to_string(),
            outcome: Err(error),
            once: true,
        });
    }

    /// Remove all scripted answers for `prefix`.
    pub fn clear_script(&self, prefix: &str) {
        self.lock().scripts.retain(|s| s.prefix != prefix);
    }

    /// Every command line run so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.iter().map(CommandSpec::display).collect()
    }

    /// Full specs of every command run so far.
    #[must_use]
    pub fn specs(&self) -> Vec<CommandSpec> {
        self.lock().calls.clone()
    }

    /// Number of commands whose display line starts with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.display().starts_with(prefix))
            .count()
    }

    /// Forget recorded calls (scripts and fake API state stay).
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    /// Names of the domains the fake API holds, in creation order.
    #[must_use]
    pub fn domain_names(&self) -> Vec<String> {
        self.lock()
            .designate
            .domains
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    /// Names of the servers the fake API holds, in creation order.
    #[must_use]
    pub fn server_names(&self) -> Vec<String> {
        self.lock()
            .designate
            .servers
            .iter()
            .map(|(_, n)| n.clone())
            .collect()
    }

    /// Seed the fake API with an existing domain.
    pub fn add_domain(&self, id: &str, name: &str) {
        self.lock().designate.domains.push(FakeDomain {
            id: id.to_string(),
            name: name.to_string(),
            email: String::new(),
            serial: 1,
        });
    }

    /// Replace the id of an existing domain, as if it were deleted and re-created.
    pub fn recreate_domain(&self, name: &str, new_id: &str) {
        let mut state = self.lock();
        if let Some(domain) = state.designate.domains.iter_mut().find(|d| d.name == name) {
            domain.id = new_id.to_string();
        }
    }

    /// Environment passed to the most recent `designate` call.
    #[must_use]
    pub fn last_designate_env(&self) -> Option<BTreeMap<String, String>> {
        self.lock()
            .calls
            .iter()
            .rev()
            .find(|c| c.program == "designate")
            .map(|c| c.env.clone())
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let line = spec.display();
        let mut state = self.lock();
        state.calls.push(spec.clone());

        if let Some(index) = state.scripts.iter().position(|s| line.starts_with(&s.prefix)) {
            let outcome = state.scripts[index].outcome.clone();
            if state.scripts[index].once {
                state.scripts.remove(index);
            }
            return outcome;
        }

        if spec.program == "designate" {
            return state.designate.handle(spec);
        }

        Ok(CommandOutput::default())
    }
}

/// Build unit settings from literal pairs.
#[must_use]
pub fn unit_data(pairs: &[(&str, &str)]) -> crate::relations::UnitData {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// A shared-db relation; passwords are only published when `with_passwords` is set.
#[must_use]
pub fn shared_db_relation(with_passwords: bool) -> RelationDescriptor {
    let mut data = unit_data(&[("db_host", "10.0.0.10"), ("private-address", "10.0.0.10")]);
    if with_passwords {
        data.insert("designate_password".to_string(), "dbpass".to_string());
        data.insert("dpm_password".to_string(), "dpmpass".to_string());
    }
    RelationDescriptor::new(crate::states::SHARED_DB).with_unit("mysql/0", data)
}

/// A complete amqp relation.
#[must_use]
pub fn amqp_relation() -> RelationDescriptor {
    RelationDescriptor::new(crate::states::AMQP).with_unit(
        "rabbitmq-server/0",
        unit_data(&[("hostname", "10.0.0.20"), ("password", "rabbitpass")]),
    )
}

/// A complete identity-service relation.
#[must_use]
pub fn identity_relation() -> RelationDescriptor {
    RelationDescriptor::new(crate::states::IDENTITY_SERVICE).with_unit(
        "keystone/0",
        unit_data(&[
            ("service_host", "10.0.0.30"),
            ("service_port", "5000"),
            ("service_protocol", "http"),
            ("auth_host", "10.0.0.30"),
            ("auth_port", "35357"),
            ("auth_protocol", "http"),
            ("service_tenant", "services"),
            ("service_username", "designate"),
            ("service_password", "keystonepass"),
        ]),
    )
}

/// A dns-backend relation with one secondary.
#[must_use]
pub fn dns_backend_relation() -> RelationDescriptor {
    RelationDescriptor::new(crate::states::DNS_BACKEND).with_unit(
        "designate-bind/0",
        unit_data(&[
            ("private-address", "10.0.0.40"),
            ("rndckey", "c2VjcmV0a2V5MTIzNA=="),
            ("algorithm", "hmac-md5"),
        ]),
    )
}

/// Every interface the charm needs, fully published.
#[must_use]
pub fn complete_relations() -> Relations {
    Relations::new()
        .with(shared_db_relation(true))
        .with(amqp_relation())
        .with(identity_relation())
        .with(dns_backend_relation())
}

/// Configuration naming one nameserver and both managed domains.
#[must_use]
pub fn domains_config() -> crate::config::CharmConfig {
    crate::config::CharmConfig {
        nameservers: "ns1.example.com.".to_string(),
        nova_domain: Some("nova.example.com.".to_string()),
        nova_domain_email: Some("admin@example.com".to_string()),
        neutron_domain: Some("neutron.example.com.".to_string()),
        neutron_domain_email: Some("admin@example.com".to_string()),
        ..crate::config::CharmConfig::default()
    }
}

/// Write the rc file the Designate client authenticates with.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_rc_file(paths: &crate::context::CharmPaths) {
    let credentials = crate::designate::Credentials {
        username: "designate".to_string(),
        password: "keystonepass".to_string(),
        tenant: "services".to_string(),
        auth_url: "http://10.0.0.30:35357/v2.0".to_string(),
        region: "RegionOne".to_string(),
    };
    crate::io::atomic_write(&paths.rc_file(), credentials.render().as_bytes(), 0o600)
        .expect("failed to write rc file");
}

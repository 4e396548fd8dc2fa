// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP frontends stacked in front of designate-api.
//!
//! Clustered units run haproxy on the public API port and balance over every
//! peer. With TLS material available, apache terminates HTTPS one layer below
//! and proxies to the API. Each layer listens [`API_PORT_STEP`] ports below
//! the one in front of it:
//!
//! | haproxy | https | haproxy | apache | designate-api |
//! |---|---|---|---|---|
//! | no | no | - | - | 9001 |
//! | yes | no | 9001 | - | 8991 |
//! | no | yes | - | 9001 | 8991 |
//! | yes | yes | 9001 | 8991 | 8981 |

use super::templates::HEADER;
use crate::config::{decode_pem, SslPem};
use crate::constants::{API_PORT_STEP, DESIGNATE_API_PORT};
use crate::context::{CharmPaths, HookContext};
use crate::errors::ConfigError;
use crate::states::{CLUSTER, HA, IDENTITY_SERVICE};
use tracing::warn;

/// Ports of every layer between clients and designate-api.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiPorts {
    /// Port registered in the service catalogue
    pub public: u16,
    pub haproxy: Option<u16>,
    pub apache: Option<u16>,
    /// Port designate-api binds
    pub api: u16,
}

impl ApiPorts {
    #[must_use]
    pub fn new(haproxy: bool, https: bool) -> Self {
        let public = DESIGNATE_API_PORT;
        let below = |layers: u16| public - layers * API_PORT_STEP;
        let in_front = u16::from(haproxy);
        Self {
            public,
            haproxy: haproxy.then_some(public),
            apache: https.then(|| below(in_front)),
            api: below(in_front + u16::from(https)),
        }
    }

    /// Port haproxy forwards to on each peer.
    #[must_use]
    pub fn backend(&self) -> u16 {
        self.apache.unwrap_or(self.api)
    }
}

/// haproxy runs whenever the unit has peers or an hacluster subordinate.
#[must_use]
pub fn haproxy_enabled(ctx: &HookContext) -> bool {
    ctx.relations.is_connected(CLUSTER) || ctx.relations.is_connected(HA)
}

/// Certificate, key and CA served for this unit's address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslMaterial {
    /// Common name the files are named after
    pub cn: String,
    pub pem: SslPem,
}

/// TLS material for this unit.
///
/// Operator configuration wins; otherwise keystone may have published a
/// certificate for this unit's address on the identity-service relation.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidConfig`] when configured or published values
/// do not decode.
pub fn ssl_material(ctx: &HookContext) -> Result<Option<SslMaterial>, ConfigError> {
    let cn = ctx.unit_address.clone();
    if let Some(pem) = ctx.config.ssl_pem()? {
        return Ok(Some(SslMaterial { cn, pem }));
    }

    let Some(identity) = ctx.relations.get(IDENTITY_SERVICE) else {
        return Ok(None);
    };
    let published = |key: &str| identity.get(key).filter(|v| !v.is_empty());
    let cert_key = format!("ssl_cert_{cn}");
    let key_key = format!("ssl_key_{cn}");
    let (Some(cert), Some(key)) = (published(&cert_key), published(&key_key)) else {
        return Ok(None);
    };
    let pem = SslPem {
        cert: decode_pem(&cert_key, &cert)?,
        key: decode_pem(&key_key, &key)?,
        ca: published("ca_cert")
            .map(|ca| decode_pem("ca_cert", &ca))
            .transpose()?,
    };
    Ok(Some(SslMaterial { cn, pem }))
}

/// Whether apache terminates TLS for this unit. Undecodable material counts
/// as absent; status assessment reports bad `ssl_*` options.
#[must_use]
pub fn https_enabled(ctx: &HookContext) -> bool {
    match ssl_material(ctx) {
        Ok(material) => material.is_some(),
        Err(e) => {
            warn!(error = %e, "Ignoring TLS material");
            false
        }
    }
}

#[must_use]
pub fn api_ports(ctx: &HookContext) -> ApiPorts {
    ApiPorts::new(haproxy_enabled(ctx), https_enabled(ctx))
}

/// This unit and every peer on the cluster relation, sorted.
#[must_use]
pub fn peer_addresses(ctx: &HookContext) -> Vec<String> {
    let mut addresses = vec![ctx.unit_address.clone()];
    if let Some(cluster) = ctx.relations.get(CLUSTER) {
        addresses.extend(
            cluster
                .units
                .values()
                .filter_map(|data| data.get("private-address"))
                .filter(|address| !address.is_empty())
                .cloned(),
        );
    }
    addresses.sort();
    addresses.dedup();
    addresses
}

fn server_name(address: &str) -> String {
    format!("designate-{}", address.replace(['.', ':'], "-"))
}

/// `/etc/haproxy/haproxy.cfg` balancing the public port over `peers`.
#[must_use]
pub fn haproxy_cfg(ports: &ApiPorts, peers: &[String]) -> String {
    let mut out = String::from(HEADER);
    out.push_str(
        "global
    log /var/lib/haproxy/dev/log local0
    log /var/lib/haproxy/dev/log local1 notice
    maxconn 20000
    user haproxy
    group haproxy
    spread-checks 0

defaults
    log global
    mode tcp
    option tcplog
    option dontlognull
    retries 3
    timeout queue 9000
    timeout connect 9000
    timeout client 90000
    timeout server 90000
",
    );

    let public = ports.haproxy.unwrap_or(ports.public);
    let backend = ports.backend();
    out.push_str(&format!(
        "\nfrontend tcp-in_designate-api\n    bind *:{public}\n    default_backend designate-api\n"
    ));
    out.push_str("\nbackend designate-api\n    balance leastconn\n");
    for peer in peers {
        let host = if peer.contains(':') {
            format!("[{peer}]")
        } else {
            peer.clone()
        };
        out.push_str(&format!(
            "    server {} {host}:{backend} check\n",
            server_name(peer)
        ));
    }
    out
}

/// Apache site terminating TLS and proxying to designate-api.
///
/// Returns `None` when the ports have no apache layer.
#[must_use]
pub fn apache_site(ports: &ApiPorts, cn: &str) -> Option<String> {
    let listen = ports.apache?;
    let api = ports.api;
    let cert = CharmPaths::ssl_cert_system_path(cn);
    let key = CharmPaths::ssl_key_system_path(cn);

    let mut out = String::from(HEADER);
    out.push_str(&format!(
        "Listen {listen}
<VirtualHost *:{listen}>
    ServerName {cn}
    SSLEngine on
    SSLProtocol +TLSv1 +TLSv1.1 +TLSv1.2
    SSLCipherSuite HIGH:!RC4:!MD5:!aNULL:!eNULL:!EXP:!LOW:!MEDIUM
    SSLCertificateFile {cert}
    SSLCertificateKeyFile {key}
    ProxyPass / http://localhost:{api}/
    ProxyPassReverse / http://localhost:{api}/
    ProxyPreserveHost on
    RequestHeader set X-Forwarded-Proto \"https\"
</VirtualHost>
"
    ));
    Some(out)
}

#[cfg(test)]
#[path = "frontends_tests.rs"]
mod frontends_tests;

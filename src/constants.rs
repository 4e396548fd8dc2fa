// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Designate charm.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Service Identity Constants
// ============================================================================

/// Charm and service name
pub const SERVICE_NAME: &str = "designate";

/// Keystone catalogue service type
pub const SERVICE_TYPE: &str = "designate";

/// Service that answers API requests
pub const DEFAULT_SERVICE: &str = "designate-api";

/// Public Designate API port (public, internal and admin endpoints share it)
pub const DESIGNATE_API_PORT: u16 = 9001;

/// Distance between stacked frontends: haproxy, then apache, then the API
pub const API_PORT_STEP: u16 = 10;

/// Load balancer in front of the API when clustered
pub const HAPROXY_SERVICE: &str = "haproxy";

/// TLS terminator in front of the API when certificates are configured
pub const APACHE_SERVICE: &str = "apache2";

/// Apache modules the HTTPS frontend needs
pub const APACHE_MODULES: [&str; 4] = ["ssl", "proxy", "proxy_http", "headers"];

/// Name of the apache site terminating TLS
pub const APACHE_SITE_NAME: &str = "openstack_https_frontend";

/// Port the mini-DNS service listens on for zone transfers to secondaries
pub const MDNS_PORT: u16 = 5354;

/// Identifier of the default Designate pool
pub const DEFAULT_POOL_ID: &str = "794ccc2c-d751-44fe-b57f-8894c9f5c842";

/// Database prefixes requested over the shared-db relation
pub const DATABASE_PREFIXES: [&str; 2] = ["designate", "dpm"];

/// Database and user name for the pool manager cache
pub const POOL_MANAGER_DATABASE: &str = "dpm";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for queries and zone transfers
pub const DNS_PORT: u16 = 53;

/// Standard RNDC control port
pub const RNDC_PORT: u16 = 953;

/// Algorithm used for the per-secondary RNDC key files
pub const RNDC_KEY_ALGORITHM: &str = "hmac-md5";

/// Key name used inside rendered RNDC key files
pub const RNDC_KEY_NAME: &str = "rndc-key";

// ============================================================================
// Filesystem Constants
// ============================================================================

/// Designate configuration directory
pub const DESIGNATE_DIR: &str = "/etc/designate";

/// Defaults file read by the service init scripts
pub const DESIGNATE_DEFAULT: &str = "/etc/default/openstack";

/// Primary service configuration
pub const DESIGNATE_CONF: &str = "/etc/designate/designate.conf";

/// RNDC key shared with the DNS backend relation
pub const RNDC_KEY_CONF: &str = "/etc/designate/rndc.key";

/// Pool topology descriptor consumed by `designate-manage pool update`
pub const POOLS_YAML: &str = "/etc/designate/pools.yaml";

/// Nova notification sink fragment
pub const NOVA_SINK_FILE: &str = "/etc/designate/conf.d/nova_sink.cfg";

/// Neutron notification sink fragment
pub const NEUTRON_SINK_FILE: &str = "/etc/designate/conf.d/neutron_sink.cfg";

/// Admin credentials used by the designate client
pub const RC_FILE: &str = "/root/novarc";

/// haproxy configuration, rendered when clustered
pub const HAPROXY_CONF: &str = "/etc/haproxy/haproxy.cfg";

/// Apache site terminating TLS for the API
pub const APACHE_SITE_CONF: &str = "/etc/apache2/sites-available/openstack_https_frontend.conf";

/// Certificates and keys served by the apache frontend
pub const APACHE_SSL_DIR: &str = "/etc/apache2/ssl/designate";

/// CA installed into the system trust store
pub const CA_CERT_FILE: &str = "/usr/local/share/ca-certificates/keystone_juju_ca_cert.crt";

/// Directory (relative to the charm dir) holding the durable state file
pub const STATE_DIR_NAME: &str = ".designate-charm";

/// Name of the durable state file
pub const STATE_FILE_NAME: &str = "state.json";

/// File mode for RNDC key files
pub const RNDC_KEY_FILE_MODE: u32 = 0o440;

/// File mode for files carrying credentials
pub const SECRET_FILE_MODE: u32 = 0o600;

/// File mode for ordinary configuration files
pub const CONFIG_FILE_MODE: u32 = 0o644;

/// File mode for service configuration read by the designate group
pub const SERVICE_CONFIG_FILE_MODE: u32 = 0o640;

// ============================================================================
// External Command Constants
// ============================================================================

/// Default bound on any external command (5 minutes)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Bound on database migrations (10 minutes)
pub const DB_SYNC_TIMEOUT_SECS: u64 = 600;

/// Bound on a single service restart (2 minutes)
pub const SERVICE_RESTART_TIMEOUT_SECS: u64 = 120;

/// Bound on hook tool invocations (`relation-get`, `leader-set`, ...)
pub const HOOK_TOOL_TIMEOUT_SECS: u64 = 60;

/// Environment variable Juju sets to the running hook's name
pub const JUJU_HOOK_NAME_ENV: &str = "JUJU_HOOK_NAME";

/// Environment variable Juju sets to the charm directory
pub const CHARM_DIR_ENV: &str = "CHARM_DIR";

// ============================================================================
// Default Charm Configuration Values
// ============================================================================

/// Default package origin
pub const DEFAULT_OPENSTACK_ORIGIN: &str = "distro";

/// Default Keystone region
pub const DEFAULT_REGION: &str = "RegionOne";

/// Default RabbitMQ user requested over amqp
pub const DEFAULT_RABBIT_USER: &str = "designate";

/// Default RabbitMQ vhost requested over amqp
pub const DEFAULT_RABBIT_VHOST: &str = "openstack";

/// Default interface for the VIP resource
pub const DEFAULT_VIP_IFACE: &str = "eth0";

/// Default netmask width for the VIP resource
pub const DEFAULT_VIP_CIDR: u8 = 24;

/// Default corosync bind interface
pub const DEFAULT_HA_BINDIFACE: &str = "eth0";

/// Default corosync multicast port
pub const DEFAULT_HA_MCASTPORT: u16 = 5424;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Text of the rendered configuration files.

use super::adapters::comma_list;
use super::RenderContext;
use crate::constants::{
    DEFAULT_POOL_ID, MDNS_PORT, NEUTRON_SINK_FILE, NOVA_SINK_FILE,
};

pub(crate) const HEADER: &str = "# Rendered by the designate charm; local changes will be overwritten.\n";

/// Minimal INI writer; sections and keys come out in insertion order.
#[derive(Debug, Default)]
struct Ini {
    out: String,
}

impl Ini {
    fn new() -> Self {
        Self {
            out: HEADER.to_string(),
        }
    }

    fn section(&mut self, name: &str) -> &mut Self {
        self.out.push_str(&format!("\n[{name}]\n"));
        self
    }

    fn set(&mut self, key: &str, value: impl std::fmt::Display) -> &mut Self {
        self.out.push_str(&format!("{key} = {value}\n"));
        self
    }

    fn finish(self) -> String {
        self.out
    }
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Notification handlers enabled in `[service:sink]`.
fn sink_handlers(ctx: &RenderContext<'_>) -> Vec<&'static str> {
    let mut handlers = Vec::new();
    if ctx.nova_domain_id.is_some() {
        handlers.push("nova_fixed");
    }
    if ctx.neutron_domain_id.is_some() {
        handlers.push("neutron_floatingip");
    }
    handlers
}

/// `/etc/designate/designate.conf`
#[must_use]
pub fn designate_conf(ctx: &RenderContext<'_>) -> String {
    let config = ctx.config;
    let mut ini = Ini::new();

    ini.section("DEFAULT")
        .set("debug", py_bool(config.debug))
        .set("verbose", py_bool(config.verbose))
        .set("use_syslog", py_bool(config.use_syslog))
        .set("state_path", "/var/lib/designate")
        .set(
            "root_helper",
            "sudo designate-rootwrap /etc/designate/rootwrap.conf",
        );

    ini.section("oslo_messaging_rabbit")
        .set("rabbit_userid", &config.rabbit_user)
        .set("rabbit_virtual_host", &config.rabbit_vhost)
        .set("rabbit_password", &ctx.amqp.password)
        .set("rabbit_hosts", ctx.amqp.hosts.join(","));

    ini.section("service:central")
        .set("default_pool_id", DEFAULT_POOL_ID);

    ini.section("service:api")
        .set("api_host", "0.0.0.0")
        .set("api_port", ctx.ports.api)
        .set("auth_strategy", "keystone")
        .set("enable_api_v1", "True")
        .set(
            "enabled_extensions_v1",
            "diagnostics, quotas, reports, sync, touch",
        )
        .set("enable_api_v2", "True");

    ini.section("keystone_authtoken")
        .set("auth_uri", &ctx.identity.auth_uri)
        .set("auth_url", &ctx.identity.auth_url)
        .set("auth_plugin", "password")
        .set("project_domain_id", "default")
        .set("user_domain_id", "default")
        .set("project_name", &ctx.identity.tenant)
        .set("username", &ctx.identity.username)
        .set("password", &ctx.identity.password);

    ini.section("service:sink")
        .set("enabled_notification_handlers", comma_list(sink_handlers(ctx)));

    ini.section("service:mdns")
        .set("listen", format!("0.0.0.0:{MDNS_PORT}"));

    ini.section("service:pool_manager")
        .set("pool_id", DEFAULT_POOL_ID);

    ini.section("pool_manager_cache:sqlalchemy")
        .set("connection", ctx.database.pool_manager_uri());

    ini.section("storage:sqlalchemy")
        .set("connection", ctx.database.designate_uri(config));

    ini.finish()
}

/// `/etc/designate/conf.d/nova_sink.cfg`
#[must_use]
pub fn nova_sink(zone_id: &str) -> String {
    let mut ini = Ini::new();
    ini.section("handler:nova_fixed")
        .set("zone_id", zone_id)
        .set("notification_topics", "notifications_designate")
        .set("control_exchange", "nova")
        .set("format", "%(hostname)s.%(domain)s");
    ini.finish()
}

/// `/etc/designate/conf.d/neutron_sink.cfg`
#[must_use]
pub fn neutron_sink(zone_id: &str) -> String {
    let mut ini = Ini::new();
    ini.section("handler:neutron_floatingip")
        .set("zone_id", zone_id)
        .set("notification_topics", "notifications_designate")
        .set("control_exchange", "neutron")
        .set(
            "format",
            "%(octet0)s-%(octet1)s-%(octet2)s-%(octet3)s.%(domain)s",
        );
    ini.finish()
}

/// `/etc/default/openstack`: daemon arguments pointing at the sink configs.
///
/// A sink is referenced when it is rendered in this pass or already on disk.
#[must_use]
pub fn default_openstack(nova_sink: bool, neutron_sink: bool) -> String {
    let args: Vec<String> = [(nova_sink, NOVA_SINK_FILE), (neutron_sink, NEUTRON_SINK_FILE)]
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, file)| format!("--config-file={file}"))
        .collect();
    format!("{HEADER}DAEMON_ARGS=\"{}\"\n", args.join(" "))
}

#[cfg(test)]
#[path = "templates_tests.rs"]
mod templates_tests;

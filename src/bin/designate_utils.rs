// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Designate domain and server helper
//!
//! Thin wrapper over the `designate` client for operators and actions.
//! Credentials come from `/root/novarc`. Ids and names go to stdout, logs go
//! to stderr.
//!
//! Usage:
//!   designate-utils domain-create --domain-name example.com. --email admin@example.com
//!   designate-utils server-list

use anyhow::Result;
use clap::{Parser, Subcommand};
use designate_charm::{
    command::{CommandRunner, SystemRunner},
    constants::RC_FILE,
    designate::DesignateClient,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "designate-utils", about = "Manage Designate domains and servers", version)]
struct Cli {
    /// Credentials file exporting OS_* variables
    #[arg(long, default_value = RC_FILE)]
    rc_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a domain unless it exists and print its id
    DomainCreate {
        #[arg(long)]
        domain_name: String,
        #[arg(long)]
        email: String,
    },
    /// Print the id of a domain, if it exists
    DomainGet {
        #[arg(long)]
        domain_name: String,
    },
    /// Delete a domain if it exists
    DomainDelete {
        #[arg(long)]
        domain_name: String,
    },
    /// Print every domain name
    DomainList,
    /// Create a server unless it exists and print its id
    ServerCreate {
        #[arg(long)]
        server_name: String,
    },
    /// Print the id of a server, if it exists
    ServerGet {
        #[arg(long)]
        server_name: String,
    },
    /// Print every server name
    ServerList,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::default());
    let client = DesignateClient::from_rc_file(runner, &cli.rc_file)?;

    match cli.command {
        Command::DomainCreate { domain_name, email } => {
            println!("{}", client.create_domain(&domain_name, &email).await?);
        }
        Command::DomainGet { domain_name } => {
            if let Some(id) = client.domain_id(&domain_name).await? {
                println!("{id}");
            }
        }
        Command::DomainDelete { domain_name } => {
            client.delete_domain(&domain_name).await?;
        }
        Command::DomainList => {
            for domain in client.list_domains().await? {
                println!("{}", domain.name);
            }
        }
        Command::ServerCreate { server_name } => {
            println!("{}", client.create_server(&server_name).await?);
        }
        Command::ServerGet { server_name } => {
            if let Some(id) = client.server_id(&server_name).await? {
                println!("{id}");
            }
        }
        Command::ServerList => {
            for server in client.list_servers().await? {
                println!("{}", server.name);
            }
        }
    }
    Ok(())
}

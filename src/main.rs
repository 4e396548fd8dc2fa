// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use designate_charm::{
    cli::{self, Cli, Commands, FlagsCommand, ReportFormat},
    command::{CommandRunner, SystemRunner},
    config::CharmConfig,
    context::{CharmPaths, HookContext},
    dispatcher::Dispatcher,
    errors::ConfigError,
    flags::FlagStore,
    handlers::build_registry,
    hookenv::{HookTools, WorkloadStatus},
    relations::{JujuRelationProvider, RelationProvider, StaticRelationProvider},
    states::DECLARED_RELATIONS,
    status::assess_status,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    // Hooks run one at a time; a single thread is all the dispatcher needs
    let runtime = tokio::runtime::Builder::new_current_thread()
        .thread_name("designate-charm")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_logging() {
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Respects RUST_LOG_FORMAT environment variable for output format (json or text)
    //
    // Juju captures stderr into the unit log; stdout is reserved for reports
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Some(Commands::Hook { name }) => run_hook(&cli, name.clone()).await,
        None => match cli::hook_name_from_env() {
            Some(name) => run_hook(&cli, name).await,
            None => {
                error!("No hook name given and none found in argv[0] or JUJU_HOOK_NAME");
                Ok(ExitCode::from(2))
            }
        },
        Some(Commands::Flags { subcommand }) => {
            run_flags(&cli, subcommand)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Handlers) => {
            let registry = build_registry()?;
            for (name, predicate) in registry.describe() {
                println!("{name:<28} {predicate}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, cli::BINARY_NAME, &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_flags(cli: &Cli, subcommand: &FlagsCommand) -> Result<()> {
    let path = cli.state_path_from_env();
    let mut flags = FlagStore::open(&path)?;
    match subcommand {
        FlagsCommand::List => {
            for name in flags.flags() {
                println!("{name}");
            }
        }
        FlagsCommand::Set { name } => {
            if flags.set(name)? {
                info!(flag = %name, "Flag set");
            }
        }
        FlagsCommand::Clear { name } => {
            if flags.clear(name)? {
                info!(flag = %name, "Flag cleared");
            }
        }
    }
    Ok(())
}

async fn run_hook(cli: &Cli, hook: String) -> Result<ExitCode> {
    info!(hook = %hook, "Running hook");

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner {
        timeout_override: cli.timeout_override(),
    });
    let tools = HookTools::new(Arc::clone(&runner));

    let config = match CharmConfig::from_json(tools.config_get().await?) {
        Ok(config) => config,
        Err(e) => return block(&tools, &e).await,
    };
    let unit_address = tools.unit_private_address().await?;

    let provider: Arc<dyn RelationProvider> = match &cli.relations_file {
        Some(path) => Arc::new(StaticRelationProvider::from_file(path)?),
        None => Arc::new(JujuRelationProvider::new(tools.clone())),
    };
    let relations = provider.snapshot(&DECLARED_RELATIONS).await?;

    let state_path = cli.state_path_from_env();
    let flags = FlagStore::open(&state_path)
        .with_context(|| format!("Cannot open flag store {}", state_path.display()))?;

    let built = HookContext::builder(Arc::clone(&runner))
        .hook(Some(hook))
        .config(config)
        .flags(flags)
        .relations(relations)
        .relation_provider(provider)
        .paths(CharmPaths::new(&cli.root))
        .unit_address(unit_address)
        .build();
    let mut ctx = match built {
        Ok(ctx) => ctx,
        Err(e) => return block(&tools, &e).await,
    };
    debug!(context = ?ctx, "Hook context ready");

    let registry = build_registry()?;
    let report = Dispatcher::new(&registry)
        .with_policy(cli.policy())
        .dispatch(&mut ctx)
        .await?;

    if let Err(e) = assess_status(&ctx).await {
        warn!(error = %e, "Failed to update workload status");
    }

    if cli.report == Some(ReportFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed = report.failed.len(), "Hook finished with failed handlers");
        Ok(ExitCode::FAILURE)
    }
}

/// Report a configuration the charm cannot act on. The hook still exits zero.
async fn block(tools: &HookTools, e: &ConfigError) -> Result<ExitCode> {
    error!(error = %e, "Invalid charm configuration");
    tools
        .status_set(WorkloadStatus::Blocked, &e.to_string())
        .await?;
    Ok(ExitCode::SUCCESS)
}

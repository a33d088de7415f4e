//! hostpool CLI
//!
//! Single binary for managing a pool of SSH hosts:
//! - Registry management (add, edit, del, ls, show)
//! - Interactive logins through proxy chains
//! - Fan-out file copies to hosts and tag groups
//! - Context switching

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostpool::commands::{self, HostArgs, Workspace};
use hostpool::output::print_error;
use hp_core::config::{self, HOME_ENV};

#[derive(Parser)]
#[command(name = "hostpool")]
#[command(author, version, about = "Manage a pool of SSH hosts")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration directory
    #[arg(long, global = true, env = HOME_ENV)]
    config_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log into a host through its proxy chain
    /// Alias: go
    #[command(alias = "go")]
    Login {
        /// Host name (prompts when omitted)
        name: Option<String>,
    },

    /// Copy files to or from hosts
    ///
    /// Remote paths are written `NAME:PATH`, or `TAG:PATH` with --group.
    /// The last argument is the destination.
    /// Alias: mcp
    #[command(alias = "mcp")]
    Cp {
        /// Treat the remote identifier as a tag and copy on every tagged host
        #[arg(short, long)]
        group: bool,
        /// Accepted for scp compatibility; directories are always copied recursively
        #[arg(short = 'r', hide = true)]
        recursive: bool,
        /// Sources followed by the destination
        #[arg(required = true, num_args = 2.., value_name = "PATH")]
        paths: Vec<String>,
    },

    /// Add a host to the current context
    Add {
        /// Host name
        name: String,
        /// Hostname or IP address
        #[arg(short, long)]
        address: String,
        #[command(flatten)]
        fields: HostArgs,
    },

    /// Edit a host in the current context
    Edit {
        /// Host name
        name: String,
        /// Hostname or IP address
        #[arg(short, long)]
        address: Option<String>,
        /// New host name
        #[arg(long)]
        rename: Option<String>,
        #[command(flatten)]
        fields: HostArgs,
    },

    /// Delete hosts from the current context
    /// Alias: rm
    #[command(alias = "rm")]
    Del {
        /// Host names or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// List hosts
    Ls {
        /// Only hosts with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a host with its defaults applied
    Show {
        /// Host name
        name: String,
    },

    /// Manage contexts
    Ctx {
        #[command(subcommand)]
        action: CtxAction,
    },
}

#[derive(Subcommand)]
enum CtxAction {
    /// List contexts
    Ls,
    /// Switch the current context
    Use { name: String },
    /// Register a context
    Add {
        name: String,
        /// Context file (defaults to <config dir>/contexts/<name>.toml)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Unregister a context
    Rm { name: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_dir = cli.config_dir.unwrap_or_else(config::default_config_dir);
    let mut ws = Workspace::load(config_dir)?;

    match cli.command {
        Commands::Login { name } => {
            commands::login_command(&ws, name.as_deref(), shutdown_token()).await?;
        }

        Commands::Cp {
            group,
            recursive: _,
            paths,
        } => {
            commands::copy_command(&ws, &paths, group, shutdown_token()).await?;
        }

        Commands::Add {
            name,
            address,
            fields,
        } => {
            commands::add_command(&ws, &name, &address, fields)?;
        }

        Commands::Edit {
            name,
            address,
            rename,
            fields,
        } => {
            commands::edit_command(&ws, &name, address, rename, fields)?;
        }

        Commands::Del { patterns } => {
            commands::delete_command(&ws, &patterns)?;
        }

        Commands::Ls { tag, json } => {
            commands::list_command(&ws, tag.as_deref(), json)?;
        }

        Commands::Show { name } => {
            commands::show_command(&ws, &name)?;
        }

        Commands::Ctx { action } => match action {
            CtxAction::Ls => commands::ctx_list(&ws)?,
            CtxAction::Use { name } => commands::ctx_use(&mut ws, &name)?,
            CtxAction::Add { name, path } => commands::ctx_add(&mut ws, &name, path)?,
            CtxAction::Rm { name } => commands::ctx_remove(&mut ws, &name)?,
        },
    }

    Ok(())
}

/// Token cancelled on Ctrl+C or SIGTERM
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::debug!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, cancelling...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, cancelling...");
            }
        }

        cancel_clone.cancel();
    });

    cancel
}

// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Toolvault - encrypted team credentials with expiring share links.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use toolvault_config::{render_errors, ConfigError, ToolvaultConfig};

/// Toolvault - encrypted team credentials with expiring share links.
#[derive(Parser, Debug)]
#[command(name = "toolvault", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP API server.
    Serve,
    /// Print a fresh random key for `vault.encryption_key`.
    Keygen,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<ToolvaultConfig, Vec<ConfigError>> {
    match path {
        Some(p) => toolvault_config::load_and_validate_path(p),
        None => toolvault_config::load_and_validate(),
    }
}

fn load_or_exit(path: Option<&PathBuf>) -> ToolvaultConfig {
    match load(path) {
        Ok(config) => config,
        Err(errors) => {
            render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => {
            let config = load_or_exit(cli.config.as_ref());
            init_tracing(&config.server.log_level);
            if let Err(e) = serve::run_serve(config).await {
                tracing::error!(error = %e, "serve failed");
                eprintln!("toolvault: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Keygen) => match toolvault_vault::generate_random_key() {
            Ok(key) => println!("{key}"),
            Err(e) => {
                eprintln!("toolvault: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::CheckConfig) => {
            let config = load_or_exit(cli.config.as_ref());
            println!(
                "toolvault: config ok (environment={:?}, listen={}:{}, users={})",
                config.server.environment,
                config.server.host,
                config.server.port,
                config.identity.users.len()
            );
        }
        None => {
            println!("toolvault: use --help for available commands");
        }
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("toolvault={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands_and_global_config() {
        let cli = Cli::try_parse_from(["toolvault", "check-config", "--config", "tv.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
        assert_eq!(cli.config, Some(PathBuf::from("tv.toml")));

        let cli = Cli::try_parse_from(["toolvault", "keygen"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Keygen));
        assert!(Cli::try_parse_from(["toolvault", "unlock"]).is_err());
    }
}

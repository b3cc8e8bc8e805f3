// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Smelinx - API lifecycle registry with deprecation and sunset notices.
//!
//! This is the binary entry point for the Smelinx service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smelinx_config::model::SmelinxConfig;

/// Smelinx - API lifecycle registry with deprecation and sunset notices.
#[derive(Parser, Debug)]
#[command(name = "smelinx", version, about, long_about = None)]
struct Cli {
    /// Load this TOML file instead of searching the standard locations.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the HTTP gateway and the notification dispatcher.
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
    /// Run a single dispatch cycle and print its report as JSON.
    DispatchOnce,
}

fn load_config(path: Option<&PathBuf>) -> Result<SmelinxConfig, Vec<smelinx_config::ConfigError>> {
    match path {
        Some(path) => smelinx_config::load_and_validate_path(path),
        None => smelinx_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            smelinx_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            serve::init_tracing(&config.service.log_level);
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("smelinx serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            println!(
                "smelinx: config ok (service.name={}, storage.database_path={}, gateway={}:{}, dispatch.enabled={})",
                config.service.name,
                config.storage.database_path,
                config.gateway.host,
                config.gateway.port,
                config.dispatch.enabled,
            );
        }
        Some(Commands::DispatchOnce) => {
            serve::init_tracing(&config.service.log_level);
            match serve::run_dispatch_once(config).await {
                Ok(report) => match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("smelinx dispatch-once: {e}");
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    eprintln!("smelinx dispatch-once: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("smelinx: use --help for available commands");
        }
    }
}

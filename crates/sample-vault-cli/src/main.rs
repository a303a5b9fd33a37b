mod commands;
mod console;
mod fetcher;
mod logging;
mod progress;

use anyhow::Context as _;
use clap::Parser;
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use fetcher::HttpFetcher;
use progress::CliReporter;
use sample_vault_core::{Registry, Vault};
use std::process;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let mut config = match sample_vault_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();
    if let Some(root) = args.repository {
        config.repository_root = root;
    }
    if let Some(db) = args.database {
        config.database_path = Some(db);
    }

    if let Some(Commands::PrintConfig) = args.command {
        println!("Configuration: {:#?}", config);
        return Ok(());
    }

    let vault = Vault::open(&config).with_context(|| {
        format!(
            "opening repository {}",
            config.repository_root.display()
        )
    })?;
    let registry = Registry::builtin();
    let fetcher = HttpFetcher::new(config.tor_proxy.clone());
    let reporter = CliReporter::new();

    match args.command {
        Some(Commands::Exec { json, line }) => {
            let line = console::shell_join(&line);
            let ok = console::exec(&vault, &registry, &fetcher, &reporter, &line, json)?;
            if !ok {
                process::exit(1);
            }
        }
        Some(Commands::Console) | None => {
            println!(
                "{} {} samples in {}",
                "sample-vault".bold(),
                vault.catalog.count()?.to_string().green(),
                config.repository_root.display()
            );
            console::run(&vault, &registry, &fetcher, &reporter)?;
            info!("Bye");
        }
        Some(Commands::PrintConfig) => {}
    }

    Ok(())
}

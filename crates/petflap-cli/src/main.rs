mod cli;
mod error;

use std::sync::Arc;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use petflap_api::{DoorClient, TransportConfig};
use petflap_core::{Coordinator, CoordinatorConfig, CoreError};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let coordinator = build_coordinator(&cli.global)?;
    coordinator.start().await?;

    let result = match cli.command {
        Command::Status => status(&coordinator),
        Command::Watch => watch(&coordinator).await,
        Command::Set { key, value } => set(&coordinator, key, value).await,
        Command::Pets => pets(&coordinator),
    };

    coordinator.stop().await;
    result
}

fn build_coordinator(global: &GlobalOpts) -> Result<Coordinator, CliError> {
    let transport = TransportConfig {
        timeout: global.call_timeout,
    };
    let client = DoorClient::new(
        global.host.clone(),
        global.username.clone(),
        SecretString::from(global.password.clone()),
        &transport,
    )
    .map_err(CoreError::from)?;

    let config = CoordinatorConfig {
        fast_interval: global.fast_interval,
        slow_interval: global.slow_interval,
        call_timeout: global.call_timeout,
        include_all_events: global.include_all_events,
    };

    Ok(Coordinator::new(Arc::new(client), config))
}

// ── Commands ────────────────────────────────────────────────────────

fn status(coordinator: &Coordinator) -> Result<(), CliError> {
    if let Some(identity) = coordinator.identity() {
        println!(
            "{} (id {}, fw {}, serial {})",
            identity.name, identity.device_id, identity.sw_version, identity.serial_number
        );
    }

    let snapshot = coordinator.snapshot();
    let mut keys: Vec<&String> = snapshot.fast.keys().collect();
    keys.sort();
    for key in keys {
        let value = if snapshot.state(key) == Some(true) {
            "on"
        } else {
            "off"
        };
        let marker = if snapshot.availability.is_available(key) {
            ""
        } else {
            "  [unavailable]"
        };
        println!("  {key:<20} {value}{marker}");
    }

    if let Some(refreshed) = snapshot.last_slow_refresh {
        println!("pet status as of {refreshed}");
    }
    Ok(())
}

async fn watch(coordinator: &Coordinator) -> Result<(), CliError> {
    let mut stream = coordinator.subscribe_stream();
    print_snapshot_line(stream.current());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = stream.changed() => {
                match changed {
                    Some(snapshot) => print_snapshot_line(&snapshot),
                    None => break,
                }
            }
        }
    }
    Ok(())
}

fn print_snapshot_line(snapshot: &petflap_core::Snapshot) {
    match serde_json::to_string(snapshot) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "snapshot serialization failed"),
    }
}

async fn set(coordinator: &Coordinator, key: String, value: bool) -> Result<(), CliError> {
    coordinator.submit_write(key.clone(), value).await?;
    println!("{key} -> {}", if value { "on" } else { "off" });
    Ok(())
}

fn pets(coordinator: &Coordinator) -> Result<(), CliError> {
    let snapshot = coordinator.snapshot();
    let pets = coordinator.pets();
    if pets.is_empty() {
        println!("no pets registered");
        return Ok(());
    }

    for pet in pets {
        let name = pet.name.as_deref().unwrap_or("<unnamed>");
        match snapshot.passage(&pet.id) {
            Some(event) => {
                let presence = snapshot
                    .presence(&pet.id)
                    .map_or_else(String::new, |p| format!(" ({p})"));
                println!(
                    "  {name:<16} {:<6} last {} at {}{presence}",
                    pet.species.to_string(),
                    event.direction,
                    event.timestamp
                );
            }
            None => println!("  {name:<16} {:<6} no recorded passage", pet.species.to_string()),
        }
    }
    Ok(())
}

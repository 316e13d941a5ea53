// Argument definitions for the petflap binary.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

#[derive(Parser)]
#[command(
    name = "petflap",
    version,
    about = "Poll, watch, and control a PetWALK pet door"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalOpts {
    /// Door base URL, e.g. http://192.168.1.50:8080
    #[arg(long, env = "PETFLAP_HOST")]
    pub host: Url,

    /// Device account username
    #[arg(long, env = "PETFLAP_USERNAME")]
    pub username: String,

    /// Device account password
    #[arg(long, env = "PETFLAP_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Fast-cycle polling interval
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub fast_interval: Duration,

    /// Minimum gap between pet-status fetches
    #[arg(long, default_value = "2m", value_parser = humantime::parse_duration)]
    pub slow_interval: Duration,

    /// Bound on each individual call to the door
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub call_timeout: Duration,

    /// Poll pet passage events and include event-less pets
    #[arg(long)]
    pub include_all_events: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print identity and current states, then exit
    Status,
    /// Stream snapshot changes as JSON lines until interrupted
    Watch,
    /// Write one state key (e.g. `petflap set door on`)
    Set {
        key: String,
        #[arg(value_parser = parse_on_off)]
        value: bool,
    },
    /// List registered pets, with presence when event polling is on
    Pets,
}

fn parse_on_off(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(format!("expected on/off, got {raw:?}")),
    }
}

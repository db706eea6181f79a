//! somfyctl - control Somfy RTS receivers through a Sonoff RF bridge

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

use somfy_protocol::prelude::Command as SomfyCommand;
use somfy_tools::{commands, ProfileStore};

/// Somfy RTS codec frontend for Sonoff RF bridges
#[derive(Parser)]
#[command(name = "somfyctl")]
#[command(about = "Control Somfy RTS receivers through a Sonoff RF bridge")]
#[command(version)]
struct Cli {
    /// Profile store path
    #[arg(long, global = true, default_value = ".somfyctl.toml")]
    config: PathBuf,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a remote profile from a sniffed B1 data string
    Init {
        /// Override the remote handheld address (hex or decimal)
        #[arg(short, long, value_parser = parse_device)]
        device: Option<u32>,

        #[arg(short, long, default_value = "main")]
        profile: String,

        /// Override the sniffed rolling code
        #[arg(short, long)]
        rolling_code: Option<u16>,

        /// B1 capture tokens as printed by the bridge console
        #[arg(required = true, trailing_var_arg = true)]
        b1: Vec<String>,
    },
    /// Generate a B0 data string for a command
    Gen {
        /// MY, UP, DOWN or PROG
        command: String,

        #[arg(short, long, default_value_t = 1)]
        repeat: u8,

        #[arg(short, long, default_value = "main")]
        profile: String,
    },
    /// Generate and transmit through the bridge
    Run {
        /// MY, UP, DOWN or PROG
        command: String,

        #[arg(short, long, default_value_t = 1)]
        repeat: u8,

        #[arg(short, long, default_value = "main")]
        profile: String,

        /// Bridge hostname, overrides the profile's stored host
        #[arg(long)]
        host: Option<String>,
    },
    /// Print payload data for a capture, or the stored profile
    Print {
        #[arg(short, long, default_value = "main")]
        profile: String,

        /// Optional B1 capture tokens to decode
        #[arg(trailing_var_arg = true)]
        b1: Vec<String>,
    },
}

fn parse_device(s: &str) -> std::result::Result<u32, String> {
    somfy_tools::profile::parse_device_id(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .init();

    let mut store = ProfileStore::load(&cli.config)?;

    match cli.command {
        Commands::Init {
            device,
            profile,
            rolling_code,
            b1,
        } => commands::init(&mut store, &profile, device, rolling_code, &b1),
        Commands::Gen {
            command,
            repeat,
            profile,
        } => {
            let command: SomfyCommand = command.parse().context("unrecognized command")?;
            let raw = commands::generate(&mut store, &profile, command, repeat)?;
            println!("{}", raw);
            Ok(())
        }
        Commands::Run {
            command,
            repeat,
            profile,
            host,
        } => {
            let command: SomfyCommand = command.parse().context("unrecognized command")?;
            commands::run(&mut store, &profile, command, repeat, host.as_deref())
        }
        Commands::Print { profile, b1 } => commands::print(&store, &profile, &b1),
    }
}

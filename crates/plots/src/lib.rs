pub mod chart;
pub mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::config::{self, Config};
use logging::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rooftop-plots")]
#[command(about = "Chart MPPT traces and I-V sweep curves stored in InfluxDB")]
#[command(version)]
pub struct Cli {
    /// Extra config file, applied over config/config.toml and config/config.local.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Voltage and current over time per host
    Mppt(commands::mppt::MpptArgs),
    /// I-V and P-V curves of the latest sweep per host
    Sweep(commands::sweep::SweepArgs),
}

pub async fn run(cli: Cli) -> Result<()> {
    // ロガーより先に設定を確定させる
    let loaded = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = config::install(loaded);

    let log = DEFAULT.new(o!("function" => "run"));
    info!(log, "start";
        "influx_url" => &config.influx.url,
        "bucket" => &config.influx.bucket,
    );

    match cli.command {
        Commands::Mppt(args) => commands::mppt::run(args, config).await,
        Commands::Sweep(args) => commands::sweep::run(args, config).await,
    }
}

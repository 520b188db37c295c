use super::{OutputArgs, QueryArgs, fetch_hosts, report};
use crate::chart::{CURRENT_OVER_VOLTAGE, ChartSpec, ChartWriter, POWER_OVER_VOLTAGE};
use analysis::{HostSeries, build_curve};
use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::Args;
use common::config::Config;
use logging::*;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Measurement holding the sweep bursts
    #[arg(long, default_value = "sweep")]
    pub measurement: String,

    /// Length of the latest sweep burst (overrides sweep.window)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub window: Option<Duration>,

    #[command(flatten)]
    pub query: QueryArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: SweepArgs, config: &Config) -> Result<()> {
    let window = match args.window {
        Some(window) => window,
        None => config.sweep.window()?,
    };
    let window = TimeDelta::from_std(window).context("sweep window is out of range")?;
    let mut writer = args.output.writer()?;

    let query = args.query.flux_query(config, &args.measurement);
    let hosts = fetch_hosts(config, &query).await?;

    draw(&hosts, window, &mut writer)?;
    report(&writer);
    Ok(())
}

/// 最新スイープの I-V / P-V 曲線をホストごとに描く
pub fn draw(hosts: &HostSeries, window: TimeDelta, writer: &mut ChartWriter) -> Result<()> {
    let log = DEFAULT.new(o!("function" => "sweep::draw"));

    let mut curves = Vec::with_capacity(hosts.len());
    for (host, samples) in hosts.iter() {
        let curve = build_curve(samples, window);
        info!(log, "sweep curve"; "host" => host, "samples" => samples.len(), "points" => curve.len());

        let iv: Vec<(f64, f64)> = curve.iter().map(|p| (p.voltage, p.current)).collect();
        let pv: Vec<(f64, f64)> = curve.iter().map(|p| (p.voltage, p.power)).collect();
        curves.push((host, iv, pv));
    }

    let targets: Vec<(&str, &ChartSpec)> = curves
        .iter()
        .filter(|(_, iv, _)| !iv.is_empty())
        .flat_map(|(host, _, _)| [(*host, &CURRENT_OVER_VOLTAGE), (*host, &POWER_OVER_VOLTAGE)])
        .collect();
    writer.check_targets(&targets)?;

    for (host, iv, pv) in &curves {
        writer.xy_chart(host, &CURRENT_OVER_VOLTAGE, iv)?;
        writer.xy_chart(host, &POWER_OVER_VOLTAGE, pv)?;
    }
    Ok(())
}

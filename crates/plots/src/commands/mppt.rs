use super::{OutputArgs, QueryArgs, fetch_hosts, report};
use crate::chart::{CURRENT_OVER_TIME, ChartSpec, ChartWriter, VOLTAGE_OVER_TIME};
use analysis::{HostSeries, MpptSeries};
use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::Args;
use common::config::Config;
use influx::AggregateFn;
use logging::*;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct MpptArgs {
    /// Measurement holding the MPPT trace
    #[arg(long, default_value = "mppt")]
    pub measurement: String,

    /// Width of the mean aggregation window
    #[arg(long, default_value = "1ms", value_parser = humantime::parse_duration)]
    pub every: Duration,

    #[command(flatten)]
    pub query: QueryArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: MpptArgs, config: &Config) -> Result<()> {
    let offset = TimeDelta::from_std(config.display.time_offset()?)
        .context("display.time_offset is out of range")?;
    let mut writer = args.output.writer()?;

    let query = args
        .query
        .flux_query(config, &args.measurement)
        .aggregate_window(args.every, AggregateFn::Mean);
    let hosts = fetch_hosts(config, &query).await?;

    draw(&hosts, offset, &mut writer)?;
    report(&writer);
    Ok(())
}

/// ホストごとに電圧・電流の時系列を描く
pub fn draw(hosts: &HostSeries, offset: TimeDelta, writer: &mut ChartWriter) -> Result<()> {
    let log = DEFAULT.new(o!("function" => "mppt::draw"));

    let mut charts = Vec::with_capacity(hosts.len());
    for (host, samples) in hosts.iter() {
        let series = MpptSeries::from_samples(samples, offset)
            .with_context(|| format!("Failed to shift timestamps of host {}", host))?;
        debug!(log, "series";
            "host" => host,
            "voltage" => series.voltage.len(),
            "current" => series.current.len(),
        );
        charts.push((host, series));
    }

    let mut targets: Vec<(&str, &ChartSpec)> = Vec::new();
    for (host, series) in &charts {
        if !series.voltage.is_empty() {
            targets.push((*host, &VOLTAGE_OVER_TIME));
        }
        if !series.current.is_empty() {
            targets.push((*host, &CURRENT_OVER_TIME));
        }
    }
    writer.check_targets(&targets)?;

    for (host, series) in &charts {
        writer.time_chart(host, &VOLTAGE_OVER_TIME, &series.voltage)?;
        writer.time_chart(host, &CURRENT_OVER_TIME, &series.current)?;
    }
    Ok(())
}

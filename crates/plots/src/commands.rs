pub mod mppt;
pub mod sweep;

use crate::chart::{ChartWriter, parse_size};
use analysis::{HostSeries, group_by_host};
use anyhow::{Context, Result};
use clap::Args;
use common::config::Config;
use influx::{FluxQuery, InfluxClient};
use logging::*;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Bucket to read (overrides influx.bucket)
    #[arg(long)]
    pub bucket: Option<String>,

    /// How far back from now to query
    #[arg(long, default_value = "24h", value_parser = humantime::parse_duration)]
    pub range: Duration,

    /// Only fetch these hosts (repeatable)
    #[arg(long = "host")]
    pub hosts: Vec<String>,
}

impl QueryArgs {
    pub fn flux_query(&self, config: &Config, measurement: &str) -> FluxQuery {
        let bucket = self.bucket.as_deref().unwrap_or(&config.influx.bucket);
        FluxQuery::new(bucket, measurement)
            .range_start(self.range)
            .hosts(&self.hosts)
    }
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// 出力ディレクトリ
    #[arg(short, long, default_value = "charts")]
    pub output: PathBuf,

    /// 画像サイズ (WIDTHxHEIGHT)
    #[arg(long, default_value = "1200x800")]
    pub size: String,

    /// 既存ファイルを強制上書き
    #[arg(long)]
    pub force: bool,
}

impl OutputArgs {
    pub fn writer(&self) -> Result<ChartWriter> {
        let size = parse_size(&self.size)?;
        Ok(ChartWriter::new(&self.output, size, self.force))
    }
}

/// Run `query` once and partition the result by host.
pub async fn fetch_hosts(config: &Config, query: &FluxQuery) -> Result<HostSeries> {
    let log = DEFAULT.new(o!(
        "function" => "commands::fetch_hosts",
        "measurement" => query.measurement().to_string(),
    ));

    let client = InfluxClient::new(&config.influx).context("Failed to create InfluxDB client")?;
    let samples = client.query(query).await.with_context(|| {
        format!(
            "Failed to fetch {} from bucket {} at {}",
            query.measurement(),
            query.bucket(),
            client.base_url()
        )
    })?;
    info!(log, "fetched samples"; "samples" => samples.len());

    let hosts = group_by_host(samples);
    info!(log, "grouped by host"; "hosts" => hosts.len());
    Ok(hosts)
}

/// 生成したファイルの一覧を表示する
pub fn report(writer: &ChartWriter) {
    if writer.written().is_empty() {
        println!("No charts generated");
        return;
    }
    for path in writer.written() {
        println!("✅ Chart generated: {}", path.display());
    }
}

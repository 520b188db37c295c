use std::fmt::Write;
use std::time::Duration;

/// aggregateWindow に渡す集約関数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Mean,
    Median,
    Min,
    Max,
    Last,
}

impl AggregateFn {
    pub fn as_flux(&self) -> &'static str {
        match self {
            AggregateFn::Mean => "mean",
            AggregateFn::Median => "median",
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
            AggregateFn::Last => "last",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct AggregateWindow {
    every: Duration,
    function: AggregateFn,
}

/// A `from |> range |> filter` pipeline over one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxQuery {
    bucket: String,
    measurement: String,
    lookback: Duration,
    hosts: Vec<String>,
    aggregate: Option<AggregateWindow>,
}

pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(24 * 60 * 60);

impl FluxQuery {
    pub fn new(bucket: impl Into<String>, measurement: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            measurement: measurement.into(),
            lookback: DEFAULT_LOOKBACK,
            hosts: Vec::new(),
            aggregate: None,
        }
    }

    /// How far back from now the range starts.
    pub fn range_start(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// Only keep rows whose `host` tag is one of `hosts`. Empty keeps all.
    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn aggregate_window(mut self, every: Duration, function: AggregateFn) -> Self {
        self.aggregate = Some(AggregateWindow { every, function });
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn to_flux(&self) -> String {
        let mut lines = vec![
            format!("from(bucket: {})", string_literal(&self.bucket)),
            format!("  |> range(start: -{})", duration_literal(self.lookback)),
            format!(
                "  |> filter(fn: (r) => r._measurement == {})",
                string_literal(&self.measurement)
            ),
        ];

        if !self.hosts.is_empty() {
            let predicate = self
                .hosts
                .iter()
                .map(|h| format!("r.host == {}", string_literal(h)))
                .collect::<Vec<_>>()
                .join(" or ");
            lines.push(format!("  |> filter(fn: (r) => {})", predicate));
        }

        if let Some(ref aggregate) = self.aggregate {
            lines.push(format!(
                "  |> aggregateWindow(every: {}, fn: {}, createEmpty: false)",
                duration_literal(aggregate.every),
                aggregate.function.as_flux()
            ));
        }

        lines.join("\n")
    }
}

/// Flux の文字列リテラル（`${` の補間も無効化する）
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Flux duration literal, e.g. `24h`, `1ms`, `1m30s`.
fn duration_literal(duration: Duration) -> String {
    const UNITS: [(&str, u128); 6] = [
        ("h", 3_600_000_000_000),
        ("m", 60_000_000_000),
        ("s", 1_000_000_000),
        ("ms", 1_000_000),
        ("us", 1_000),
        ("ns", 1),
    ];

    let mut nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, size) in UNITS {
        let count = nanos / size;
        if count > 0 {
            let _ = write!(out, "{}{}", count, unit);
            nanos -= count * size;
        }
    }
    out
}

use chrono::{DateTime, TimeDelta, Utc};
use logging::{DEFAULT, debug, info, o};
use plotters::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Chart generation error: {0}")]
    ChartGeneration(String),
    #[error("Chart file already exists: {0}. Use --force to overwrite")]
    OutputExists(PathBuf),
    #[error("Chart file {0} would be written for more than one host")]
    DuplicateOutput(PathBuf),
    #[error("Output error: {0}")]
    OutputError(String),
    #[error("Invalid size format: {0}. Expected format: WIDTHxHEIGHT")]
    InvalidSizeFormat(String),
}

/// 軸ラベルとファイル名の接尾辞
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec<'a> {
    pub kind: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

pub const VOLTAGE_OVER_TIME: ChartSpec<'static> = ChartSpec {
    kind: "voltage",
    x_desc: "Time",
    y_desc: "Voltage (V)",
};

pub const CURRENT_OVER_TIME: ChartSpec<'static> = ChartSpec {
    kind: "current",
    x_desc: "Time",
    y_desc: "Current (A)",
};

pub const CURRENT_OVER_VOLTAGE: ChartSpec<'static> = ChartSpec {
    kind: "iv",
    x_desc: "Voltage (V)",
    y_desc: "Current (A)",
};

pub const POWER_OVER_VOLTAGE: ChartSpec<'static> = ChartSpec {
    kind: "pv",
    x_desc: "Voltage (V)",
    y_desc: "Power (W)",
};

/// Writes one PNG per chart into an output directory and remembers what
/// it wrote.
#[derive(Debug)]
pub struct ChartWriter {
    output_dir: PathBuf,
    size: (u32, u32),
    force: bool,
    written: Vec<PathBuf>,
}

impl ChartWriter {
    pub fn new(output_dir: impl Into<PathBuf>, size: (u32, u32), force: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            size,
            force,
            written: Vec::new(),
        }
    }

    pub fn path_for(&self, host: &str, spec: &ChartSpec) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.png", sanitize_filename(host), spec.kind))
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Check every chart of a run before any of them is drawn, so a rejected
    /// run leaves the output directory untouched.
    pub fn check_targets(&self, targets: &[(&str, &ChartSpec)]) -> Result<(), ChartError> {
        let mut seen: HashSet<PathBuf> = self.written.iter().cloned().collect();
        for (host, spec) in targets {
            let path = self.path_for(host, spec);
            if path.exists() && !self.force && !seen.contains(&path) {
                return Err(ChartError::OutputExists(path));
            }
            if !seen.insert(path.clone()) {
                return Err(ChartError::DuplicateOutput(path));
            }
        }
        Ok(())
    }

    fn prepare(&self, path: &Path) -> Result<(), ChartError> {
        // 同じ実行内で別ホストが書いたファイル
        if self.written.iter().any(|p| p == path) {
            return Err(ChartError::DuplicateOutput(path.to_path_buf()));
        }
        if path.exists() && !self.force {
            return Err(ChartError::OutputExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ChartError::OutputError(format!(
                    "Failed to create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Draw `points` against time. Nothing is written for an empty series.
    pub fn time_chart(
        &mut self,
        host: &str,
        spec: &ChartSpec,
        points: &[(DateTime<Utc>, f64)],
    ) -> Result<Option<PathBuf>, ChartError> {
        let log = DEFAULT.new(o!(
            "function" => "ChartWriter::time_chart",
            "host" => host.to_string(),
            "kind" => spec.kind.to_string(),
        ));
        if points.is_empty() {
            info!(log, "no points, skipping chart");
            return Ok(None);
        }

        let path = self.path_for(host, spec);
        self.prepare(&path)?;
        draw_time_chart(&path, self.size, &title(host, spec), spec, points)?;

        debug!(log, "chart written"; "path" => path.display().to_string(), "points" => points.len());
        self.written.push(path.clone());
        Ok(Some(path))
    }

    /// Draw `points` as an x/y line. Nothing is written for an empty series.
    pub fn xy_chart(
        &mut self,
        host: &str,
        spec: &ChartSpec,
        points: &[(f64, f64)],
    ) -> Result<Option<PathBuf>, ChartError> {
        let log = DEFAULT.new(o!(
            "function" => "ChartWriter::xy_chart",
            "host" => host.to_string(),
            "kind" => spec.kind.to_string(),
        ));
        if points.is_empty() {
            info!(log, "no points, skipping chart");
            return Ok(None);
        }

        let path = self.path_for(host, spec);
        self.prepare(&path)?;
        draw_xy_chart(&path, self.size, &title(host, spec), spec, points)?;

        debug!(log, "chart written"; "path" => path.display().to_string(), "points" => points.len());
        self.written.push(path.clone());
        Ok(Some(path))
    }
}

fn title(host: &str, spec: &ChartSpec) -> String {
    format!("{} {}", host, spec.y_desc)
}

pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

pub fn parse_size(size_str: &str) -> Result<(u32, u32), ChartError> {
    let invalid = || ChartError::InvalidSizeFormat(size_str.to_string());

    let parts: Vec<&str> = size_str.split('x').collect();
    if parts.len() != 2 {
        return Err(invalid());
    }

    let width = parts[0].parse::<u32>().map_err(|_| invalid())?;
    let height = parts[1].parse::<u32>().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}

/// Min/max of the finite values with 10% padding on each side.
fn value_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_value = f64::INFINITY;
    let mut max_value = f64::NEG_INFINITY;

    for value in values.into_iter().filter(|v| v.is_finite()) {
        min_value = min_value.min(value);
        max_value = max_value.max(value);
    }

    if min_value == f64::INFINITY || max_value == f64::NEG_INFINITY {
        return None;
    }

    let range = max_value - min_value;
    let padding = if range > 0.0 {
        range * 0.1
    } else if min_value != 0.0 {
        min_value.abs() * 0.1
    } else {
        1.0
    };

    Some((min_value - padding, max_value + padding))
}

fn time_range(points: &[(DateTime<Utc>, f64)]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = points.iter().map(|(t, _)| *t).min()?;
    let end = points.iter().map(|(t, _)| *t).max()?;
    if start == end {
        // 幅ゼロの軸は描けない
        let pad = TimeDelta::seconds(1);
        return Some((
            start.checked_sub_signed(pad).unwrap_or(start),
            end.checked_add_signed(pad).unwrap_or(end),
        ));
    }
    Some((start, end))
}

fn draw_time_chart(
    output_path: &Path,
    size: (u32, u32),
    title: &str,
    spec: &ChartSpec,
    points: &[(DateTime<Utc>, f64)],
) -> Result<(), ChartError> {
    let (start_time, end_time) = time_range(points)
        .ok_or_else(|| ChartError::ChartGeneration("No time range available".to_string()))?;
    let (min_value, max_value) = value_range(points.iter().map(|(_, v)| *v))
        .ok_or_else(|| ChartError::ChartGeneration("No valid data points found".to_string()))?;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to fill background: {}", e)))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(start_time..end_time, min_value..max_value)
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_desc(spec.x_desc)
        .y_desc(spec.y_desc)
        .x_label_formatter(&|x| x.format("%H:%M:%S").to_string())
        .draw()
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to configure mesh: {}", e)))?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to draw series: {}", e)))?;

    root.present()
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to present chart: {}", e)))?;

    Ok(())
}

fn draw_xy_chart(
    output_path: &Path,
    size: (u32, u32),
    title: &str,
    spec: &ChartSpec,
    points: &[(f64, f64)],
) -> Result<(), ChartError> {
    let (min_x, max_x) = value_range(points.iter().map(|(x, _)| *x))
        .ok_or_else(|| ChartError::ChartGeneration("No valid data points found".to_string()))?;
    let (min_y, max_y) = value_range(points.iter().map(|(_, y)| *y))
        .ok_or_else(|| ChartError::ChartGeneration("No valid data points found".to_string()))?;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to fill background: {}", e)))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(min_x..max_x, min_y..max_y)
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_desc(spec.x_desc)
        .y_desc(spec.y_desc)
        .draw()
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to configure mesh: {}", e)))?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to draw series: {}", e)))?;

    root.present()
        .map_err(|e| ChartError::ChartGeneration(format!("Failed to present chart: {}", e)))?;

    Ok(())
}

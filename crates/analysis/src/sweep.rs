//! I-V / P-V curve reconstruction from one sweep burst.
//!
//! A sweep writes voltage and current as separate rows sharing a timestamp.
//! The newest burst is the span of `window` ending at the latest sample, and
//! a curve point exists wherever a voltage and a current share a timestamp.

use chrono::{DateTime, TimeDelta, Utc};
use common::types::{Field, Sample, SweepPoint};
use std::collections::HashMap;

/// Samples strictly newer than `max_time - window`.
///
/// A sample exactly `window` before the newest one is outside. A window
/// reaching past the earliest representable time keeps every sample.
pub fn latest_window(samples: &[Sample], window: TimeDelta) -> Vec<&Sample> {
    let Some(max_time) = samples.iter().map(|s| s.time).max() else {
        return Vec::new();
    };
    match max_time.checked_sub_signed(window) {
        Some(min_time) => samples.iter().filter(|s| s.time > min_time).collect(),
        None => samples.iter().collect(),
    }
}

/// Pair every voltage with every current carrying the identical timestamp.
///
/// Order is voltage-major, then current arrival order; duplicate timestamps
/// on either side produce one point per combination.
pub fn pair_by_timestamp<'a, I>(samples: I) -> Vec<SweepPoint>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut voltages: Vec<(DateTime<Utc>, f64)> = Vec::new();
    let mut currents: HashMap<DateTime<Utc>, Vec<f64>> = HashMap::new();

    for sample in samples {
        match sample.field {
            Field::Voltage => voltages.push((sample.time, sample.value)),
            Field::Current => currents.entry(sample.time).or_default().push(sample.value),
            Field::Other(_) => {}
        }
    }

    voltages
        .into_iter()
        .flat_map(|(time, voltage)| {
            currents
                .get(&time)
                .into_iter()
                .flatten()
                .map(move |&current| SweepPoint::new(voltage, current))
        })
        .collect()
}

/// 最新のスイープ区間から (電圧, 電流, 電力) を組み立てる
pub fn build_curve(samples: &[Sample], window: TimeDelta) -> Vec<SweepPoint> {
    pair_by_timestamp(latest_window(samples, window))
}

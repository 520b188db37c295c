use chrono::{DateTime, TimeDelta, Utc};
use common::types::{Field, Sample};

/// 表示オフセットを足すと時刻が表現範囲を超える
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("display offset {offset} moves {time} out of the representable range")]
pub struct OffsetOverflow {
    pub time: DateTime<Utc>,
    pub offset: TimeDelta,
}

/// Voltage and current of one host over time, in arrival order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MpptSeries {
    pub voltage: Vec<(DateTime<Utc>, f64)>,
    pub current: Vec<(DateTime<Utc>, f64)>,
}

impl MpptSeries {
    /// Split a host's samples by field, shifting every timestamp by `offset`
    /// for display. Fields other than voltage and current are ignored.
    pub fn from_samples(samples: &[Sample], offset: TimeDelta) -> Result<Self, OffsetOverflow> {
        let mut series = MpptSeries::default();
        for sample in samples {
            let time = sample
                .time
                .checked_add_signed(offset)
                .ok_or(OffsetOverflow {
                    time: sample.time,
                    offset,
                })?;
            let point = (time, sample.value);
            match sample.field {
                Field::Voltage => series.voltage.push(point),
                Field::Current => series.current.push(point),
                Field::Other(_) => {}
            }
        }
        Ok(series)
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty() && self.current.is_empty()
    }
}

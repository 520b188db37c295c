use chrono::{DateTime, Utc};
use std::fmt;

/// `_field` の値
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Voltage,
    Current,
    Other(String),
}

impl Field {
    pub fn as_str(&self) -> &str {
        match self {
            Field::Voltage => "voltage",
            Field::Current => "current",
            Field::Other(name) => name,
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        match name {
            "voltage" => Field::Voltage,
            "current" => Field::Current,
            other => Field::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measured value as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub host: String,
    pub field: Field,
    pub value: f64,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, host: impl Into<String>, field: Field, value: f64) -> Self {
        Self {
            time,
            host: host.into(),
            field,
            value,
        }
    }
}

/// A point on a reconstructed I-V / P-V curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

impl SweepPoint {
    pub fn new(voltage: f64, current: f64) -> Self {
        Self {
            voltage,
            current,
            power: voltage * current,
        }
    }
}

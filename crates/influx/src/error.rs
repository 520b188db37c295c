use common::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum InfluxError {
    #[error("Invalid connection settings: {0}")]
    Config(#[from] ConfigError),
    #[error("Request to InfluxDB failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP Error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Query error: {0}")]
    Query(String),
    #[error("Malformed CSV response: {0}")]
    Csv(#[from] csv::Error),
    #[error("Column {0} missing from result table")]
    MissingColumn(&'static str),
    #[error("Invalid timestamp at line {line}: {value:?}")]
    InvalidTime { line: u64, value: String },
    #[error("Invalid value at line {line}: {value:?}")]
    InvalidValue { line: u64, value: String },
}

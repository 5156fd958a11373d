use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PotvolError {
    #[error("sink did not report its volume after {retries} attempts")]
    StartupTimeout { retries: u32 },
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
    #[error("sink error: {0}")]
    Sink(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing sample source")]
    MissingSource,
    #[error("missing level sink")]
    MissingSink,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

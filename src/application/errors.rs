// Error taxonomy for the calibration chain
use thiserror::Error;

/// The trend service call failed or returned something unusable.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to trend service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("trend service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode trend service response: {0}")]
    Decode(String),

    #[error("explore response did not contain a time series widget")]
    NoTimeseriesWidget,

    #[error("timeline point {timestamp} carries no usable value")]
    MalformedSample { timestamp: String },
}

/// Reading or writing a persisted generation failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O on generation {generation} failed: {source}")]
    Io {
        generation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("generation {generation} already exists")]
    AlreadyExists { generation: String },

    #[error("generation {generation} is corrupt: {reason}")]
    CorruptStore { generation: String, reason: String },
}

/// Anything that stops a poll cycle. Every variant is fatal to the chain.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

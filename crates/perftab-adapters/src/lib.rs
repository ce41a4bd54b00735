//! Std adapters for perftab.
//!
//! In clean-arch terms: this is where we touch the world. The only outside
//! collaborator is a time-series database reached over HTTP.

mod influx;
mod line_protocol;

pub use influx::{ConnectionDetails, InfluxWriter, DEFAULT_TIMEOUT};
pub use line_protocol::{FieldValue, Point};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("invalid database url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("point has no fields")]
    EmptyPoint,

    #[error("write rejected with status {status}: {body}")]
    Write { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Sink for measurement points.
///
/// Each call is one synchronous write; implementations must not retry.
pub trait PointWriter {
    fn write(&mut self, bucket: &str, points: &[Point]) -> Result<(), AdapterError>;
}

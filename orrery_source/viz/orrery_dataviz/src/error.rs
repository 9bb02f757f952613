use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read scenario data `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed scenario data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scenario A has none of the tracked parameters")]
    NoParameters,

    #[error("parameter `{parameter}` is missing from scenario {scenario}")]
    MissingParameter {
        parameter: &'static str,
        scenario: char,
    },

    #[error("parameter `{parameter}` has {a} samples in scenario A but {b} in scenario B")]
    LengthMismatch {
        parameter: &'static str,
        a: usize,
        b: usize,
    },

    #[error("data feed closed before delivering")]
    FeedDisconnected,
}

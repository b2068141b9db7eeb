use thiserror::Error;

/// Failures while fetching a dataset or querying the geographic data service.
///
/// None of these is fatal to a page session: callers turn them into a status
/// message, a reverted toggle or a fallback data source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("Failed to parse response from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Well-formed response with no usable data: {0}")]
    EmptyResult(String),

    #[error("No features left after processing: {0}")]
    NoFeatures(String),

    #[error("Not ready: {0}")]
    NotReady(&'static str),
}

/// Failures talking to a node's command API.
#[derive(thiserror::Error, Debug)]
pub enum NodeClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {status} for url ({url}): {message}")]
    Rejected {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Failed to deserialize {command} response: {message}")]
    Deserialize {
        command: &'static str,
        message: String,
    },

    #[error("{command} returned {actual} entries for {expected} requested")]
    UnexpectedResponseLength {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid node URL: {0}")]
    InvalidUrl(String),
}

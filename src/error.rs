use thiserror::Error;

/// Everything the client can fail with between the command layer and the API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the stored credential. The session has already
    /// been cleared by the time this is returned.
    #[error("Session expired or access denied. Please login again.")]
    SessionExpired,

    /// No credential or no usable role; the user has to log in first.
    #[error("Not logged in. Run 'tracker login' first.")]
    Unauthenticated,

    #[error("{0}")]
    Api(String),

    /// Client-side precondition failure, raised before any request is sent.
    #[error("{0}")]
    Validation(String),

    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not encode request for {endpoint}: {source}")]
    Encode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True when the caller must stop and send the user back to login.
    pub fn is_entry_point(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Unauthenticated)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

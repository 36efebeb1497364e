use thiserror::Error;

/// Why a page could not be fetched.
///
/// Cloneable so a failure can be held in [`crate::LoadState::Failed`] while
/// also being broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("failed to decode catalog page: {0}")]
    Decode(String),
    #[error("catalog server responded with status {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("catalog fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Short message suitable for an alert shown next to the list.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the catalog; check your connection and try again.".to_string()
            }
            Self::Decode(_) => "The catalog sent a response that could not be read.".to_string(),
            Self::ServerError { status, .. } if *status == 401 || *status == 403 => {
                "The catalog rejected the request credentials.".to_string()
            }
            Self::ServerError { status, .. } if *status == 429 => {
                "The catalog is rate limiting requests; try again shortly.".to_string()
            }
            Self::ServerError { status, .. } => format!("The catalog failed with status {status}."),
            Self::Cancelled => String::new(),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::ServerError {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        Self::Network(err.to_string())
    }
}

use thiserror::Error;

/// Why a single source lookup produced no usable data.
///
/// Adapters absorb these: a failed lookup is reported once and replaced with
/// the matching null object, so this type never reaches the facade.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request failed for {url}: {message}")]
    Request { url: String, message: String },
    #[error("non-success status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("unable to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("no events found for {group}")]
    NoEvents { group: String },
    #[error("no group info found for {group}")]
    NoGroupInfo { group: String },
}

impl FetchError {
    pub fn request(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Masks `secret` wherever it appears in the error, e.g. an API key
    /// carried in a query string.
    pub fn redact(self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        let mask = |text: String| text.replace(secret, "***");
        match self {
            Self::Request { url, message } => Self::Request {
                url: mask(url),
                message: mask(message),
            },
            Self::Status { url, status } => Self::Status {
                url: mask(url),
                status,
            },
            Self::Decode { url, message } => Self::Decode {
                url: mask(url),
                message: mask(message),
            },
            other => other,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

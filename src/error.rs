use std::fmt::Display;

#[derive(Debug)]
pub enum Error {
    /// The underlying ledger store failed.
    Storage(String),
    NotFound(String),
    AlreadyExists(String),
    Decode { key: String, reason: String },
    Encode { key: String, reason: String },
    Config(String),
}

impl Error {
    pub fn decode(key: &str, err: impl Display) -> Self {
        Error::Decode {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn encode(key: &str, err: impl Display) -> Self {
        Error::Encode {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }

    /// The dealer id an error refers to, when it refers to one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::NotFound(key) | Error::AlreadyExists(key) => Some(key),
            Error::Decode { key, .. } | Error::Encode { key, .. } => Some(key),
            Error::Storage(_) | Error::Config(_) => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Storage(err) => write!(f, "Storage error: {}", err),
            Error::NotFound(key) => write!(f, "The asset {} does not exist", key),
            Error::AlreadyExists(key) => write!(f, "The asset {} already exists", key),
            Error::Decode { key, reason } => {
                write!(f, "Failed to decode asset {}: {}", key, reason)
            }
            Error::Encode { key, reason } => {
                write!(f, "Failed to encode asset {}: {}", key, reason)
            }
            Error::Config(err) => write!(f, "Configuration error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

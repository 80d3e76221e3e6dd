use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("payment processor is not enabled")]
    Disabled,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(String),
    #[error("{code}: {message}")]
    Processing { code: String, message: String },
}

impl PaymentError {
    pub fn processing(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processing {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable error code for diagnostics and acknowledgment payloads.
    pub fn code(&self) -> &str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Disabled => "DISABLED",
            Self::Serialization(_) => "SERIALIZATION",
            Self::Io(_) => "IO",
            Self::Store(_) => "STORE",
            Self::Processing { code, .. } => code,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Store(err.to_string())
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Malformed {format} data: {message}")]
    MalformedFormat {
        format: &'static str,
        message: String,
    },

    #[error("Failed to persist sidecar {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Embedded mirror write failed for {path}: {message}")]
    MirrorWrite { path: String, message: String },

    #[error("Description too long for {format}: {length} bytes (max {max})")]
    TextTooLong {
        format: &'static str,
        length: usize,
        max: usize,
    },

    #[error("Invalid segment name {0:?}")]
    InvalidSegmentName(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Capability missing: {0}")]
    CapabilityMissing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl MetadataError {
    pub(crate) fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        MetadataError::MalformedFormat {
            format,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;

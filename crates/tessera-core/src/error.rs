use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("Datastore is frozen")]
    Frozen,

    #[error("Invalid image coordinate axis {axis}; allowed axes are {allowed:?}")]
    InvalidAxis { axis: String, allowed: Vec<String> },

    #[error("Unrecognized save mode: {0}")]
    UnrecognizedSaveMode(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Listener error: {0}")]
    Listener(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        TesseraError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TesseraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_axis_message_names_axis() {
        let err = TesseraError::InvalidAxis {
            axis: "channel".into(),
            allowed: vec!["time".into(), "position".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("channel"));
        assert!(msg.contains("position"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::AlreadyExists, "taken");
        let err: TesseraError = io_err.into();
        assert!(matches!(err, TesseraError::Io(_)));
    }
}

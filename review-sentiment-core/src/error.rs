use {
    std::{io, path::PathBuf},
    thiserror::Error,
};

pub type Result<T> = std::result::Result<T, SentimentError>;

#[derive(Error, Debug)]
pub enum SentimentError {
    /// A single input record could not be used.
    #[error("data error: {0}")]
    Data(String),

    /// Training cannot produce a meaningful model with the given data and settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("artifact error at {path}: {message}")]
    Artifact {
        path: PathBuf,
        message: String,
    },

    #[error("classifier was trained against vectorizer {expected:08x}, but loaded vectorizer is {actual:08x}")]
    ArtifactMismatch {
        expected: u32,
        actual: u32,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SentimentError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Artifact {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<bincode::Error> for SentimentError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SentimentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading inputs, building features or ranking.
#[derive(Debug, Error)]
pub enum LtrError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("no relevance label for query '{query}' and url '{url}'")]
    MissingLabel { query: String, url: String },

    #[error("model error: {0}")]
    Model(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LtrError {
    pub(crate) fn parse(path: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_string(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LtrError>;

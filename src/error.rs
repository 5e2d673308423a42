use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseNotesError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read options file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse options file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse options file at {path}: {source}")]
    ConfigParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine options directory")]
    NoOptsDir,

    #[error("Bad options or required options missing: {}", missing.join(", "))]
    MissingOptions { missing: Vec<&'static str> },

    #[error("No query: set jira.filter or a sprint field")]
    NoQuery,

    #[error("No sprint value to name the release notes after")]
    NoSprint,

    #[error("No project specified and none recorded in the working file")]
    NoProject,

    #[error("Unknown output formatter: {0}")]
    UnknownFormatter(String),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Resource '{name}' not found: {reason}")]
    ResourceNotFound { name: String, reason: String },

    #[error("Jira query failed with response code {status}: {message}")]
    Fetch { status: u16, message: String },

    #[error("Malformed issue payload: {0}")]
    Normalization(String),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatter '{name}' failed: {message}")]
    Formatter { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, ReleaseNotesError>;

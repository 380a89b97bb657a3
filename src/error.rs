use crate::model::ThreadDump;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No "Full thread dump" marker anywhere in the input. The partial dump
    /// still carries the capture date.
    #[error("couldn't find a valid java jstack output")]
    InvalidFormat { partial: Box<ThreadDump> },

    #[error("invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("thread {tid} has no stack fingerprint (run per-thread analysis first)")]
    Unanalyzed { tid: String },

    #[error("unknown thread '{0}'")]
    UnknownThread(String),
}

impl DumpError {
    /// The otherwise-empty dump returned alongside `InvalidFormat`.
    pub fn partial_dump(&self) -> Option<&ThreadDump> {
        match self {
            DumpError::InvalidFormat { partial } => Some(partial),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DumpError>;

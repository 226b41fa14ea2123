#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskpadError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },

    #[error("no task found matching: {0}")]
    TaskNotFound(String),

    #[error("multiple tasks match '{pattern}': {count} matches")]
    AmbiguousTask { pattern: String, count: usize },

    #[error("task text must not be empty")]
    EmptyText,

    #[error("{0}")]
    Other(String),
}

//! Error types shared by the compilers and the configuration loader.

use thiserror::Error;

/// Errors produced while turning criteria into query text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Condition '{id}' is missing its {field}")]
    IncompleteCondition { id: String, field: &'static str },

    #[error("Unsupported condition operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid value for '{attribute}' ({condition}): {message}")]
    InvalidValue {
        attribute: String,
        condition: String,
        message: String,
    },

    #[error("Broken relation chain at '{data_id}': {message}")]
    BrokenRelationChain { data_id: String, message: String },
}

/// Errors produced while loading the form label configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(String),

    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CompileError>;

use std::path::PathBuf;

use thiserror::Error;

use crate::generation::extract::ExtractError;
use crate::layout::FontError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Every failure is fatal for the current letter; nothing is partially saved.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input error: {0}")]
    Input(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    FontResolution(#[from] FontError),

    #[error("Unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, logged alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Input(_) | AppError::Extract(_) => "INPUT_ERROR",
            AppError::FontResolution(_) => "FONT_RESOLUTION_ERROR",
            AppError::Write { .. } => "WRITE_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit status for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Input(_) | AppError::Extract(_) | AppError::Config(_) => 2,
            AppError::FontResolution(_) => 3,
            AppError::Write { .. } => 4,
            AppError::Llm(_) => 5,
            AppError::Internal(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_error_converts_with_its_message() {
        let err: AppError = FontError::NotFound("Inter".to_string()).into();
        assert_eq!(err.code(), "FONT_RESOLUTION_ERROR");
        assert!(err.to_string().contains("'Inter' not found"), "got {err}");
    }

    #[test]
    fn test_llm_error_converts() {
        let err: AppError = LlmError::EmptyContent.into();
        assert_eq!(err.code(), "LLM_ERROR");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_write_error_names_the_path() {
        let err = AppError::Write {
            path: PathBuf::from("/nope/letter.pdf"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/nope/letter.pdf"));
        assert_eq!(err.exit_code(), 4);
    }
}

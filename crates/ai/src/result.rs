use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markdown::{self, Block};

/// Answer returned by the compliance checker.
///
/// This is advice shown to the user, not a compliance decision: nothing here is
/// written back to the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Markdown text.
    pub content: String,
}

impl CheckResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Parse the markdown answer for display.
    pub fn blocks(&self) -> Vec<Block> {
        markdown::parse(&self.content)
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid check request: {0}")]
    InvalidInput(String),

    #[error("compliance check request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("compliance check failed with status {status}")]
    Api { status: u16, body: String },

    #[error("unexpected compliance check response: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Short text for the toast shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            AiError::InvalidInput(_) => "Please check your question and image and try again.",
            AiError::Http(err) if err.is_timeout() => "The compliance checker took too long to answer.",
            AiError::Http(_) | AiError::Api { .. } | AiError::InvalidResponse(_) => {
                "The compliance checker is unavailable right now."
            }
        }
    }
}

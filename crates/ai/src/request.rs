use serde::{Deserialize, Serialize};

use gpsrhub_core::FileUpload;

use crate::result::AiError;

/// What the user typed (and optionally attached) in the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCheckRequest {
    pub prompt: String,
    pub image: Option<FileUpload>,
}

impl ComplianceCheckRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: FileUpload) -> Self {
        self.image = Some(image);
        self
    }

    /// Reject requests that should never reach the network.
    pub fn validate(&self, max_image_bytes: usize) -> Result<(), AiError> {
        if self.prompt.trim().is_empty() {
            return Err(AiError::InvalidInput("prompt cannot be empty".to_string()));
        }
        if let Some(image) = &self.image {
            if !image.is_image() {
                return Err(AiError::InvalidInput(format!(
                    "{} is not an image ({})",
                    image.file_name, image.content_type
                )));
            }
            if image.is_empty() {
                return Err(AiError::InvalidInput(format!("{} is empty", image.file_name)));
            }
            if image.len() > max_image_bytes {
                return Err(AiError::InvalidInput(format!(
                    "{} is larger than {max_image_bytes} bytes",
                    image.file_name
                )));
            }
        }
        Ok(())
    }
}

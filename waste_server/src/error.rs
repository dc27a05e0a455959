//! Failures while provisioning or building the classifier.
//!
use std::{fmt, path::PathBuf};

/// Shown next to checkpoint load failures.
pub const CHECKPOINT_HINT: &str =
    "Please ensure the model file is a valid MobileNetV2 checkpoint for binary classification.";

/// Reason why no model is available.
#[derive(Debug)]
pub enum ModelError {
    /// Network or HTTP failure while fetching the checkpoint.
    Download { url: String, reason: String },
    /// The checkpoint is not on disk after provisioning.
    MissingCheckpoint { path: PathBuf },
    /// The checkpoint could not be parsed or does not end in a binary head.
    CheckpointLoad { path: PathBuf, reason: String },
}

impl ModelError {
    /// Additional advice for the user, if there is any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ModelError::CheckpointLoad { .. } => Some(CHECKPOINT_HINT),
            _ => None,
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Download { url, reason } => {
                write!(f, "Failed to download model from {url}: {reason}")
            }
            ModelError::MissingCheckpoint { path } => write!(
                f,
                "Model file {} not found. Please check the download URL.",
                path.display()
            ),
            ModelError::CheckpointLoad { path, reason } => write!(
                f,
                "Error loading model checkpoint {}: {reason}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ModelError {}

//! JSON messages of the prediction endpoint.
//!
use serde::{Deserialize, Serialize};

use crate::decision::{Label, Prediction};

/// Name of the multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

/// Successful answer of `POST /api/predict`.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct PredictResponse {
    pub label: Label,
    pub confidence: f64,
    pub confidence_text: String,
    pub probability: f64,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            label: prediction.label,
            confidence: prediction.confidence,
            confidence_text: prediction.confidence_text(),
            probability: prediction.probability,
        }
    }
}

/// Error answer of `POST /api/predict`.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

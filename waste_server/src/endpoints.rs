//! Endpoints of HTTP server.
//!
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use bytes::Bytes;
use common::protocol::{ErrorResponse, PredictResponse, UPLOAD_FIELD};
use image::{ImageFormat, RgbImage};

use crate::{
    nn::classify,
    page::{render_failed, render_ready, MODEL_UNAVAILABLE_WARNING},
    state::AppState,
};

/// Build the HTTP router around the shared state.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthcheck", get(healthcheck))
        .route("/api/predict", post(predict))
        .layer(Extension(state))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Health check endpoint.
pub async fn healthcheck() -> &'static str {
    "healthy"
}

/// Start of a session: load the model if needed and render the page.
pub async fn index(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    match state.model.get_or_load_with_notices().await {
        Ok((_model, notices)) => Html(render_ready(&notices)),
        Err(e) => {
            log::error!("{e}");
            log::warn!("{MODEL_UNAVAILABLE_WARNING}");
            Html(render_failed(&e))
        }
    }
}

/// Classify one uploaded JPEG or PNG image.
pub async fn predict(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, PredictError> {
    let Some(model) = state.model.get() else {
        return Err(PredictError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            MODEL_UNAVAILABLE_WARNING,
        ));
    };

    let data = read_upload(&mut multipart).await?;
    let image = decode_upload(&data)?;
    log::info!(
        "Classifying uploaded {}x{} image",
        image.width(),
        image.height()
    );

    let prediction = tokio::task::spawn_blocking(move || classify(model.as_ref(), &image))
        .await
        .map_err(|e| PredictError::internal(e.to_string()))?
        .map_err(|e| PredictError::internal(format!("{e:#}")))?;

    log::info!(
        "Prediction: {} ({})",
        prediction.label,
        prediction.confidence_text()
    );

    Ok(Json(prediction.into()))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, PredictError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PredictError::bad_request(e.to_string()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return field
                .bytes()
                .await
                .map_err(|e| PredictError::bad_request(e.to_string()));
        }
    }

    Err(PredictError::bad_request(format!(
        "missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// Decode an upload into a 3-channel RGB image, accepting only JPEG and PNG.
pub fn decode_upload(data: &[u8]) -> Result<RgbImage, PredictError> {
    let unsupported = || {
        PredictError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported file type, expected a JPEG or PNG image",
        )
    };

    let format = image::guess_format(data).map_err(|_| unsupported())?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(unsupported());
    }

    let image = image::load_from_memory_with_format(data, format)
        .map_err(|e| PredictError::bad_request(format!("could not decode image: {e}")))?;

    Ok(image.to_rgb8())
}

/// Failed prediction request, rendered as JSON `ErrorResponse`.
#[derive(Debug)]
pub struct PredictError {
    status: StatusCode,
    message: String,
}

impl PredictError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        log::warn!("Prediction request failed ({}): {}", self.status, self.message);
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

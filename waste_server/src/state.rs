//! Process-wide model state shared by all handlers.
//!
use std::{path::PathBuf, sync::Arc};

use reqwest::Client;
use tokio::sync::OnceCell;

use crate::{
    error::ModelError,
    nn::{InferModel, WasteClassifier},
    provision::ensure_checkpoint,
};

pub type SharedModel = Arc<dyn InferModel>;

pub const DOWNLOAD_NOTICE: &str = "Model downloaded successfully!";
pub const LOAD_NOTICE: &str = "Model loaded successfully!";

/// Where the checkpoint comes from and where it is cached.
#[derive(Debug, Clone)]
pub struct ModelSource {
    pub url: String,
    pub path: PathBuf,
}

/// Lazily provisioned and built classifier.
///
/// Initialization runs at most once at a time. A loaded model is kept for the lifetime of the
/// process; a failure is handed back to the caller and the next caller tries again.
pub struct ModelCell {
    source: Option<ModelSource>,
    client: Client,
    model: OnceCell<SharedModel>,
}

impl ModelCell {
    pub fn new(source: ModelSource, client: Client) -> Self {
        Self {
            source: Some(source),
            client,
            model: OnceCell::new(),
        }
    }

    /// Cell holding an already built model.
    pub fn preloaded(model: SharedModel) -> Self {
        Self {
            source: None,
            client: Client::new(),
            model: OnceCell::new_with(Some(model)),
        }
    }

    /// Model if it has been loaded before.
    pub fn get(&self) -> Option<SharedModel> {
        self.model.get().cloned()
    }

    /// Return the model, provisioning and building it first if needed.
    pub async fn get_or_load(&self) -> Result<SharedModel, ModelError> {
        self.get_or_load_with_notices()
            .await
            .map(|(model, _notices)| model)
    }

    /// Like `get_or_load`, also returning the notices of the steps this call performed.
    ///
    /// The notices are empty when the model had been loaded by an earlier call.
    pub async fn get_or_load_with_notices(
        &self,
    ) -> Result<(SharedModel, Vec<&'static str>), ModelError> {
        let mut notices = Vec::new();
        let model = self
            .model
            .get_or_try_init(|| self.load(&mut notices))
            .await?;

        Ok((Arc::clone(model), notices))
    }

    async fn load(&self, notices: &mut Vec<&'static str>) -> Result<SharedModel, ModelError> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ModelError::MissingCheckpoint {
                path: PathBuf::new(),
            })?;

        let cached = source.path.exists();
        let path = ensure_checkpoint(&self.client, &source.url, &source.path).await?;
        if !cached {
            notices.push(DOWNLOAD_NOTICE);
        }

        let classifier = tokio::task::spawn_blocking(move || WasteClassifier::from_checkpoint(&path))
            .await
            .map_err(|e| ModelError::CheckpointLoad {
                path: source.path.clone(),
                reason: e.to_string(),
            })??;
        notices.push(LOAD_NOTICE);

        Ok(Arc::new(classifier))
    }
}

/// State handed to every HTTP handler.
pub struct AppState {
    pub model: ModelCell,
}

impl AppState {
    pub fn new(model: ModelCell) -> Self {
        Self { model }
    }
}

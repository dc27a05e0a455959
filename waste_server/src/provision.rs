//! Provisioning of the model checkpoint.
//!
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use futures::StreamExt;
use reqwest::{Client, Response};
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
};

use crate::error::ModelError;

/// Capacity of the buffer between the response stream and the file.
pub const CHUNK_SIZE: usize = 8192;

/// Make sure the checkpoint exists at `path`, downloading it from `url` if it does not.
///
/// An existing file is returned as is, without touching the network and without verifying its
/// contents.
pub async fn ensure_checkpoint(
    client: &Client,
    url: &str,
    path: impl AsRef<Path>,
) -> Result<PathBuf, ModelError> {
    let path = path.as_ref();
    if path.exists() {
        log::debug!("Reusing checkpoint at {}", path.display());
        return Ok(path.to_owned());
    }

    log::info!("Downloading model from {url}... this may take a moment!");
    let num_bytes = download_file(client, url, path).await?;
    log::info!(
        "Model downloaded successfully! ({num_bytes} bytes to {})",
        path.display()
    );

    Ok(path.to_owned())
}

/// Download a file from a URL to a given filepath.
///
/// The body is streamed into `<filepath>.part`, which is renamed to `filepath` once complete.
pub async fn download_file(client: &Client, url: &str, filepath: &Path) -> Result<u64, ModelError> {
    let download_error = |reason: String| ModelError::Download {
        url: url.to_owned(),
        reason,
    };

    let resp = client
        .get(url)
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(|e| download_error(e.to_string()))?;

    if let Some(parent) = filepath.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| download_error(e.to_string()))?;
    }

    let partial = partial_path(filepath);
    match write_body(resp, &partial).await {
        Ok(num_bytes) => {
            tokio::fs::rename(&partial, filepath)
                .await
                .map_err(|e| download_error(e.to_string()))?;
            Ok(num_bytes)
        }
        Err(reason) => {
            tokio::fs::remove_file(&partial).await.ok();
            Err(download_error(reason))
        }
    }
}

async fn write_body(resp: Response, filepath: &Path) -> Result<u64, String> {
    let file = File::create(filepath).await.map_err(|e| e.to_string())?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = resp.bytes_stream();
    let mut num_bytes = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        writer.write_all(&chunk).await.map_err(|e| e.to_string())?;
        num_bytes += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| e.to_string())?;
    Ok(num_bytes)
}

fn partial_path(filepath: &Path) -> PathBuf {
    let mut name = OsString::from(filepath.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

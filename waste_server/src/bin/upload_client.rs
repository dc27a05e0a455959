//! Send an image to a running waste classification server and print the answer.
//!
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use common::protocol::{ErrorResponse, PredictResponse, UPLOAD_FIELD};
use env_logger::TimestampPrecision;
use reqwest::multipart;

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address of the waste classification server
    #[clap(long, default_value = "127.0.0.1:3000")]
    address: String,

    /// JPEG or PNG image to classify
    image: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let data = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());

    log::info!("Uploading {} ({} bytes)", &file_name, data.len());

    let part = multipart::Part::bytes(data).file_name(file_name);
    let form = multipart::Form::new().part(UPLOAD_FIELD, part);

    let resp = reqwest::Client::new()
        .post(&format!("http://{}/api/predict", &args.address))
        .multipart(form)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let error: ErrorResponse = resp.json().await?;
        bail!("server answered {status}: {}", error.error);
    }

    let prediction: PredictResponse = resp.json().await?;
    println!("Prediction: This is {} waste.", prediction.label);
    println!(
        "Confidence: The model is {} confident in this prediction.",
        prediction.confidence_text
    );

    Ok(())
}

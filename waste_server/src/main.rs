//! Waste classification server binary.
//!
use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use env_logger::TimestampPrecision;
use waste_server::{
    endpoints::router,
    state::{AppState, ModelCell, ModelSource},
    DEFAULT_MODEL_PATH, DEFAULT_MODEL_URL,
};

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address to serve the web page on
    #[clap(long, default_value = "127.0.0.1:3000")]
    server_address: String,

    /// URL to download the model checkpoint from if it is not cached yet
    #[clap(long, default_value = DEFAULT_MODEL_URL)]
    model_url: String,

    /// Local path of the cached model checkpoint
    #[clap(long, default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Largest accepted upload in bytes
    #[clap(long, default_value_t = 10 * 1024 * 1024)]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logger
    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    // The model is provisioned and built on the first page visit
    let source = ModelSource {
        url: args.model_url,
        path: args.model_path,
    };
    let state = Arc::new(AppState::new(ModelCell::new(
        source,
        reqwest::Client::new(),
    )));

    let app = router(state, args.max_upload_bytes);

    // Serve HTTP server
    let addr: SocketAddr = args.server_address.parse()?;
    log::info!("Serving on http://{addr}");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

//! Command-line generation runner.
//!
//! Reads a JSON request from the file given as the first argument (or stdin),
//! runs the pipeline and prints the report as JSON. Ctrl-C cancels.

use std::io::Read;

use anyhow::Context;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{error, info};

use vthumb_engine::{init_tracing, GenerationPipeline, GenerationRequest};
use vthumb_models::{GenerationOptions, StyleProfile, VideoContext};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliRequest {
    context: VideoContext,
    #[serde(default)]
    options: GenerationOptions,
    #[serde(default)]
    style_profile: Option<StyleProfile>,
    #[serde(default)]
    screenshots: Vec<String>,
}

impl From<CliRequest> for GenerationRequest {
    fn from(cli: CliRequest) -> Self {
        let mut request =
            GenerationRequest::new(cli.context, cli.options).with_screenshots(cli.screenshots);
        request.style_profile = cli.style_profile;
        request
    }
}

fn read_request() -> anyhow::Result<CliRequest> {
    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read request file {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("request is not valid JSON")
}

async fn run() -> anyhow::Result<()> {
    let request = read_request()?;
    let pipeline = GenerationPipeline::from_env().context("failed to configure pipeline")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = cancel_tx.send(true);
        }
    });

    let report = pipeline
        .generate_with_cancel(request.into(), Some(cancel_rx))
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    info!("Starting vthumb");

    if let Err(e) = run().await {
        error!("Generation failed: {:#}", e);
        std::process::exit(1);
    }
}

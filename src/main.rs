use std::io;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use embed_pipeline::{PipelineConfig, PipelineRunner, ReportSink, documents, telemetry};
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from an optional .env file.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("failed to read .env");
        }
    }

    telemetry::init("info", Level::INFO).context("failed to install tracing subscriber")?;

    let cfg = PipelineConfig::from_env().context("invalid pipeline configuration")?;
    info!(
        "collection='{}' store={:?} embedder={:?}",
        cfg.store.collection, cfg.store.kind, cfg.embedding.kind
    );

    let docs = documents::load(&cfg).context("failed to load documents")?;
    // Stage lines go to stdout as each stage ends, so they survive an abort.
    let stdout: ReportSink = Arc::new(Mutex::new(io::stdout()));
    let runner = PipelineRunner::new(cfg)?.with_output(stdout);
    let report = runner.run(&docs).await.context("pipeline aborted")?;

    print!("{}", report.summary());
    println!("done!");
    Ok(())
}

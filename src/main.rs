use std::{env, path::Path, process, sync::Arc};

use anyhow::Context;
use log::{error, info};
use mnist_pipeline::{ConsoleReporter, IdxReader, ParameterStore, Pipeline, PipelineConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("Abort! {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => PipelineConfig::load(Path::new(&path))?,
        None => PipelineConfig::default(),
    };
    let topology = config.topology()?;

    println!("MNIST-NN: a simple 2-layer neural network processing the MNIST handwriting images");

    let store = ParameterStore::from_files(&config.params).context("loading network parameters")?;
    let source = IdxReader::open(&config.images, &config.labels, store.inputs())?;
    let records = config
        .records
        .unwrap_or(source.image_header().count as usize);
    info!("config: {config:?}");

    let pipeline = Pipeline::new(Arc::new(store), topology, records, config.output_bias);
    let reporter = ConsoleReporter::stdout(config.progress_every);
    let summary = pipeline.run(source, reporter).await?;

    info!(
        "accuracy {:.2}% over {} records",
        summary.accuracy() * 100.,
        summary.records
    );
    Ok(())
}

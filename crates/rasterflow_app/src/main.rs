// SPDX-License-Identifier: MIT OR Apache-2.0
//! rasterflow - headless runner for raster dataflow pipelines
//!
//! Builds the demo pipeline, runs it against in-memory display surfaces and
//! writes every surface out as a PNG once the engine stops.
//!
//! Usage: `rasterflow [CONFIG]`

mod config;
mod demo;
mod error;

use clap::Parser;
use config::{AppConfig, RunMode};
use error::AppError;
use image::ImageFormat;
use rasterflow_graph::{
    BuiltinAssets, Engine, IntervalDriver, NodeFactory, SurfaceRegistry, SurfaceResolver,
    DEFAULT_CANVAS,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "rasterflow", version, about = "Run a raster dataflow pipeline headlessly")]
struct Args {
    /// RON configuration file. Defaults apply when omitted.
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rasterflow_app=info,rasterflow_graph=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rasterflow v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        tracing::error!("rasterflow failed: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = match args.config {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };

    let surfaces = Arc::new(SurfaceRegistry::new());
    for surface in &config.surfaces {
        surfaces.create(surface.name.as_str(), surface.width, surface.height);
    }
    let (canvas, size) = config
        .surfaces
        .first()
        .map_or((DEFAULT_CANVAS, (512, 512)), |s| (s.name.as_str(), (s.width, s.height)));

    let factory = NodeFactory::new(
        Arc::new(BuiltinAssets::new(&config.assets_dir)),
        surfaces.clone(),
    );
    let graph = demo::build(&factory, canvas, size)?;
    if let Ok(description) = ron::ser::to_string_pretty(&graph.describe(), Default::default()) {
        tracing::debug!("Pipeline:\n{description}");
    }

    let mut engine = Engine::new(graph, config.engine);
    match config.run {
        RunMode::SingleFrame => engine.run_single_frame().await?,
        RunMode::For { seconds } => {
            let duration = Duration::try_from_secs_f64(seconds).unwrap_or_default();
            let handle = engine.stop_handle();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                handle.stop();
            });

            let mut driver = IntervalDriver::new(config.refresh_hz);
            engine.run(&mut driver).await?;
        }
    }
    tracing::info!("Ran {} frames", engine.frames());

    save_surfaces(&surfaces, &config.output_dir)
}

fn save_surfaces(surfaces: &SurfaceRegistry, output_dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(output_dir).map_err(|source| AppError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    for name in surfaces.names() {
        let Some(surface) = surfaces.resolve(&name) else {
            continue;
        };
        let path = output_dir.join(format!("{name}.png"));
        surface
            .read()
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| AppError::Image {
                path: path.clone(),
                source,
            })?;
        tracing::info!("Wrote {}", path.display());
    }
    Ok(())
}

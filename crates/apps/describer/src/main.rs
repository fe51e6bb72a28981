use app_state::{DEFAULT_CONFIG_PATH, load_app_settings};
use clap::Parser;
use color_eyre::Result;
use describer::batch::run_batch;
use describer::image_list::resolve_sources;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Generate descriptions, face counts and keywords for a list of images.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Settings file.
    #[clap(long, short, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides `output.path`.
    #[clap(long, short)]
    output: Option<PathBuf>,
    /// Image url to analyze, repeatable. Replaces the configured images.
    #[clap(long = "image", short)]
    images: Vec<String>,
    /// File with one image url per line. Replaces the configured images.
    #[clap(long)]
    images_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let mut settings = load_app_settings(&args.config)?;
    let level = &settings.logging.level;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("describer={level},vision_analysis={level},app_state={level}").into()
        }))
        .with(fmt::layer())
        .init();

    if let Some(output) = args.output {
        settings.output.path = output;
    }
    let sources =
        resolve_sources(&settings.images, &args.images, args.images_file.as_deref()).await?;
    if sources.is_empty() {
        warn!("No images to analyze.");
    }

    let summary = run_batch(&settings, &sources).await?;
    info!(
        "🏁 Done: {} recorded, {} skipped, {} dropped{}",
        summary.recorded,
        summary.skipped,
        summary.persistence_failures,
        if summary.cancelled { " (cancelled)" } else { "" }
    );

    Ok(())
}

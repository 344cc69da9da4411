use clap::{Parser, Subcommand};
use image::ImageReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use oilmeter::config::{self, Configuration, DEBUG_LOG_FILTER, DEFAULT_OPTIONS_PATH, TOKEN_ENV};
use oilmeter::poller;
use oilmeter::publish::HomeAssistantPublisher;
use oilmeter::source::HttpCamera;
use oilmeter::vision::build_recognizer;
use oilmeter::{ReadingOutcome, ReadingPipeline};

#[derive(Parser)]
#[command(name = "oilmeter")]
#[command(about = "Read an oil meter's digit display from a camera snapshot")]
struct Cli {
    /// Path to the add-on options file
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_OPTIONS_PATH)]
    options: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the camera and publish readings to Home Assistant
    Run,

    /// Read a single image file and print the result
    Read {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Save conditioning stages to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env();
    let filter_from_env = env_filter.is_ok();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let options = config::load_options(&args.options)?.unwrap_or_else(|| {
        warn!("{} not available, using default options", args.options.display());
        config::Options::default()
    });
    if options.debug && !filter_from_env {
        filter_handle.modify(|filter| *filter = EnvFilter::new(DEBUG_LOG_FILTER))?;
    }
    let config = Configuration::from_options(options, std::env::var(TOKEN_ENV).ok())?;

    match args.command {
        Command::Run => run(config).await,
        Command::Read { image_path, debug_out } => read(&config, image_path, debug_out),
    }
}

async fn run(config: Configuration) -> anyhow::Result<()> {
    info!("=== Oil meter reader started ===");
    info!("Camera: {}", config.camera_address);
    info!("Poll interval: {}s", config.poll_interval.as_secs());
    info!(
        "ROI: x={}, y={}, w={}, h={} (reference {}x{})",
        config.roi.x, config.roi.y, config.roi.w, config.roi.h,
        config.reference.width, config.reference.height
    );
    info!("OCR engine: {:?}", config.ocr.engine);
    info!("Debug: {}", config.debug);

    if config.publisher.token.is_none() {
        warn!("{} is not set, state updates will be unauthenticated", TOKEN_ENV);
    }

    let recognizer = build_recognizer(&config.ocr)?;
    let pipeline = Arc::new(ReadingPipeline::new(&config, recognizer));
    let camera = HttpCamera::new(config.capture_url())?;
    let publisher = HomeAssistantPublisher::new(&config.publisher)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    poller::run(&config, &camera, pipeline, &publisher, shutdown).await
}

fn read(config: &Configuration, image_path: PathBuf, debug_out: Option<PathBuf>) -> anyhow::Result<()> {
    let img = ImageReader::open(&image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    info!("Image loaded: {}x{}", img.width(), img.height());

    let recognizer = build_recognizer(&config.ocr)?;
    let mut pipeline = ReadingPipeline::new(config, recognizer);
    if let Some(debug_dir) = debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    match pipeline.run(&img) {
        ReadingOutcome::Done(result) => {
            println!("Raw text: {:?}", result.raw_text);
            match result.numeric_value {
                Some(value) => println!("Reading: {} L", value),
                None => println!("No valid number recognized"),
            }
        }
        ReadingOutcome::Failed { raw_text, error } => {
            println!("Reading failed: {}", error);
            if let Some(raw_text) = raw_text {
                println!("Raw text: {:?}", raw_text);
            }
        }
    }

    Ok(())
}

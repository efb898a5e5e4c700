// Breedsight Command Line Interface
// Dog breed recognition for photos and camera frame streams

mod settings;

use anyhow::Context;
use breedsight_core::{ClassificationBatch, Error as CoreError, SelectionResult, TopKSelector};
use breedsight_eye::camera::DirectoryFrameSource;
use breedsight_eye::display::{ChannelSink, DisplayUpdate, LogSink, PresentationSink};
use breedsight_eye::models::Classifier;
use breedsight_eye::{PhotoSession, StreamSession};
use clap::{Parser, Subcommand};
use settings::AppConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "breedsight")]
#[command(about = "Dog breed recognition from photos and camera frames", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the top-k selector over a JSON classification batch
    Select {
        /// Input file, or "-" for stdin
        #[arg(long, short, default_value = "-")]
        input: String,

        /// Print the selection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recognize the breed in a single photo
    Photo {
        /// Image file
        path: PathBuf,
    },

    /// Recognize images in a directory as a camera stream
    Stream {
        /// Directory of frames, replayed in file name order
        dir: PathBuf,

        /// Stop after this many presented results
        #[arg(long)]
        max_frames: Option<u64>,

        /// Replay the directory forever
        #[arg(long = "loop")]
        looping: bool,

        /// Only log results instead of printing them
        #[arg(long)]
        headless: bool,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.log_level, cli.verbose);

    match cli.command {
        Commands::Select { input, json } => run_select(&config, &input, json)?,
        Commands::Photo { path } => run_photo(&config, &path).await?,
        Commands::Stream { dir, max_frames, looping, headless } => {
            run_stream(&config, &dir, max_frames, looping, headless).await?
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_tracing(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_select(config: &AppConfig, input: &str, json: bool) -> anyhow::Result<()> {
    let content = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Cannot read {}", input))?
    };

    print!("{}", select_output(config, &content, json)?);
    Ok(())
}

/// Selector output for a JSON batch, either as display text or as JSON.
///
/// An empty batch renders the fallback, or an empty selection in JSON mode.
fn select_output(config: &AppConfig, content: &str, json: bool) -> anyhow::Result<String> {
    let batch: ClassificationBatch =
        serde_json::from_str(content).context("Input is not a classification batch")?;
    let selector = TopKSelector::from_config(&config.selector);

    let selection = match selector.select(&batch) {
        Ok(selection) => Some(selection),
        Err(CoreError::NoResults) => {
            warn!("Batch is empty");
            None
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        let selection = selection.unwrap_or_else(|| SelectionResult {
            top_summary: String::new(),
            winning_label: None,
        });
        return Ok(format!("{}\n", serde_json::to_string_pretty(&selection)?));
    }

    let update = match selection {
        Some(selection) => DisplayUpdate::from_selection(&selection, &config.selector),
        None => DisplayUpdate::no_results(&config.selector),
    };
    Ok(format_update(&update))
}

async fn run_photo(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Cannot read {:?}", path))?;

    let classifier = load_classifier(config)?;
    let (sink, receiver) = ChannelSink::new();
    let session = PhotoSession::new(
        classifier,
        config.selector.clone(),
        Arc::new(sink),
        &config.vision,
    )?;

    let handle = session.submit(bytes);
    // The worker task holds the last sender; the display loop ends with it
    drop(session);
    let mut receiver = receiver;
    while let Some(update) = receiver.recv().await {
        render(&update);
    }

    let outcome = handle.await??;
    info!("Photo recognized as {} at {}", outcome.result_text, outcome.completed_at);
    Ok(())
}

async fn run_stream(
    config: &AppConfig,
    dir: &Path,
    max_frames: Option<u64>,
    looping: bool,
    headless: bool,
) -> anyhow::Result<()> {
    let source = DirectoryFrameSource::open(dir, looping)?;
    let limit = match (max_frames, looping) {
        (Some(limit), _) => Some(limit),
        (None, false) => Some(source.len() as u64),
        (None, true) => None,
    };

    let classifier = load_classifier(config)?;
    let (channel_sink, receiver) = ChannelSink::new();
    let (sink, receiver) = if headless {
        (Arc::new(LogSink) as Arc<dyn PresentationSink>, None)
    } else {
        (Arc::new(channel_sink) as Arc<dyn PresentationSink>, Some(receiver))
    };

    let session = StreamSession::new(classifier, config.selector.clone(), sink, &config.vision)?;
    session.start(Arc::new(source))?;
    info!("Stream session {} started on {:?}", session.id(), dir);

    let mut receiver = follow_session(&session, receiver, limit).await;
    session.stop().await;

    if let Some(receiver) = receiver.as_mut() {
        while let Ok(update) = receiver.try_recv() {
            render(&update);
        }
    }

    let stats = session.stats();
    info!(
        "Stream finished: {} processed, {} skipped, {} failed",
        stats.processed, stats.skipped, stats.failed
    );
    Ok(())
}

/// Render updates until `limit` frames were handled or the user interrupts.
///
/// Failed frames count towards the limit so a bad file cannot stall a bounded run.
async fn follow_session(
    session: &StreamSession,
    mut receiver: Option<UnboundedReceiver<DisplayUpdate>>,
    limit: Option<u64>,
) -> Option<UnboundedReceiver<DisplayUpdate>> {
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    loop {
        let next_update = async {
            match receiver.as_mut() {
                Some(receiver) => receiver.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            Some(update) = next_update => render(&update),
            _ = ticker.tick() => {
                let stats = session.stats();
                if limit.is_some_and(|limit| stats.processed + stats.failed >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    receiver
}

fn render(update: &DisplayUpdate) {
    print!("{}", format_update(update));
}

fn format_update(update: &DisplayUpdate) -> String {
    let mut out = String::new();
    if let Some(debug_text) = update.debug_text.as_deref().filter(|text| !text.is_empty()) {
        out.push_str(debug_text);
        out.push('\n');
    }
    out.push_str(&format!("=> {}\n", update.result_text));
    if let Some(example) = &update.example_image {
        out.push_str(&format!("   example: {}\n", example.display()));
    }
    out
}

#[cfg(feature = "onnx")]
fn load_classifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Classifier>> {
    let classifier = breedsight_eye::models::OnnxClassifier::load(Arc::new(config.vision.clone()))
        .context("Failed to load classification model")?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "onnx"))]
fn load_classifier(_config: &AppConfig) -> anyhow::Result<Arc<dyn Classifier>> {
    anyhow::bail!("breedsight was built without the `onnx` feature; photo and stream recognition are unavailable")
}

//! meterscan - replay a recorded stream of meter frames
//!
//! Feeds recorded prediction tensors through the full recognition pipeline
//! and prints the committed reading. Useful for tuning thresholds against
//! captured footage without a camera attached.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Array2;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use meterscan::config::{load_config, RecognitionConfig};
use meterscan::{DetectOutcome, DigitDetector, FrameReading, LabelTable, ScanSession, SessionState};

/// Replay recorded meter frames through the recognition pipeline
#[derive(Parser, Debug)]
#[command(name = "meterscan")]
#[command(about = "Recognize a meter reading from recorded detection tensors")]
struct Args {
    /// JSON file holding one prediction tensor per frame,
    /// each shaped [channels][elements]
    frames: PathBuf,

    /// Configuration file (TOML); defaults to the per-user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Newline-delimited label resource; defaults to the digits 0-9
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Keep replaying after the first committed reading
    #[arg(long)]
    continuous: bool,

    /// Log per-frame outcomes
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = resolve_config(args.config.as_deref())?;
    let labels = match &args.labels {
        Some(path) => LabelTable::load_or_empty(path),
        None => LabelTable::digits(),
    };

    let frames = load_frames(&args.frames)?;
    info!("Replaying {} frames from {:?}", frames.len(), args.frames);

    let mut detector = DigitDetector::new(labels, config.detection.clone());
    let mut session = ScanSession::new(config.consensus.clone());
    let mut committed = 0usize;

    for (i, preds) in frames.iter().enumerate() {
        let reading = match detector.process_frame(preds.view()) {
            DetectOutcome::Digits { reading, elapsed } => {
                debug!("Frame {}: \"{}\" in {:?}", i, reading.value, elapsed);
                reading
            }
            DetectOutcome::NoDigits { elapsed } => {
                debug!("Frame {}: no digits in {:?}", i, elapsed);
                FrameReading::empty()
            }
            DetectOutcome::Dropped => continue,
        };

        let update = session.observe(&reading);
        debug!(
            "Frame {}: progress {:.0}%, stability {:.2}",
            i,
            update.progress * 100.0,
            update.stability
        );

        if update.state == SessionState::Stable {
            let Some(consensus) = update.consensus else {
                continue;
            };
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "reading": consensus.value,
                "stability": consensus.stability,
                "boxes": consensus.boxes,
            }))?);
            committed += 1;
            if !args.continuous {
                return Ok(());
            }
            detector.reset();
        }
    }

    if committed == 0 {
        warn!("Stream ended without a stable reading");
    }
    Ok(())
}

/// Load the config from an explicit path, the per-user config dir, or defaults.
fn resolve_config(explicit: Option<&std::path::Path>) -> Result<RecognitionConfig> {
    if let Some(path) = explicit {
        return load_config(path).with_context(|| format!("Failed to load config {:?}", path));
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "meterscan") {
        let path = dirs.config_dir().join("config.toml");
        if path.exists() {
            info!("Using config {:?}", path);
            return load_config(&path).with_context(|| format!("Failed to load config {:?}", path));
        }
    }

    Ok(RecognitionConfig::default())
}

/// Parse recorded frames: a JSON array of `[channels][elements]` tensors.
fn load_frames(path: &std::path::Path) -> Result<Vec<Array2<f32>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read frames file {:?}", path))?;
    let raw: Vec<Vec<Vec<f32>>> =
        serde_json::from_str(&content).context("Frames file is not an array of 2D tensors")?;

    let mut frames = Vec::with_capacity(raw.len());
    for (i, rows) in raw.into_iter().enumerate() {
        let channels = rows.len();
        let elements = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != elements) {
            anyhow::bail!("frame {} has ragged rows", i);
        }
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let preds = Array2::from_shape_vec((channels, elements), flat)
            .with_context(|| format!("frame {} is not a valid tensor", i))?;
        frames.push(preds);
    }
    Ok(frames)
}

//! handsignal-replay - drive a gesture session from recorded landmarks.
//!
//! Reads JSON-lines frames (one `RecordedFrame` per line) from a file or
//! stdin and prints every fired action as an event s-expression.  Actions
//! are applied to an in-memory demo store, which supplies the listing and
//! UI mode for the following frames.  A line may carry `"mode"` to force
//! the UI mode from that frame on.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use handsignal::action::Action;
use handsignal::config::EngineConfig;
use handsignal::dynamic::{
    load_dataset, DtwClassifier, DtwOptions, DynamicGestureEngine, SequenceClassifier, FEATURE_LEN,
};
use handsignal::replay::ReplayStore;
use handsignal::session::{GestureSession, UiMode};
use handsignal::tracking::landmarks::RecordedFrame;

/// One input line: a recorded frame plus an optional UI mode override.
#[derive(Debug, Deserialize)]
struct ReplayLine {
    #[serde(flatten)]
    frame: RecordedFrame,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Parser, Debug)]
#[command(name = "handsignal-replay", about = "Replay recorded hand landmarks through the gesture engine")]
struct Cli {
    /// JSON-lines file of recorded frames (default: stdin)
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Dynamic gesture dataset (JSON)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Engine configuration file (s-expression plist)
    #[arg(long)]
    config: Option<PathBuf>,

    /// DTW Sakoe-Chiba window in frames (overrides the config)
    #[arg(long)]
    window: Option<usize>,

    /// Screen size as WIDTHxHEIGHT
    #[arg(long)]
    screen: Option<String>,

    /// Bind a dynamic gesture label to an action: LABEL=ACTION
    #[arg(long = "bind")]
    bindings: Vec<String>,

    /// Initial UI mode: browse, file-open, or renaming
    #[arg(long, default_value = "browse")]
    mode: String,

    /// Print the observed state after every frame
    #[arg(long)]
    status: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handsignal-replay {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handsignal=info".into()),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(window) = cli.window {
        config.dtw.window = Some(window);
    }
    if let Some(screen) = &cli.screen {
        let (w, h) = parse_screen(screen)?;
        config.cursor.screen_width = w;
        config.cursor.screen_height = h;
    }
    config.validate()?;

    if cli.print_config {
        println!("{}", config.config_sexp());
        return Ok(());
    }

    let Some(mode) = UiMode::from_name(&cli.mode) else {
        bail!("unknown mode: {} (use browse, file-open, or renaming)", cli.mode);
    };

    let min_label_score = config.min_label_score;
    let mut session = GestureSession::new(config.clone());

    if let Some(path) = &cli.dataset {
        let dataset = load_dataset(path)?;
        // Templates must be in the live buffer's feature format.
        let options = DtwOptions {
            expected_features: Some(FEATURE_LEN),
            ..config.dtw.clone()
        };
        let classifier = DtwClassifier::from_dataset(dataset, options)
            .with_context(|| format!("loading templates from {}", path.display()))?;
        info!(
            "Loaded {} templates for {} gestures",
            classifier.template_count(),
            classifier.labels().len(),
        );
        let engine = DynamicGestureEngine::new(Box::new(classifier), config.dynamic.clone())
            .with_context(|| format!("dataset {} does not match live frames", path.display()))?;
        session.set_dynamic_engine(Some(engine));
    }
    for binding in &cli.bindings {
        let (label, action) = parse_binding(binding)?;
        session.add_binding(label, action);
    }
    if session.binding_count() > 0 {
        info!("Bindings: {}", session.bindings_sexp());
    }

    let mut store = ReplayStore::demo();
    store.set_mode(mode);
    info!("handsignal-replay v{} ({} mode)", env!("CARGO_PKG_VERSION"), mode.as_str());

    let reader: Box<dyn BufRead> = match &cli.frames {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening frames {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut frames = 0usize;
    let mut fired = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("reading frames")?;
        if line.trim().is_empty() {
            continue;
        }
        let recorded: ReplayLine = match serde_json::from_str(&line) {
            Ok(f) => f,
            Err(e) => {
                warn!("Skipping malformed frame on line {}: {}", lineno + 1, e);
                continue;
            }
        };
        if let Some(name) = &recorded.mode {
            match UiMode::from_name(name) {
                Some(mode) => store.set_mode(mode),
                None => warn!("Ignoring unknown mode on line {}: {}", lineno + 1, name),
            }
        }

        let input = recorded.frame.into_input(min_label_score);
        let output = session.update(&input, store.mode(), &store);
        frames += 1;
        for action in &output.actions {
            println!("{}", action.to_sexp());
            store.apply(action);
        }
        fired += output.actions.len();
        if cli.status {
            println!("{}", output.snapshot.status_sexp());
        }
    }

    info!("Replayed {} frames, {} actions", frames, fired);
    if cli.status {
        println!("{}", store.status_sexp());
    }
    Ok(())
}

fn parse_screen(s: &str) -> Result<(f32, f32)> {
    let Some((w, h)) = s.split_once('x') else {
        bail!("screen must be WIDTHxHEIGHT, got {}", s);
    };
    let w: f32 = w.trim().parse().with_context(|| format!("invalid screen width: {}", w))?;
    let h: f32 = h.trim().parse().with_context(|| format!("invalid screen height: {}", h))?;
    Ok((w, h))
}

fn parse_binding(s: &str) -> Result<(&str, Action)> {
    let Some((label, name)) = s.split_once('=') else {
        bail!("binding must be LABEL=ACTION, got {}", s);
    };
    match Action::from_binding_name(name.trim()) {
        Some(action) => Ok((label.trim(), action)),
        None => bail!("action {} cannot be bound to a dynamic gesture", name),
    }
}

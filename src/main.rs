//! Command-line front end for the gaze calibration pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gaze_calibration::{
    accuracy::AccuracyEstimator,
    app::{AppEvent, AppOutput, CalibrationApp, Command},
    clock::ManualClock,
    config::{Config, EXAMPLE_CONFIG},
    constants::CENTER_POINT_ID,
    filters::chain::FilterChain,
    sample::RawSample,
    source::{GazeEvent, SampleReader},
};
use log::{debug, info, warn};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Filter gaze events (JSON lines) and write the filtered samples to stdout
    Filter {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Score filtered gaze events against the screen centre
    Accuracy {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Run a scripted calibration session over recorded gaze events
    Calibrate {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Print an example configuration file
    ExampleConfig,
}

fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead>> {
    Ok(match input {
        Some(path) => {
            info!("Reading gaze events from: {}", path.display());
            Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
            ))
        }
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn read_samples(input: Option<&Path>) -> Result<Vec<RawSample>> {
    let mut samples = Vec::new();
    for item in SampleReader::new(open_input(input)?) {
        if let Some(sample) = item? {
            samples.push(sample);
        }
    }
    Ok(samples)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Failed to load config file: {e}. Using defaults.");
                    Config::default()
                }
            }
        }
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run_filter(config: &Config, input: Option<&Path>) -> Result<()> {
    let mut chain = FilterChain::from_config(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for item in SampleReader::new(open_input(input)?) {
        let Some(raw) = item? else {
            continue;
        };
        if let Some(filtered) = chain.process(raw) {
            serde_json::to_writer(&mut out, &filtered)?;
            writeln!(out)?;
        }
    }

    let stats = chain.stats();
    info!(
        "Filtered {} samples: {} emitted, {} velocity rejections, {} proximity rejections",
        stats.received, stats.emitted, stats.velocity_rejected, stats.proximity_rejected
    );
    Ok(())
}

fn run_accuracy(config: &Config, input: Option<&Path>) -> Result<()> {
    let raw = read_samples(input)?;
    // The window follows the recording, not the first sample the gates let through
    let start = raw.first().map_or(0.0, |s| s.timestamp);

    let mut chain = FilterChain::from_config(config);
    let filtered: Vec<_> = raw.into_iter().filter_map(|s| chain.process(s)).collect();

    let mut estimator = AccuracyEstimator::from_config(config);
    let result = estimator.run_from(
        start,
        config.accuracy.window_ms,
        config.viewport.center(),
        filtered,
    )?;

    println!("Accuracy | {result}");
    if let Some(stats) = result.statistics {
        let (cx, cy) = stats.centroid();
        println!("Centroid: ({cx:.2}, {cy:.2}), spread: {:.2}", stats.spread());
    }
    Ok(())
}

fn run_calibrate(config: &Config, input: Option<&Path>) -> Result<()> {
    let samples = read_samples(input)?;
    let start = samples.first().map_or(0.0, |s| s.timestamp);
    let end = samples.last().map_or(0.0, |s| s.timestamp);

    let clock = ManualClock::new();
    clock.set_ms(start);
    let mut app = CalibrationApp::with_clock(config, Box::new(clock.clone()))?;

    let mut script = vec![
        AppEvent::Command(Command::Start),
        AppEvent::Command(Command::ConfirmInstructions),
    ];
    let edge_ids = (1..=config.calibration.edge_points).map(|i| format!("Pt{i}"));
    for id in edge_ids.chain(std::iter::once(CENTER_POINT_ID.to_string())) {
        for _ in 0..config.calibration.clicks_per_point {
            script.push(AppEvent::Click(id.clone()));
        }
    }

    let report = |outputs: Vec<AppOutput>| {
        for output in outputs {
            match output {
                AppOutput::AccuracyReported(result) => println!("Your accuracy measure is {result}"),
                AppOutput::Points(views) => {
                    let calibrated = views.iter().filter(|v| v.locked).count();
                    debug!("{calibrated}/{} points locked", views.len());
                }
                other => debug!("{other:?}"),
            }
        }
    };

    for event in script {
        report(app.handle(event)?);
    }

    for sample in samples {
        clock.set_ms(sample.timestamp);
        report(app.handle(AppEvent::Gaze(GazeEvent::new(sample.x, sample.y, sample.timestamp)))?);
    }

    clock.set_ms(end.max(start + config.accuracy.window_ms));
    report(app.handle(AppEvent::Tick)?);

    info!("Calibration finished in phase {:?}", app.phase());
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Mode::Filter { input } => run_filter(&config, input.as_deref()),
        Mode::Accuracy { input } => run_accuracy(&config, input.as_deref()),
        Mode::Calibrate { input } => run_calibrate(&config, input.as_deref()),
        Mode::ExampleConfig => {
            print!("{EXAMPLE_CONFIG}");
            Ok(())
        }
    }
}

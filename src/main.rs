//! chartsight command line
//!
//! Subcommands:
//!   - `predict`: Analyze one chart screenshot
//!   - `multi`:   Fuse 1m, 5m and 30m screenshots into one call
//!   - `extract`: Dump the extracted close/volume series as CSV

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chartsight::backtesting::{BacktestLedger, BacktestResult};
use chartsight::config::AppConfig;
use chartsight::extraction::{extract_close, extract_volume, load_grid};
use chartsight::{Prediction, PriceScale, SignalEngine, Timeframe};

#[derive(Parser)]
#[command(
    name = "chartsight",
    version,
    about = "Directional calls and trade plans from candlestick chart screenshots"
)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single chart
    Predict(PredictArgs),
    /// Analyze three timeframes of the same symbol and fuse them
    Multi(MultiArgs),
    /// Print the extracted series
    Extract(ExtractArgs),
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Market time as HH:MM (defaults to the local clock)
    #[arg(long)]
    time: Option<String>,

    /// Real price at the bottom of the plot area
    #[arg(long, requires = "price_max")]
    price_min: Option<f64>,

    /// Real price at the top of the plot area
    #[arg(long, requires = "price_min")]
    price_max: Option<f64>,

    /// Print the prediction as JSON
    #[arg(long)]
    json: bool,

    /// Append the call to the configured ledger CSV
    #[arg(long)]
    record: bool,

    /// Ledger CSV path (implies --record)
    #[arg(long)]
    ledger: Option<PathBuf>,
}

#[derive(clap::Args)]
struct PredictArgs {
    /// Chart screenshot (PNG/JPEG)
    image: PathBuf,

    /// 1m, 5m or 30m; inferred from the file name when omitted
    #[arg(long, value_parser = parse_timeframe)]
    timeframe: Option<Timeframe>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
struct MultiArgs {
    /// 1-minute chart
    #[arg(long)]
    m1: PathBuf,

    /// 5-minute chart
    #[arg(long)]
    m5: PathBuf,

    /// 30-minute chart
    #[arg(long)]
    m30: PathBuf,

    /// Also print the three single-timeframe legs
    #[arg(long)]
    legs: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Chart screenshot (PNG/JPEG)
    image: PathBuf,
}

fn parse_timeframe(s: &str) -> std::result::Result<Timeframe, String> {
    Timeframe::from_str(s)
        .ok_or_else(|| format!("unknown timeframe '{}', expected 1m, 5m or 30m", s))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = AppConfig::load()?;
    info!(config = %config.digest(), "Configuration loaded");

    match cli.command {
        Commands::Predict(args) => run_predict(&config, args),
        Commands::Multi(args) => run_multi(&config, args),
        Commands::Extract(args) => run_extract(&config, args),
    }
}

fn run_predict(config: &AppConfig, args: PredictArgs) -> Result<()> {
    let engine = SignalEngine::new(config.engine_config());
    let time = market_time(&args.output);
    let scale = price_scale(&args.output)?;

    let prediction = engine.predict_file(&args.image, args.timeframe, &time, scale)?;
    info!(
        image = %args.image.display(),
        label = %prediction.label,
        signal = %prediction.signal,
        confidence = prediction.confidence,
        "Prediction complete"
    );

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        print_summary(&args.image, &time, &prediction);
    }

    let minutes = prediction.timeframe.map(|tf| tf.minutes()).unwrap_or(0);
    record(config, &args.output, &args.image, minutes, &prediction)
}

fn run_multi(config: &AppConfig, args: MultiArgs) -> Result<()> {
    let engine = SignalEngine::new(config.engine_config());
    let time = market_time(&args.output);
    let scale = price_scale(&args.output)?;

    let m1 = load_grid(&args.m1)?;
    let m5 = load_grid(&args.m5)?;
    let m30 = load_grid(&args.m30)?;
    let result = engine.predict_multi_timeframe(&m1, &m5, &m30, &time, scale);
    info!(
        label = %result.fused.label,
        signal = %result.fused.signal,
        confluence = result.fused.confluence,
        "Multi-timeframe prediction complete"
    );

    if args.output.json {
        if args.legs {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&result.fused)?);
        }
    } else {
        if args.legs {
            for (path, leg) in [&args.m1, &args.m5, &args.m30].iter().zip(result.legs.iter()) {
                print_summary(path, &time, leg);
                println!();
            }
        }
        print_summary(&args.m30, &time, &result.fused);
        println!("Confluence: {}/3", result.fused.confluence);
    }

    record(
        config,
        &args.output,
        &args.m30,
        Timeframe::Min30.minutes(),
        &result.fused,
    )
}

fn run_extract(config: &AppConfig, args: ExtractArgs) -> Result<()> {
    let colors = config.engine_config().colors;
    let grid = load_grid(&args.image)?;
    let closes = extract_close(&grid, &colors);
    let volumes = extract_volume(&grid, &colors);

    println!("index,close,volume");
    for (i, (c, v)) in closes.iter().zip(volumes.iter()).enumerate() {
        println!("{},{:.4},{:.4}", i, c, v);
    }
    Ok(())
}

fn market_time(output: &OutputArgs) -> String {
    output
        .time
        .clone()
        .unwrap_or_else(|| Local::now().format("%H:%M").to_string())
}

fn price_scale(output: &OutputArgs) -> Result<Option<PriceScale>> {
    match (output.price_min, output.price_max) {
        (Some(min), Some(max)) => {
            if min.is_nan() || max.is_nan() || min >= max {
                bail!("--price-min ({}) must be below --price-max ({})", min, max);
            }
            Ok(Some(PriceScale::new(min, max)))
        }
        _ => Ok(None),
    }
}

fn record(
    config: &AppConfig,
    output: &OutputArgs,
    image: &Path,
    timeframe_minutes: u32,
    prediction: &Prediction,
) -> Result<()> {
    let path = match (&output.ledger, output.record) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from(&config.ledger.csv_path),
        (None, false) => return Ok(()),
    };

    let mut ledger = BacktestLedger::new();
    ledger.append(BacktestResult::open(
        Utc::now().timestamp_millis(),
        image.display().to_string(),
        timeframe_minutes,
        prediction.clone(),
        prediction.reference_price,
    ));
    ledger
        .append_csv(&path)
        .with_context(|| format!("Failed to record prediction in {}", path.display()))
}

fn print_summary(image: &Path, time: &str, p: &Prediction) {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.display().to_string());
    let timeframe = p
        .timeframe
        .map(|tf| tf.to_string())
        .unwrap_or_else(|| "fused".to_string());

    println!("Loaded: {} ({}) at {}", name, timeframe, time);
    println!("Prediction: {}", p.label);
    println!("Bullish: {:.1}%", p.p_bull * 100.0);
    println!("Bearish: {:.1}%", p.p_bear * 100.0);
    println!("Confidence: {:.1}%", p.confidence);
    println!("Signal: {} ({})", p.signal, p.buy_type);
    if !p.plan.is_empty() {
        println!(
            "Stop: {:.4}  Target 1: {:.4}  Target 2: {:.4}  RR: {:.2}",
            p.plan.stop_loss, p.plan.target1, p.plan.target2, p.plan.risk_reward
        );
    }
    if let Some(s) = p.active_support {
        println!("Support: {:.4}", s);
    }
    if let Some(r) = p.active_resistance {
        println!("Resistance: {:.4}", r);
    }
    if !p.breakdown.patterns.is_empty() {
        let tags: Vec<&str> = p.breakdown.patterns.iter().map(|t| t.as_str()).collect();
        println!("Patterns: {}", tags.join(", "));
    }
}

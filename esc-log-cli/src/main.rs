//! ESC Log Decoder CLI Application
//!
//! Command-line front end for the esc-log-decoder library. It reads a CSV
//! trace (decoded register accesses or a raw SPI capture), prints one line
//! per logical access and takes its settings from flags and/or a TOML file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use esc_log_decoder::{Decoder, DecoderConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;

use config::AppConfig;

/// ESC Log Decoder - Annotate EtherCAT Slave Controller register traces
#[derive(Parser, Debug)]
#[command(name = "esc-log-cli")]
#[command(about = "Decode ESC register-access traces (CSV or SPI captures)", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the CSV trace to decode
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Identical reads folded into one READ_WAIT line
    #[arg(short, long, value_name = "COUNT", allow_negative_numbers = true)]
    threshold: Option<i64>,

    /// Only show registers in this inclusive window (e.g. -r 0x0000 0x0220)
    #[arg(short, long, num_args = 2, value_names = ["LOW", "HIGH"], value_parser = parse_address)]
    range: Option<Vec<u16>>,

    /// Register addresses never shown (e.g. -i 0x0220 0x0221)
    #[arg(short, long = "ignore-addrs", num_args = 1.., value_name = "ADDR", value_parser = parse_address)]
    ignore_addrs: Vec<u16>,

    /// Silence that ends an SPI transaction, in microseconds
    #[arg(long, value_name = "US")]
    frame_gap_us: Option<u64>,

    /// Prefix of every output line
    #[arg(long, value_name = "NAME")]
    subject: Option<String>,

    /// Output file for decoded lines (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Accepts `0x`-prefixed hex or plain decimal
fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid register address '{}': {}", s, e))
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("ESC Log Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", esc_log_decoder::VERSION);

    let app = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let (input, output, decoder_config) = merge_settings(&args, app)?;
    decode(&input, output.as_deref(), decoder_config)
}

/// Apply command-line overrides on top of the file configuration
fn merge_settings(
    args: &Args,
    app: AppConfig,
) -> Result<(PathBuf, Option<PathBuf>, DecoderConfig)> {
    let Some(input) = args.input.clone().or(app.input) else {
        bail!("No input trace given (pass FILE or set `input` in the config file)");
    };
    let output = args.output.clone().or(app.output);

    let mut decoder_config = app.decoder;
    if let Some(threshold) = args.threshold {
        decoder_config = decoder_config.with_poll_threshold(threshold);
    }
    if let Some(range) = &args.range {
        if let [lower, upper] = range.as_slice() {
            decoder_config = decoder_config.with_address_range(*lower, *upper);
        }
    }
    for address in &args.ignore_addrs {
        decoder_config = decoder_config.ignore_address(*address);
    }
    if let Some(gap_us) = args.frame_gap_us {
        let gap_ns = gap_us
            .checked_mul(1_000)
            .with_context(|| format!("Frame gap of {} us is too large", gap_us))?;
        decoder_config = decoder_config.with_frame_gap_ns(gap_ns);
    }
    if let Some(subject) = &args.subject {
        decoder_config = decoder_config.with_subject(subject.clone());
    }

    decoder_config.validate().context("Invalid decoder settings")?;
    log::debug!("Effective configuration: {:?}", decoder_config);

    Ok((input, output, decoder_config))
}

/// Decode the trace and write every line out
fn decode(input: &Path, output: Option<&Path>, config: DecoderConfig) -> Result<()> {
    let decoder = Decoder::new();
    log::debug!("Register catalog: {} entries", decoder.catalog().len());

    let stream = decoder
        .decode_file(input, config)
        .with_context(|| format!("Failed to open trace: {:?}", input))?;

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(sink);

    let mut count = 0usize;
    for line in stream {
        let line = line.with_context(|| format!("Failed to decode trace: {:?}", input))?;
        writeln!(writer, "{}", line)?;
        count += 1;
    }
    writer.flush().context("Failed to flush output")?;

    log::info!("Decoded {} line(s) from {:?}", count, input);
    if let Some(path) = output {
        log::info!("Output written to {:?}", path);
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::{Builder, Target};
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    // Decoded lines own stdout
    Builder::new()
        .filter_level(level)
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

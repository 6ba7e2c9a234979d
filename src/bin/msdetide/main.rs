use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use log::{error, info};
use mseed_detide::Detider;
use mseed_detide::decode::{MAX_RECORD_LENGTH, MIN_RECORD_LENGTH};
use mseed_detide::tide::HarmonicPredictor;

mod cli;

use cli::Cli;

const EXIT_SOURCE_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let (detider, mut sink) = match setup(&cli) {
        Ok(ready) => ready,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let summary = detider.run(&cli.inputs(), &mut sink);
    info!(
        "{} source(s), {} failed: {}",
        summary.sources, summary.failed, summary.totals
    );

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_SOURCE_FAILED)
    }
}

fn setup(cli: &Cli) -> anyhow::Result<(Detider<HarmonicPredictor>, Box<dyn Write>)> {
    let params = cli.params().context("invalid configuration")?;
    let record_length = cli.record_length as usize;
    if !record_length.is_power_of_two()
        || !(MIN_RECORD_LENGTH..=MAX_RECORD_LENGTH).contains(&record_length)
    {
        bail!(
            "record length {record_length} must be a power of two from {MIN_RECORD_LENGTH} to {MAX_RECORD_LENGTH}"
        );
    }

    info!("{} version {}", env!("CARGO_BIN_NAME"), env!("CARGO_PKG_VERSION"));
    info!("{params}");
    for constituent in &params.constituents {
        info!("\t{constituent}");
    }

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let detider = Detider::new(params, HarmonicPredictor)
        .with_record_length(cli.record_length)
        .with_encoding(cli.encoding);
    Ok((detider, sink))
}

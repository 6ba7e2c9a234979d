use std::path::PathBuf;

use clap::Parser;
use mseed_detide::config::{self, DetideParams};
use mseed_detide::{ConfigError, EncodingFormat, Input};

#[derive(Parser)]
#[command(
    name = "msdetide",
    version,
    about = "Remove predicted tides from miniSEED tide gauge records",
    long_about = "Read raw miniSEED tide gauge records, subtract alpha + beta * (predicted tide)\n\
                  from every sample and write the corrected records to stdout.\n\
                  Reads stdin when no files are given; `-` also names stdin."
)]
pub struct Cli {
    /// Add offset to calculated tidal heights
    #[arg(short = 'A', long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub alpha: f64,

    /// Scale calculated tidal heights
    #[arg(short = 'B', long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub beta: f64,

    /// Alternative orientation code for the output channel
    #[arg(short = 'O', long, default_value = "T")]
    pub orient: String,

    /// Keep the input channel code unchanged
    #[arg(long, conflicts_with = "orient")]
    pub no_orient: bool,

    /// Reference latitude in degrees
    #[arg(short = 'L', long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Reference time zone offset in hours
    #[arg(short = 'Z', long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub zone: f64,

    /// Tidal constants, repeatable (e.g. -T M2/0.52/128.3)
    #[arg(short = 'T', long = "tide", value_name = "LABEL/AMP/LAG")]
    pub tides: Vec<String>,

    /// Output record length in bytes
    #[arg(short = 'r', long, default_value_t = 512)]
    pub record_length: u32,

    /// Output encoding (steim1, steim2, int32, int16)
    #[arg(short = 'e', long, default_value = "steim2", value_parser = parse_encoding)]
    pub encoding: EncodingFormat,

    /// Write records to a file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Input miniSEED files
    pub files: Vec<String>,
}

impl Cli {
    /// Build validated correction parameters.
    pub fn params(&self) -> Result<DetideParams, ConfigError> {
        let orientation = if self.no_orient {
            None
        } else {
            Some(config::parse_orientation(&self.orient)?)
        };
        let params = DetideParams::default()
            .with_offset(self.alpha)
            .with_scale(self.beta)
            .with_latitude(self.latitude)
            .with_zone(self.zone)
            .with_orientation(orientation)
            .with_constituents(config::parse_constituents(&self.tides)?);
        params.validate()?;
        Ok(params)
    }

    /// Input sources in command line order; stdin when none are named.
    pub fn inputs(&self) -> Vec<Input> {
        if self.files.is_empty() {
            vec![Input::Stdin]
        } else {
            self.files.iter().map(|f| Input::from_arg(f)).collect()
        }
    }
}

fn parse_encoding(s: &str) -> Result<EncodingFormat, String> {
    let encoding: EncodingFormat = s.parse().map_err(|e| format!("{e}"))?;
    if !encoding.is_integer() {
        return Err(format!("{encoding} cannot hold corrected integer samples"));
    }
    Ok(encoding)
}

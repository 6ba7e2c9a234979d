//! The detide pipeline: decode, correct, repack.
//!
//! [`transform`] applies the tide correction to one record. [`Detider`]
//! drives it over whole input sources, writing each corrected record to the
//! sink as soon as it has been packed.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::config::DetideParams;
use crate::error::{DetideError, MseedError};
use crate::group::{self, Packed};
use crate::reader::MseedStream;
use crate::record::{MseedRecord, Samples};
use crate::tide::TidePredictor;
use crate::types::{EncodingFormat, SampleType};

pub const DEFAULT_RECORD_LENGTH: u32 = 512;
pub const DEFAULT_ENCODING: EncodingFormat = EncodingFormat::Steim2;

/// Why a record was left out of the output. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Skip {
    #[error("record has no samples")]
    NoSamples,

    #[error("samples are {0}, not 32-bit integers")]
    NotInteger(SampleType),

    #[error("sample rate is zero")]
    ZeroRate,
}

/// Subtract the predicted tide from every sample of `record`.
///
/// Sample `n` is taken at `start + n / rate` and becomes
/// `rint(x - (offset + scale * height))`, rounding half to even and
/// saturating at the `i32` range. When the parameters carry an orientation
/// it replaces the third character of the channel code.
///
/// ```
/// use mseed_detide::{DetideParams, MseedRecord, Samples, detide::transform};
/// use mseed_detide::tide::Constituent;
///
/// let record = MseedRecord::new()
///     .with_nslc("NZ", "GISB", "41", "BTZ")
///     .with_samples(Samples::Int(vec![100, 100, 100]));
/// let params = DetideParams::default().with_offset(1.0).with_scale(2.0);
/// let constant = |_: &[Constituent], _: f64, _: f64, _: f64| 5.0;
///
/// let out = transform(record, &params, &constant).unwrap();
/// assert_eq!(out.channel, "BTT");
/// assert_eq!(out.samples, Samples::Int(vec![89, 89, 89]));
/// ```
pub fn transform<P>(
    mut record: MseedRecord,
    params: &DetideParams,
    predictor: &P,
) -> Result<MseedRecord, Skip>
where
    P: TidePredictor + ?Sized,
{
    if record.samples.is_empty() {
        return Err(Skip::NoSamples);
    }
    if record.samples.as_int().is_none() {
        return Err(Skip::NotInteger(record.sample_type()));
    }
    if record.sample_rate == 0.0 {
        return Err(Skip::ZeroRate);
    }

    if let Some(orientation) = params.orientation {
        record.set_orientation(orientation);
    }

    let start = record.start_time.to_epoch_seconds();
    let rate = record.sample_rate;
    if let Samples::Int(samples) = &mut record.samples {
        for (n, sample) in samples.iter_mut().enumerate() {
            let epoch = start + n as f64 / rate;
            let height =
                predictor.height(&params.constituents, epoch, params.latitude, params.zone);
            let corrected = *sample as f64 - (params.offset + params.scale * height);
            *sample = corrected.round_ties_even() as i32;
        }
    }

    Ok(record)
}

/// Record counts for one source, or summed over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub records_in: usize,
    pub skipped: usize,
    pub records_out: usize,
    pub samples_out: usize,
}

impl SourceStats {
    fn merge(&mut self, other: &SourceStats) {
        self.records_in += other.records_in;
        self.skipped += other.skipped;
        self.records_out += other.records_out;
        self.samples_out += other.samples_out;
    }
}

impl fmt::Display for SourceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records read, {} skipped, {} records ({} samples) written",
            self.records_in, self.skipped, self.records_out, self.samples_out
        )
    }
}

/// Outcome of [`Detider::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: usize,
    pub failed: usize,
    pub totals: SourceStats,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// An input source: a file path or standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// `-` names standard input; anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Input::Stdin
        } else {
            Input::File(PathBuf::from(arg))
        }
    }

    pub fn open(&self) -> io::Result<Box<dyn Read>> {
        match self {
            Input::Stdin => Ok(Box::new(io::stdin().lock())),
            Input::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Stdin => f.write_str("<stdin>"),
            Input::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Applies one set of parameters to a sequence of input sources.
pub struct Detider<P> {
    params: DetideParams,
    predictor: P,
    record_length: u32,
    encoding: EncodingFormat,
}

impl<P: TidePredictor> Detider<P> {
    pub fn new(params: DetideParams, predictor: P) -> Self {
        Self {
            params,
            predictor,
            record_length: DEFAULT_RECORD_LENGTH,
            encoding: DEFAULT_ENCODING,
        }
    }

    /// Output record length in bytes.
    pub fn with_record_length(mut self, record_length: u32) -> Self {
        self.record_length = record_length;
        self
    }

    /// Output sample encoding.
    pub fn with_encoding(mut self, encoding: EncodingFormat) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn params(&self) -> &DetideParams {
        &self.params
    }

    /// Correct and pack one record; `None` if the record was skipped.
    pub fn process_record(&self, record: MseedRecord) -> Result<Option<Packed>, DetideError> {
        let nslc = record.nslc();
        match transform(record, &self.params, &self.predictor) {
            Ok(corrected) => group::pack_one(corrected, self.record_length, self.encoding)
                .map(Some)
                .map_err(DetideError::Encode),
            Err(skip) => {
                debug!("Skipping record {nslc}: {skip}");
                Ok(None)
            }
        }
    }

    /// Run every record of `reader` through the pipeline into `sink`.
    ///
    /// Output for each record is written before the next is read, so on
    /// error the sink already holds everything produced before it.
    pub fn process_source<R: Read, W: Write + ?Sized>(
        &self,
        reader: R,
        sink: &mut W,
    ) -> Result<SourceStats, DetideError> {
        let mut stats = SourceStats::default();

        for result in MseedStream::new(reader) {
            let record = result.map_err(|e| match e {
                MseedError::Io(err) => DetideError::Io(err),
                other => DetideError::Decode(other),
            })?;
            stats.records_in += 1;
            trace!("{record:#}");

            match self.process_record(record)? {
                Some(packed) => {
                    for bytes in &packed.records {
                        sink.write_all(bytes)?;
                    }
                    stats.records_out += packed.records.len();
                    stats.samples_out += packed.samples;
                }
                None => stats.skipped += 1,
            }
        }

        Ok(stats)
    }

    /// Process each input in order.
    ///
    /// A source that fails is logged and abandoned; the run continues with
    /// the next one. The sink is flushed after every source.
    pub fn run<W: Write + ?Sized>(&self, inputs: &[Input], sink: &mut W) -> RunSummary {
        let mut summary = RunSummary::default();

        for input in inputs {
            summary.sources += 1;
            info!("Processing {input}");

            let result = input
                .open()
                .map_err(DetideError::from)
                .and_then(|reader| self.process_source(reader, sink))
                .and_then(|stats| {
                    sink.flush()?;
                    Ok(stats)
                });

            match result {
                Ok(stats) => {
                    info!("{input}: {stats}");
                    summary.totals.merge(&stats);
                }
                Err(e) => {
                    warn!("{input}: {e}, abandoning source");
                    // Keep whatever reached the sink before the failure
                    if let Err(flush) = sink.flush() {
                        warn!("flushing output failed: {flush}");
                    }
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

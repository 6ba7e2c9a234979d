//! Remove predicted tides from miniSEED v2 sea-level gauge records.
//!
//! Raw gauge counts arrive as miniSEED v2 records. Each record is decoded,
//! the predicted tide height at every sample time is scaled, offset and
//! subtracted, and the corrected samples are repacked into fixed-length
//! Steim-compressed records carrying the original metadata.
//!
//! The crate bundles what the pipeline needs: a pure Rust miniSEED v2
//! codec (Steim-1/2, INT16/32, FLOAT32/64), a harmonic tide predictor, and
//! the [`Detider`] driver used by the `msdetide` binary.
//!
//! # Correcting a record
//!
//! ```
//! use mseed_detide::{decode, detide, encode, DetideParams, MseedRecord, Samples};
//! use mseed_detide::tide::{Constituent, HarmonicPredictor};
//!
//! let raw = MseedRecord::new()
//!     .with_nslc("NZ", "GISB", "41", "BTZ")
//!     .with_sample_rate(1.0)
//!     .with_samples(Samples::Int(vec![1200, 1210, 1220]));
//!
//! let params = DetideParams::default()
//!     .with_scale(0.0)
//!     .with_constituents(vec![Constituent::new("M2", 0.8, 120.0)]);
//!
//! let corrected = detide::transform(raw, &params, &HarmonicPredictor).unwrap();
//! assert_eq!(corrected.channel, "BTT");
//!
//! let bytes = encode(&corrected).unwrap();
//! assert_eq!(decode(&bytes).unwrap().samples, corrected.samples);
//! ```
//!
//! # Processing a stream
//!
//! ```
//! use std::io::Cursor;
//! use mseed_detide::{encode, Detider, DetideParams, MseedReader, MseedRecord, Samples};
//! use mseed_detide::tide::HarmonicPredictor;
//!
//! let input = encode(
//!     &MseedRecord::new()
//!         .with_nslc("NZ", "GISB", "41", "BTZ")
//!         .with_samples(Samples::Int(vec![5; 100])),
//! )
//! .unwrap();
//!
//! let detider = Detider::new(DetideParams::default(), HarmonicPredictor);
//! let mut output = Vec::new();
//! let stats = detider.process_source(Cursor::new(input), &mut output).unwrap();
//! assert_eq!(stats.samples_out, 100);
//!
//! let records: Vec<_> = MseedReader::new(&output)
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! assert_eq!(records[0].channel, "BTT");
//! ```

pub mod config;
pub mod decode;
pub mod detide;
pub mod encode;
pub mod error;
pub mod group;
pub mod reader;
pub mod record;
pub mod steim;
pub mod tide;
pub mod time;
pub mod types;

pub use config::DetideParams;
pub use detide::{Detider, Input, RunSummary, Skip, SourceStats};
pub use error::{ConfigError, DetideError, MseedError, Result};
pub use group::{Packed, TraceGroup};
pub use reader::{MseedReader, MseedStream};
pub use record::{MseedRecord, Samples};
pub use time::{BTime, NanoTime};
pub use types::{ByteOrder, EncodingFormat, SampleType};

pub use decode::decode;
pub use encode::{encode, pack};

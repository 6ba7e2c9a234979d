//! Trace groups: contiguous runs of same-channel samples, packed into
//! fixed-length output records.

use log::info;

use crate::encode;
use crate::record::MseedRecord;
use crate::types::{ByteOrder, EncodingFormat};
use crate::{MseedError, Result};

/// Relative sample rate difference still treated as the same rate.
const RATE_TOLERANCE: f64 = 1e-4;

/// One contiguous series of samples for a single channel.
///
/// The trace keeps the metadata of the first record added to it; samples of
/// later contiguous records are appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    record: MseedRecord,
}

impl Trace {
    pub fn nslc(&self) -> String {
        self.record.nslc()
    }

    pub fn record(&self) -> &MseedRecord {
        &self.record
    }

    pub fn sample_count(&self) -> usize {
        self.record.samples.len()
    }

    /// Whether `next` continues this trace without a gap or overlap.
    ///
    /// Contiguous means same channel, same rate, both integer series, and
    /// a start within half a sample period of the next expected sample.
    fn continues_with(&self, next: &MseedRecord) -> bool {
        let rate = self.record.sample_rate;
        if rate <= 0.0
            || self.record.nslc() != next.nslc()
            || (rate - next.sample_rate).abs() > RATE_TOLERANCE * rate
            || self.record.samples.as_int().is_none()
            || next.samples.as_int().is_none()
        {
            return false;
        }
        let expected = self
            .record
            .start_time
            .offset_by_samples(self.sample_count(), rate)
            .to_epoch_nanos();
        let half_period = (0.5e9 / rate) as i64;
        (next.start_time.to_epoch_nanos() - expected).abs() <= half_period
    }

    /// `NET.STA.LOC.CHA  start  end  rate  samples`
    fn list_line(&self) -> String {
        format!(
            "{:<16} {}  {}  {} Hz  {} samples",
            self.nslc(),
            self.record.start_time,
            self.record.end_time(),
            self.record.sample_rate,
            self.sample_count()
        )
    }
}

/// Result of packing: the encoded records, in order, and the sample count
/// they carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packed {
    pub records: Vec<Vec<u8>>,
    pub samples: usize,
}

impl Packed {
    pub fn bytes(&self) -> usize {
        self.records.iter().map(Vec::len).sum()
    }
}

/// An ordered collection of traces.
#[derive(Debug, Default)]
pub struct TraceGroup {
    traces: Vec<Trace>,
}

impl TraceGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, appending it to a trace it continues or starting a
    /// new trace otherwise.
    pub fn add(&mut self, record: MseedRecord) {
        if let Some(trace) = self.traces.iter_mut().find(|t| t.continues_with(&record)) {
            if let (Some(samples), Some(more)) =
                (trace.record.samples.as_int_mut(), record.samples.as_int())
            {
                samples.extend_from_slice(more);
                return;
            }
        }
        self.traces.push(Trace { record });
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Encode every trace into `record_length` byte records.
    ///
    /// Output is big-endian. A trace without samples, or a group without
    /// traces, is an encode error.
    pub fn pack(&self, record_length: u32, encoding: EncodingFormat) -> Result<Packed> {
        if self.traces.is_empty() {
            return Err(MseedError::EncodeError("trace group is empty".into()));
        }

        let mut packed = Packed::default();
        for trace in &self.traces {
            info!("{}", trace.list_line());
            if trace.sample_count() == 0 {
                return Err(MseedError::EncodeError(format!(
                    "trace {} has no samples",
                    trace.nslc()
                )));
            }

            let mut template = trace.record.clone();
            template.record_length = record_length;
            template.encoding = encoding;
            template.byte_order = ByteOrder::Big;

            let records = encode::pack(&template)?;
            packed.samples += trace.sample_count();
            packed.records.extend(records);
        }
        info!(
            "Packed {} trace(s) of {} samples into {} records",
            self.traces.len(),
            packed.samples,
            packed.records.len()
        );
        Ok(packed)
    }
}

/// Pack a single record through a fresh trace group.
pub fn pack_one(
    record: MseedRecord,
    record_length: u32,
    encoding: EncodingFormat,
) -> Result<Packed> {
    let mut group = TraceGroup::new();
    group.add(record);
    group.pack(record_length, encoding)
}

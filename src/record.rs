//! The decoded miniSEED v2 record and its typed sample buffer.

use std::fmt;

use crate::time::NanoTime;
use crate::types::{ByteOrder, EncodingFormat, SampleType};

/// A decoded miniSEED v2 record.
///
/// Only `channel` and `samples` are touched by the detide transform; every
/// other field is carried through to the output records unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct MseedRecord {
    pub sequence_number: String,
    pub quality: char,
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,

    /// Start time of the first sample, after any header time correction.
    pub start_time: NanoTime,
    pub sample_rate: f64,
    pub encoding: EncodingFormat,
    pub byte_order: ByteOrder,
    /// Record length in bytes, a power of two.
    pub record_length: u32,
    pub samples: Samples,
}

impl MseedRecord {
    /// Create a new `MseedRecord` with sensible defaults.
    ///
    /// Defaults: sequence "000001", quality 'D', empty NSLC,
    /// big-endian, 512-byte records, Steim2, no samples.
    pub fn new() -> Self {
        Self {
            sequence_number: "000001".into(),
            quality: 'D',
            network: String::new(),
            station: String::new(),
            location: String::new(),
            channel: String::new(),
            start_time: NanoTime::epoch(),
            sample_rate: 1.0,
            encoding: EncodingFormat::Steim2,
            byte_order: ByteOrder::Big,
            record_length: 512,
            samples: Samples::Int(vec![]),
        }
    }

    /// Set network, station, location, and channel codes.
    pub fn with_nslc(
        mut self,
        network: &str,
        station: &str,
        location: &str,
        channel: &str,
    ) -> Self {
        self.network = network.into();
        self.station = station.into();
        self.location = location.into();
        self.channel = channel.into();
        self
    }

    pub fn with_start_time(mut self, time: NanoTime) -> Self {
        self.start_time = time;
        self
    }

    /// Set the sample rate in Hz.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_encoding(mut self, enc: EncodingFormat) -> Self {
        self.encoding = enc;
        self
    }

    pub fn with_samples(mut self, samples: Samples) -> Self {
        self.samples = samples;
        self
    }

    /// Set the record length (a power of 2).
    pub fn with_record_length(mut self, len: u32) -> Self {
        self.record_length = len;
        self
    }

    /// Return the NSLC identifier: `"NET.STA.LOC.CHA"`.
    pub fn nslc(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    /// Time of the last sample, or the start time for an empty record.
    pub fn end_time(&self) -> NanoTime {
        match self.samples.len() {
            0 => self.start_time,
            n => self.start_time.offset_by_samples(n - 1, self.sample_rate),
        }
    }

    /// Overwrite the orientation (third) character of the channel code.
    ///
    /// Channel codes shorter than three characters are space padded first.
    pub fn set_orientation(&mut self, orientation: char) {
        let mut chars: Vec<char> = self.channel.chars().collect();
        while chars.len() < 3 {
            chars.push(' ');
        }
        chars[2] = orientation;
        self.channel = chars.into_iter().collect();
    }
}

impl Default for MseedRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MseedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {} samples, {} Hz, {}",
            self.nslc(),
            self.sequence_number,
            self.quality,
            self.samples.len(),
            self.sample_rate,
            self.start_time,
        )?;
        if f.alternate() {
            write!(
                f,
                "\n  record length: {} bytes\n  encoding: {} ({:?} endian)\n  sample type: {}",
                self.record_length,
                self.encoding,
                self.byte_order,
                self.samples.sample_type(),
            )?;
        }
        Ok(())
    }
}

/// Decoded sample data.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Raw bytes of a text record.
    Text(Vec<u8>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Text(v) => v.len(),
            Samples::Int(v) => v.len(),
            Samples::Float(v) => v.len(),
            Samples::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::Text(_) => SampleType::Text,
            Samples::Int(_) => SampleType::Int32,
            Samples::Float(_) => SampleType::Float32,
            Samples::Double(_) => SampleType::Float64,
        }
    }

    /// The integer samples, if this buffer holds 32-bit integers.
    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            Samples::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_mut(&mut self) -> Option<&mut Vec<i32>> {
        match self {
            Samples::Int(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_orientation() {
        let mut record = MseedRecord::new().with_nslc("NZ", "GISB", "41", "BTZ");
        record.set_orientation('T');
        assert_eq!(record.channel, "BTT");

        let mut short = MseedRecord::new().with_nslc("NZ", "GISB", "41", "B");
        short.set_orientation('T');
        assert_eq!(short.channel, "B T");
    }

    #[test]
    fn test_end_time() {
        let record = MseedRecord::new()
            .with_start_time(NanoTime::from_epoch_seconds(100.0))
            .with_sample_rate(0.1)
            .with_samples(Samples::Int(vec![1, 2, 3]));
        assert_eq!(record.end_time().to_epoch_seconds(), 120.0);
        assert_eq!(MseedRecord::new().end_time(), NanoTime::epoch());
    }

    #[test]
    fn test_sample_type() {
        assert_eq!(Samples::Int(vec![1]).sample_type(), SampleType::Int32);
        assert_eq!(Samples::Float(vec![]).sample_type(), SampleType::Float32);
        assert_eq!(Samples::Double(vec![1.0]).sample_type(), SampleType::Float64);
        assert!(Samples::Double(vec![1.0]).as_int().is_none());
        assert_eq!(Samples::Text(b"log".to_vec()).sample_type(), SampleType::Text);
        assert!(Samples::Text(vec![]).as_int().is_none());
    }
}

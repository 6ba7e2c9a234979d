//! Encode an [`MseedRecord`] into miniSEED v2 record bytes.
//!
//! [`encode()`] serializes a record into exactly one record of the
//! configured length. [`pack()`] splits a sample buffer of any size across
//! as many fixed-length records as needed, advancing the start time and
//! sequence number of each and linking Steim differences between them.

use crate::decode::{FIXED_HEADER_SIZE, MAX_RECORD_LENGTH, MIN_RECORD_LENGTH};
use crate::record::{MseedRecord, Samples};
use crate::steim::{self, FRAME_SIZE, Steim};
use crate::time::NanoTime;
use crate::types::{ByteOrder, EncodingFormat};
use crate::{MseedError, Result};

const BLOCKETTE_1000_SIZE: usize = 8;
const BLOCKETTE_100_SIZE: usize = 12;
const MAX_SEQUENCE: u32 = 999_999;

/// Encode a [`MseedRecord`] into a single miniSEED v2 record.
///
/// Fails if the samples do not fit in one record of `record_length` bytes;
/// use [`pack()`] for longer buffers.
pub fn encode(record: &MseedRecord) -> Result<Vec<u8>> {
    let mut records = pack(record)?;
    match records.len() {
        1 => Ok(records.remove(0)),
        n => Err(MseedError::EncodeError(format!(
            "{} samples need {n} records of {} bytes",
            record.samples.len(),
            record.record_length
        ))),
    }
}

/// Encode a record's samples into one or more fixed-length records.
///
/// Each output record carries the metadata of `record`, a start time
/// advanced by the number of samples already packed, and the next
/// sequence number. An empty sample buffer yields one header-only record.
pub fn pack(record: &MseedRecord) -> Result<Vec<Vec<u8>>> {
    let layout = Layout::new(record)?;
    let total = record.samples.len();
    let mut sequence = record.sequence_number.trim().parse::<u32>().unwrap_or(1);

    let mut records = Vec::new();
    let mut packed = 0;
    let mut previous: Option<i32> = None;

    loop {
        let (payload, count) = encode_payload(record, packed, previous, &layout)?;
        if count == 0 && packed < total {
            return Err(MseedError::EncodeError(format!(
                "no samples fit in a {} byte record",
                layout.record_length
            )));
        }

        let mut buf = vec![0u8; layout.record_length];
        let start = record.start_time.offset_by_samples(packed, record.sample_rate);
        write_header(&mut buf, record, &layout, start, count, sequence);
        buf[layout.data_offset..layout.data_offset + payload.len()].copy_from_slice(&payload);
        records.push(buf);

        if let Some(ints) = record.samples.as_int() {
            if count > 0 {
                previous = Some(ints[packed + count - 1]);
            }
        }
        packed += count;
        if packed >= total {
            break;
        }
        sequence = if sequence >= MAX_SEQUENCE { 1 } else { sequence + 1 };
    }

    Ok(records)
}

/// Byte positions shared by every record packed from one template.
#[derive(Debug)]
struct Layout {
    record_length: usize,
    record_length_power: u8,
    data_offset: usize,
    rate_factor: i16,
    rate_multiplier: i16,
    /// Exact rate for Blockette 100 when factor/multiplier is approximate.
    actual_rate: Option<f32>,
}

impl Layout {
    fn new(record: &MseedRecord) -> Result<Self> {
        let record_length = record.record_length as usize;
        if !record_length.is_power_of_two()
            || !(MIN_RECORD_LENGTH..=MAX_RECORD_LENGTH).contains(&record_length)
        {
            return Err(MseedError::InvalidRecordLength(record_length));
        }

        let (rate_factor, rate_multiplier, actual_rate) = encode_sample_rate(record.sample_rate)?;

        let mut blockettes_end = FIXED_HEADER_SIZE + BLOCKETTE_1000_SIZE;
        if actual_rate.is_some() {
            blockettes_end += BLOCKETTE_100_SIZE;
        }
        // Steim frames start on a 64-byte boundary
        let data_offset = if record.encoding.is_steim() {
            blockettes_end.next_multiple_of(FRAME_SIZE)
        } else {
            blockettes_end
        };

        Ok(Self {
            record_length,
            record_length_power: record_length.trailing_zeros() as u8,
            data_offset,
            rate_factor,
            rate_multiplier,
            actual_rate,
        })
    }

    fn capacity(&self) -> usize {
        self.record_length - self.data_offset
    }
}

fn write_header(
    buf: &mut [u8],
    record: &MseedRecord,
    layout: &Layout,
    start: NanoTime,
    num_samples: usize,
    sequence: u32,
) {
    // --- Fixed header (48 bytes) ---
    buf[0..6].copy_from_slice(format!("{sequence:06}").as_bytes());
    buf[6] = record.quality as u8;
    buf[7] = b' ';
    write_padded(&mut buf[8..13], &record.station);
    write_padded(&mut buf[13..15], &record.location);
    write_padded(&mut buf[15..18], &record.channel);
    write_padded(&mut buf[18..20], &record.network);

    let bt = start.to_btime();
    buf[20..22].copy_from_slice(&bt.year.to_be_bytes());
    buf[22..24].copy_from_slice(&bt.day.to_be_bytes());
    buf[24] = bt.hour;
    buf[25] = bt.minute;
    buf[26] = bt.second;
    buf[28..30].copy_from_slice(&bt.fract.to_be_bytes());

    buf[30..32].copy_from_slice(&(num_samples as u16).to_be_bytes());
    buf[32..34].copy_from_slice(&layout.rate_factor.to_be_bytes());
    buf[34..36].copy_from_slice(&layout.rate_multiplier.to_be_bytes());
    // Activity, I/O and data quality flags (36-38) stay zero
    buf[39] = if layout.actual_rate.is_some() { 2 } else { 1 };
    // Time correction (40-43) is zero: start times are already corrected
    buf[44..46].copy_from_slice(&(layout.data_offset as u16).to_be_bytes());
    buf[46..48].copy_from_slice(&(FIXED_HEADER_SIZE as u16).to_be_bytes());

    // --- Blockette 1000 ---
    let b1000 = FIXED_HEADER_SIZE;
    let next = match layout.actual_rate {
        Some(_) => (b1000 + BLOCKETTE_1000_SIZE) as u16,
        None => 0,
    };
    buf[b1000..b1000 + 2].copy_from_slice(&1000u16.to_be_bytes());
    buf[b1000 + 2..b1000 + 4].copy_from_slice(&next.to_be_bytes());
    buf[b1000 + 4] = record.encoding.to_code();
    buf[b1000 + 5] = match record.byte_order {
        ByteOrder::Big => 1,
        ByteOrder::Little => 0,
    };
    buf[b1000 + 6] = layout.record_length_power;

    // --- Blockette 100 ---
    if let Some(rate) = layout.actual_rate {
        let b100 = next as usize;
        buf[b100..b100 + 2].copy_from_slice(&100u16.to_be_bytes());
        buf[b100 + 4..b100 + 8].copy_from_slice(&rate.to_bits().to_be_bytes());
    }
}

fn write_padded(dest: &mut [u8], src: &str) {
    let bytes = src.as_bytes();
    for (i, slot) in dest.iter_mut().enumerate() {
        *slot = if i < bytes.len() { bytes[i] } else { b' ' };
    }
}

/// Express a sample rate as a SEED factor/multiplier pair.
///
/// Integer rates and integer periods are exact. Other rates try a
/// rational `factor / divisor`; failing that, the nearest integer rate or
/// period is written and the exact rate goes into Blockette 100.
fn encode_sample_rate(rate: f64) -> Result<(i16, i16, Option<f32>)> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(MseedError::EncodeError(format!(
            "sample rate must be positive, got {rate}"
        )));
    }
    let max = i16::MAX as f64;
    let is_whole = |v: f64| (v - v.round()).abs() <= 1e-9 * v.max(1.0);

    if rate >= 1.0 && rate <= max && is_whole(rate) {
        return Ok((rate.round() as i16, 1, None));
    }
    let period = 1.0 / rate;
    if rate < 1.0 && period <= max && is_whole(period) {
        return Ok((-(period.round() as i16), 1, None));
    }
    for divisor in 2..=1000u16 {
        let factor = rate * divisor as f64;
        if factor > max {
            break;
        }
        if factor >= 1.0 && is_whole(factor) {
            return Ok((factor.round() as i16, -(divisor as i16), None));
        }
    }

    let approx = if rate >= 1.0 {
        (rate.round().min(max) as i16, 1)
    } else {
        (-(period.round().clamp(1.0, max) as i16), 1)
    };
    Ok((approx.0, approx.1, Some(rate as f32)))
}

/// Encode the samples starting at `from` that fit in one record.
/// Returns the payload bytes and the number of samples consumed.
fn encode_payload(
    record: &MseedRecord,
    from: usize,
    previous: Option<i32>,
    layout: &Layout,
) -> Result<(Vec<u8>, usize)> {
    let remaining = record.samples.len() - from;
    if remaining == 0 {
        return Ok((Vec::new(), 0));
    }
    let limit = remaining.min(u16::MAX as usize);
    let order = record.byte_order;

    if record.encoding.is_steim() {
        let steim = match record.encoding {
            EncodingFormat::Steim1 => Steim::One,
            _ => Steim::Two,
        };
        let ints = int_samples(&record.samples, record.encoding)?;
        let frames = layout.capacity() / FRAME_SIZE;
        return steim::pack_frames(&ints[from..from + limit], previous, frames, order, steim);
    }

    let width = record.encoding.sample_width().unwrap_or(4);
    let count = limit.min(layout.capacity() / width);
    let range = from..from + count;
    let mut data = Vec::with_capacity(count * width);

    match (record.encoding, &record.samples) {
        (EncodingFormat::Text, Samples::Text(v)) => data.extend_from_slice(&v[range]),
        (EncodingFormat::Int16, Samples::Int(v)) => {
            for &val in &v[range] {
                let s = i16::try_from(val).map_err(|_| {
                    MseedError::EncodeError(format!("sample {val} does not fit in INT16"))
                })?;
                match order {
                    ByteOrder::Big => data.extend_from_slice(&s.to_be_bytes()),
                    ByteOrder::Little => data.extend_from_slice(&s.to_le_bytes()),
                }
            }
        }
        (EncodingFormat::Int32, Samples::Int(v)) => {
            for &val in &v[range] {
                order.put_u32(&mut data, val as u32);
            }
        }
        (EncodingFormat::Float32, Samples::Float(v)) => {
            for &val in &v[range] {
                order.put_u32(&mut data, val.to_bits());
            }
        }
        (EncodingFormat::Float64, Samples::Double(v)) => {
            for &val in &v[range] {
                match order {
                    ByteOrder::Big => data.extend_from_slice(&val.to_be_bytes()),
                    ByteOrder::Little => data.extend_from_slice(&val.to_le_bytes()),
                }
            }
        }
        (encoding, samples) => {
            return Err(MseedError::EncodeError(format!(
                "{encoding} encoding cannot store {} samples",
                samples.sample_type()
            )));
        }
    }

    Ok((data, count))
}

fn int_samples(samples: &Samples, encoding: EncodingFormat) -> Result<&[i32]> {
    samples.as_int().ok_or_else(|| {
        MseedError::EncodeError(format!("{encoding} encoding requires integer samples"))
    })
}

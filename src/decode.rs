//! Decode miniSEED v2 records from raw bytes.
//!
//! The main entry point is [`decode()`], which parses one fixed-length
//! record into an [`MseedRecord`]. For multi-record data, see
//! [`MseedReader`](crate::MseedReader) and [`MseedStream`](crate::MseedStream).

use crate::record::{MseedRecord, Samples};
use crate::steim::{self, Steim};
use crate::time::{BTime, NanoTime};
use crate::types::{ByteOrder, EncodingFormat};
use crate::{MseedError, Result};

/// Size of the v2 fixed header.
pub const FIXED_HEADER_SIZE: usize = 48;
/// Smallest record length accepted (2^7).
pub const MIN_RECORD_LENGTH: usize = 128;
/// Largest record length accepted (2^17).
pub const MAX_RECORD_LENGTH: usize = 1 << 17;

// Activity flag bit: the header time correction is already applied.
const TIME_CORRECTION_APPLIED: u8 = 0x02;
const MAX_BLOCKETTES: usize = 32;

/// Fields of Blockette 1000 (data only SEED).
#[derive(Debug, Clone, Copy)]
struct Blockette1000 {
    encoding: u8,
    byte_order: ByteOrder,
    record_length: usize,
}

/// Blockettes the decoder understands, found by walking the chain.
#[derive(Debug, Default)]
struct Blockettes {
    b1000: Option<Blockette1000>,
    /// Actual sample rate from Blockette 100, if present.
    b100_rate: Option<f32>,
    /// Microsecond start time offset from Blockette 1001.
    b1001_usec: Option<i8>,
}

/// Decode a single miniSEED v2 record from raw bytes.
///
/// `data` must hold at least the full record; trailing bytes are ignored.
pub fn decode(data: &[u8]) -> Result<MseedRecord> {
    if data.len() < FIXED_HEADER_SIZE {
        return Err(MseedError::RecordTooShort {
            expected: FIXED_HEADER_SIZE,
            actual: data.len(),
        });
    }
    validate_fixed_header(data)?;

    let order = header_byte_order(data);
    let blockettes = walk_blockettes(data, order)?;
    let b1000 = blockettes.b1000.ok_or(MseedError::MissingBlockette1000)?;
    let record_length = b1000.record_length;
    if data.len() < record_length {
        return Err(MseedError::RecordTooShort {
            expected: record_length,
            actual: data.len(),
        });
    }

    let sequence_number = header_str(&data[0..6])?.to_string();
    let quality = data[6] as char;
    let station = header_str(&data[8..13])?.trim().to_string();
    let location = header_str(&data[13..15])?.trim().to_string();
    let channel = header_str(&data[15..18])?.trim().to_string();
    let network = header_str(&data[18..20])?.trim().to_string();

    let mut start_time = NanoTime::from_btime(&read_btime(data, order));
    if let Some(usec) = blockettes.b1001_usec {
        start_time = start_time.add_nanos(usec as i64 * 1_000);
    }
    let activity_flags = data[36];
    let time_correction = order.u32_at(data, 40) as i32;
    if time_correction != 0 && activity_flags & TIME_CORRECTION_APPLIED == 0 {
        start_time = start_time.add_nanos(time_correction as i64 * 100_000);
    }

    let num_samples = order.u16_at(data, 30) as usize;
    let sample_rate = match blockettes.b100_rate {
        Some(rate) => rate as f64,
        None => compute_sample_rate(order.i16_at(data, 32), order.i16_at(data, 34)),
    };

    let encoding = EncodingFormat::from_code(b1000.encoding)?;
    let data_offset = order.u16_at(data, 44) as usize;
    if num_samples > 0 && (data_offset < FIXED_HEADER_SIZE || data_offset >= record_length) {
        return Err(MseedError::InvalidHeader(format!(
            "data offset {data_offset} outside record of {record_length} bytes"
        )));
    }

    let samples = if num_samples == 0 {
        empty_samples(encoding)
    } else {
        decode_data(
            &data[data_offset..record_length],
            encoding,
            num_samples,
            b1000.byte_order,
        )?
    };

    Ok(MseedRecord {
        sequence_number,
        quality,
        network,
        station,
        location,
        channel,
        start_time,
        sample_rate,
        encoding,
        byte_order: b1000.byte_order,
        record_length: record_length as u32,
        samples,
    })
}

/// Read the record length from the Blockette 1000 of a record header.
///
/// `header` needs only the bytes up to the end of Blockette 1000.
pub fn record_length(header: &[u8]) -> Result<usize> {
    if header.len() < FIXED_HEADER_SIZE {
        return Err(MseedError::RecordTooShort {
            expected: FIXED_HEADER_SIZE,
            actual: header.len(),
        });
    }
    validate_fixed_header(header)?;
    let order = header_byte_order(header);
    walk_blockettes(header, order)?
        .b1000
        .map(|b| b.record_length)
        .ok_or(MseedError::MissingBlockette1000)
}

/// Byte order of the fixed header fields.
///
/// The header carries no explicit flag, so the start year and day are
/// checked for plausibility in big-endian first, then little-endian.
pub(crate) fn header_byte_order(data: &[u8]) -> ByteOrder {
    let plausible = |order: ByteOrder| {
        let year = order.u16_at(data, 20);
        let day = order.u16_at(data, 22);
        (1900..=2100).contains(&year) && (1..=366).contains(&day)
    };
    if !plausible(ByteOrder::Big) && plausible(ByteOrder::Little) {
        ByteOrder::Little
    } else {
        ByteOrder::Big
    }
}

fn validate_fixed_header(data: &[u8]) -> Result<()> {
    if !data[0..6].iter().all(|b| b.is_ascii_digit() || *b == b' ' || *b == 0) {
        return Err(MseedError::InvalidHeader(
            "sequence number is not numeric".into(),
        ));
    }
    if !matches!(data[6], b'D' | b'R' | b'Q' | b'M') {
        return Err(MseedError::InvalidHeader(format!(
            "unknown quality indicator {:#04x}",
            data[6]
        )));
    }
    Ok(())
}

fn header_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|_| MseedError::InvalidHeader("non UTF-8 identifier".into()))
}

fn read_btime(data: &[u8], order: ByteOrder) -> BTime {
    BTime {
        year: order.u16_at(data, 20),
        day: order.u16_at(data, 22),
        hour: data[24],
        minute: data[25],
        second: data[26],
        // byte 27 is unused
        fract: order.u16_at(data, 28),
    }
}

fn walk_blockettes(data: &[u8], order: ByteOrder) -> Result<Blockettes> {
    let mut found = Blockettes::default();
    let mut offset = order.u16_at(data, 46) as usize;

    for _ in 0..MAX_BLOCKETTES {
        if offset == 0 {
            break;
        }
        if offset < FIXED_HEADER_SIZE || offset + 4 > data.len() {
            break;
        }
        let blockette_type = order.u16_at(data, offset);
        let next_offset = order.u16_at(data, offset + 2) as usize;

        match blockette_type {
            1000 if offset + 8 <= data.len() => {
                let power = data[offset + 6] as u32;
                let record_length = 1usize.checked_shl(power).unwrap_or(0);
                if !(MIN_RECORD_LENGTH..=MAX_RECORD_LENGTH).contains(&record_length) {
                    return Err(MseedError::InvalidRecordLength(record_length));
                }
                found.b1000 = Some(Blockette1000 {
                    encoding: data[offset + 4],
                    byte_order: if data[offset + 5] == 0 {
                        ByteOrder::Little
                    } else {
                        ByteOrder::Big
                    },
                    record_length,
                });
            }
            100 if offset + 8 <= data.len() => {
                found.b100_rate = Some(f32::from_bits(order.u32_at(data, offset + 4)));
            }
            1001 if offset + 8 <= data.len() => {
                found.b1001_usec = Some(data[offset + 5] as i8);
            }
            _ => {}
        }

        // Blockettes are chained forward only
        if next_offset <= offset {
            break;
        }
        offset = next_offset;
    }

    Ok(found)
}

/// Sample rate from the SEED factor/multiplier pair.
pub(crate) fn compute_sample_rate(factor: i16, multiplier: i16) -> f64 {
    let f = factor as f64;
    let m = multiplier as f64;
    if factor == 0 || multiplier == 0 {
        return 0.0;
    }
    match (factor > 0, multiplier > 0) {
        (true, true) => f * m,
        (true, false) => -f / m,
        (false, true) => -m / f,
        (false, false) => 1.0 / (f * m),
    }
}

fn empty_samples(encoding: EncodingFormat) -> Samples {
    match encoding {
        EncodingFormat::Text => Samples::Text(Vec::new()),
        EncodingFormat::Float32 => Samples::Float(Vec::new()),
        EncodingFormat::Float64 => Samples::Double(Vec::new()),
        _ => Samples::Int(Vec::new()),
    }
}

fn decode_data(
    data: &[u8],
    encoding: EncodingFormat,
    num_samples: usize,
    byte_order: ByteOrder,
) -> Result<Samples> {
    let samples = match encoding {
        EncodingFormat::Text => {
            Samples::Text(decode_fixed(data, num_samples, |[b]: [u8; 1]| b)?)
        }
        EncodingFormat::Int16 => Samples::Int(decode_fixed(data, num_samples, |b: [u8; 2]| {
            i32::from(match byte_order {
                ByteOrder::Big => i16::from_be_bytes(b),
                ByteOrder::Little => i16::from_le_bytes(b),
            })
        })?),
        EncodingFormat::Int32 => Samples::Int(decode_fixed(data, num_samples, |b: [u8; 4]| {
            match byte_order {
                ByteOrder::Big => i32::from_be_bytes(b),
                ByteOrder::Little => i32::from_le_bytes(b),
            }
        })?),
        EncodingFormat::Float32 => Samples::Float(decode_fixed(data, num_samples, |b: [u8; 4]| {
            match byte_order {
                ByteOrder::Big => f32::from_be_bytes(b),
                ByteOrder::Little => f32::from_le_bytes(b),
            }
        })?),
        EncodingFormat::Float64 => Samples::Double(decode_fixed(data, num_samples, |b: [u8; 8]| {
            match byte_order {
                ByteOrder::Big => f64::from_be_bytes(b),
                ByteOrder::Little => f64::from_le_bytes(b),
            }
        })?),
        EncodingFormat::Steim1 => {
            Samples::Int(steim::decode(data, num_samples, byte_order, Steim::One)?)
        }
        EncodingFormat::Steim2 => {
            Samples::Int(steim::decode(data, num_samples, byte_order, Steim::Two)?)
        }
    };
    Ok(samples)
}

fn decode_fixed<const W: usize, T>(
    data: &[u8],
    num_samples: usize,
    convert: impl Fn([u8; W]) -> T,
) -> Result<Vec<T>> {
    let needed = num_samples * W;
    if data.len() < needed {
        return Err(MseedError::RecordTooShort {
            expected: needed,
            actual: data.len(),
        });
    }
    Ok(data[..needed]
        .chunks_exact(W)
        .map(|chunk| {
            let mut bytes = [0u8; W];
            bytes.copy_from_slice(chunk);
            convert(bytes)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    fn sample_record() -> MseedRecord {
        MseedRecord::new()
            .with_nslc("NZ", "GISB", "41", "BTZ")
            .with_start_time(NanoTime {
                year: 2012,
                day: 200,
                hour: 3,
                minute: 15,
                second: 0,
                nanosecond: 0,
            })
            .with_sample_rate(1.0)
            .with_samples(Samples::Int(vec![1500, 1502, 1499, 1510]))
    }

    #[test]
    fn test_header_fields() {
        let bytes = encode(&sample_record()).unwrap();
        let record = decode(&bytes).unwrap();
        assert_eq!(record.nslc(), "NZ.GISB.41.BTZ");
        assert_eq!(record.quality, 'D');
        assert_eq!(record.start_time.year, 2012);
        assert_eq!(record.start_time.day, 200);
        assert_eq!(record.start_time.hour, 3);
        assert_eq!(record.start_time.minute, 15);
        assert_eq!(record.sample_rate, 1.0);
        assert_eq!(record.encoding, EncodingFormat::Steim2);
        assert_eq!(record.record_length, 512);
        assert_eq!(record.samples, Samples::Int(vec![1500, 1502, 1499, 1510]));
        assert_eq!(record_length(&bytes[..64]).unwrap(), 512);
    }

    #[test]
    fn test_uncompressed_payloads() {
        for (encoding, samples) in [
            (EncodingFormat::Text, Samples::Text(b"CLOCK LOCKED".to_vec())),
            (EncodingFormat::Int16, Samples::Int(vec![-3, 0, 32767])),
            (EncodingFormat::Int32, Samples::Int(vec![i32::MIN, 7, i32::MAX])),
            (EncodingFormat::Float32, Samples::Float(vec![1.5, -2.25])),
            (EncodingFormat::Float64, Samples::Double(vec![0.125, 1e300])),
        ] {
            let record = sample_record()
                .with_encoding(encoding)
                .with_samples(samples.clone());
            let decoded = decode(&encode(&record).unwrap()).unwrap();
            assert_eq!(decoded.samples, samples, "{encoding}");
            assert_eq!(decoded.encoding, encoding);
        }
    }

    #[test]
    fn test_little_endian_header_detected() {
        let mut bytes = encode(&sample_record()).unwrap();
        // Swap the multi-byte header fields to little-endian
        let fields = [
            20..22, 22..24, 28..30, 30..32, 32..34, 34..36, 44..46, 46..48, 48..50, 50..52,
        ];
        for range in fields {
            bytes[range].reverse();
        }
        let record = decode(&bytes).unwrap();
        assert_eq!(record.start_time.year, 2012);
        assert_eq!(record.samples.len(), 4);
    }

    #[test]
    fn test_time_correction_applied_once() {
        let mut bytes = encode(&sample_record()).unwrap();
        // +1.5 s correction, not yet applied
        bytes[40..44].copy_from_slice(&15_000i32.to_be_bytes());
        let record = decode(&bytes).unwrap();
        assert_eq!(record.start_time.second, 1);
        assert_eq!(record.start_time.nanosecond, 500_000_000);

        bytes[36] |= TIME_CORRECTION_APPLIED;
        let record = decode(&bytes).unwrap();
        assert_eq!(record.start_time.second, 0);
    }

    #[test]
    fn test_blockette_1001_microseconds() {
        let mut bytes = encode(&sample_record()).unwrap();
        let plain = decode(&bytes).unwrap().start_time.to_epoch_nanos();

        // Chain a Blockette 1001 after Blockette 1000, before the Steim frames
        bytes[50..52].copy_from_slice(&56u16.to_be_bytes());
        bytes[56..58].copy_from_slice(&1001u16.to_be_bytes());
        bytes[58..60].copy_from_slice(&0u16.to_be_bytes());
        bytes[60] = 100;
        bytes[61] = 37;
        let record = decode(&bytes).unwrap();
        assert_eq!(record.start_time.to_epoch_nanos() - plain, 37_000);
        assert_eq!(record.samples.len(), 4);

        bytes[61] = (-20i8) as u8;
        let record = decode(&bytes).unwrap();
        assert_eq!(record.start_time.to_epoch_nanos() - plain, -20_000);
        assert_eq!(record.start_time.minute, 14);
    }

    #[test]
    fn test_rejects_garbage() {
        let zeros = vec![0u8; 512];
        assert!(matches!(decode(&zeros), Err(MseedError::InvalidHeader(_))));

        let mut bytes = encode(&sample_record()).unwrap();
        bytes[48..50].copy_from_slice(&999u16.to_be_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(MseedError::MissingBlockette1000)
        ));

        assert!(matches!(
            decode(&[b'0'; 20]),
            Err(MseedError::RecordTooShort { .. })
        ));
    }

    #[test]
    fn test_truncated_record() {
        let bytes = encode(&sample_record()).unwrap();
        assert!(matches!(
            decode(&bytes[..300]),
            Err(MseedError::RecordTooShort {
                expected: 512,
                actual: 300
            })
        ));
    }

    #[test]
    fn test_compute_sample_rate() {
        assert_eq!(compute_sample_rate(20, 1), 20.0);
        assert_eq!(compute_sample_rate(-10, 1), 0.1);
        assert_eq!(compute_sample_rate(1, -60), 1.0 / 60.0);
        assert_eq!(compute_sample_rate(0, 1), 0.0);
    }
}

//! Iterators over concatenated miniSEED v2 records.
//!
//! [`MseedReader`] walks records already held in a byte slice.
//! [`MseedStream`] pulls them one at a time from any [`Read`], which is how
//! files and stdin are consumed without buffering a whole source.

use std::io::{self, Read};

use crate::decode::{self, FIXED_HEADER_SIZE, MAX_RECORD_LENGTH, MIN_RECORD_LENGTH};
use crate::record::MseedRecord;
use crate::{MseedError, Result};

/// Iterator over miniSEED v2 records in a byte slice.
///
/// Each call to `next()` decodes the next record and advances past it.
/// Iteration stops when the data is exhausted or a decode error occurs.
///
/// # Example
///
/// ```
/// use mseed_detide::{encode, MseedRecord, MseedReader, Samples};
///
/// let record = MseedRecord::new()
///     .with_nslc("XX", "TEST", "00", "BTZ")
///     .with_samples(Samples::Int(vec![1, 2, 3]));
/// let data = encode(&record).unwrap();
///
/// let records: Vec<_> = MseedReader::new(&data)
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub struct MseedReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> MseedReader<'a> {
    /// Create a new reader over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl Iterator for MseedReader<'_> {
    type Item = Result<MseedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }
        let remaining = &self.data[self.offset..];

        let result = decode::record_length(remaining).and_then(|len| {
            if remaining.len() < len {
                return Err(MseedError::Truncated {
                    expected: len,
                    actual: remaining.len(),
                });
            }
            decode::decode(&remaining[..len]).map(|record| (record, len))
        });

        match result {
            Ok((record, len)) => {
                self.offset += len;
                Some(Ok(record))
            }
            Err(e) => {
                // Move offset to end to stop iteration
                self.offset = self.data.len();
                Some(Err(e))
            }
        }
    }
}

/// Iterator over miniSEED v2 records read from a byte stream.
///
/// A clean end of input between records ends iteration. Anything else that
/// stops a record from decoding, including a partial trailing record,
/// yields one error and then ends iteration.
///
/// ```
/// use std::io::Cursor;
/// use mseed_detide::{encode, MseedRecord, MseedStream, Samples};
///
/// let record = MseedRecord::new().with_samples(Samples::Int(vec![7; 10]));
/// let bytes = encode(&record).unwrap();
///
/// let mut stream = MseedStream::new(Cursor::new(bytes));
/// assert_eq!(stream.next().unwrap().unwrap().samples.len(), 10);
/// assert!(stream.next().is_none());
/// ```
pub struct MseedStream<R> {
    inner: R,
    done: bool,
    records: usize,
}

impl<R: Read> MseedStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            done: false,
            records: 0,
        }
    }

    /// Number of records decoded so far.
    pub fn records_read(&self) -> usize {
        self.records
    }

    fn read_record(&mut self) -> Result<Option<MseedRecord>> {
        let mut buf = vec![0u8; MIN_RECORD_LENGTH];
        let mut got = read_full(&mut self.inner, &mut buf)?;
        if got == 0 {
            return Ok(None);
        }
        if got < FIXED_HEADER_SIZE {
            return Err(MseedError::Truncated {
                expected: MIN_RECORD_LENGTH,
                actual: got,
            });
        }

        // Blockette 1000 normally sits in the first 128 bytes. A longer
        // chain lies inside the record, so doubling never reads past it.
        let mut header = decode::record_length(&buf[..got]);
        while matches!(header, Err(MseedError::MissingBlockette1000))
            && got == buf.len()
            && buf.len() < MAX_RECORD_LENGTH
        {
            let filled = buf.len();
            buf.resize(filled * 2, 0);
            got += read_full(&mut self.inner, &mut buf[filled..])?;
            header = decode::record_length(&buf[..got]);
        }
        let len = header?;

        if got < len {
            if got < buf.len() {
                return Err(MseedError::Truncated {
                    expected: len,
                    actual: got,
                });
            }
            buf.resize(len, 0);
            got += read_full(&mut self.inner, &mut buf[got..])?;
            if got < len {
                return Err(MseedError::Truncated {
                    expected: len,
                    actual: got,
                });
            }
        }

        let record = decode::decode(&buf[..len])?;
        self.records += 1;
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for MseedStream<R> {
    type Item = Result<MseedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the reader allows; returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::encode;
    use crate::record::Samples;
    use crate::time::NanoTime;
    use crate::types::EncodingFormat;

    fn make_test_record(station: &str, samples: Vec<i32>) -> MseedRecord {
        MseedRecord::new()
            .with_nslc("XX", station, "00", "BTZ")
            .with_start_time(NanoTime::from_epoch_seconds(1_735_689_600.0))
            .with_sample_rate(20.0)
            .with_encoding(EncodingFormat::Int32)
            .with_samples(Samples::Int(samples))
    }

    fn three_records() -> Vec<u8> {
        let mut data = Vec::new();
        for (station, samples) in [
            ("STA1", vec![10, 20, 30]),
            ("STA2", vec![40, 50, 60]),
            ("STA3", vec![70, 80, 90]),
        ] {
            data.extend_from_slice(&encode::encode(&make_test_record(station, samples)).unwrap());
        }
        data
    }

    #[test]
    fn test_reader_single_record() {
        let record = make_test_record("STA1", vec![1, 2, 3]);
        let data = encode::encode(&record).unwrap();

        let records: Vec<_> = MseedReader::new(&data).collect();
        assert_eq!(records.len(), 1);
        let decoded = records[0].as_ref().unwrap();
        assert_eq!(decoded.station, "STA1");
        assert_eq!(decoded.samples, Samples::Int(vec![1, 2, 3]));
    }

    #[test]
    fn test_reader_multiple_records() {
        let data = three_records();
        let records: Vec<_> = MseedReader::new(&data)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].station, "STA1");
        assert_eq!(records[1].station, "STA2");
        assert_eq!(records[2].station, "STA3");
    }

    #[test]
    fn test_reader_empty_data() {
        let records: Vec<_> = MseedReader::new(&[]).collect();
        assert!(records.is_empty());
    }

    #[test]
    fn test_reader_reports_partial_tail() {
        let mut data = three_records();
        data.truncate(512 + 200);
        let results: Vec<_> = MseedReader::new(&data).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(MseedError::Truncated { .. })));
    }

    #[test]
    fn test_stream_matches_slice_reader() {
        let data = three_records();
        let from_stream: Vec<_> = MseedStream::new(Cursor::new(data.clone()))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let from_slice: Vec<_> = MseedReader::new(&data)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(from_stream, from_slice);
    }

    #[test]
    fn test_stream_stops_after_error() {
        let mut data = encode::encode(&make_test_record("STA1", vec![1])).unwrap();
        data.extend_from_slice(&[0u8; 512]);
        data.extend_from_slice(&encode::encode(&make_test_record("STA2", vec![2])).unwrap());

        let mut stream = MseedStream::new(Cursor::new(data));
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
        assert_eq!(stream.records_read(), 1);
    }

    #[test]
    fn test_stream_truncated_tail() {
        let data = three_records();
        let mut stream = MseedStream::new(Cursor::new(data[..512 + 64].to_vec()));
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(
            stream.next(),
            Some(Err(MseedError::Truncated {
                expected: 512,
                actual: 64
            }))
        ));
    }

    #[test]
    fn test_stream_follows_long_blockette_chain() {
        let record = make_test_record("LONG", vec![1, 2, 3]).with_record_length(256);
        let mut data = encode::encode(&record).unwrap();
        // Move Blockette 1000 to offset 200 behind a Blockette 500 link
        let b1000 = data[48..56].to_vec();
        data[200..208].copy_from_slice(&b1000);
        data[202..204].copy_from_slice(&0u16.to_be_bytes());
        data[48..50].copy_from_slice(&500u16.to_be_bytes());
        data[50..52].copy_from_slice(&200u16.to_be_bytes());
        data.extend_from_slice(&encode::encode(&make_test_record("STA2", vec![4])).unwrap());

        let records: Vec<_> = MseedStream::new(Cursor::new(data))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].station, "LONG");
        assert_eq!(records[0].record_length, 256);
        assert_eq!(records[0].samples, Samples::Int(vec![1, 2, 3]));
        assert_eq!(records[1].station, "STA2");
    }

    #[test]
    fn test_stream_empty_input() {
        let mut stream = MseedStream::new(Cursor::new(Vec::new()));
        assert!(stream.next().is_none());
    }
}

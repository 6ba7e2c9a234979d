//! Steim1 and Steim2 compression and decompression.
//!
//! Both are differential integer compression schemes used in seismological
//! data (SEED/miniSEED format). See Appendix B of the SEED Manual v2.4.
//!
//! Samples are stored as first differences packed into 64-byte frames of
//! sixteen 32-bit words. Word 0 of every frame is a control word holding a
//! 2-bit nibble per word. In frame 0, words 1 and 2 hold the forward (X₀)
//! and reverse (Xₙ) integration constants: the first and last sample.

use log::warn;

use crate::types::ByteOrder;
use crate::{MseedError, Result};

pub const FRAME_SIZE: usize = 64; // 16 x 32-bit words
const WORDS_PER_FRAME: usize = 16;
const MAX_DIFFS_PER_WORD: usize = 7;

/// Steim compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steim {
    One,
    Two,
}

/// Differences unpacked from one data word.
type Unpacked = ([i32; MAX_DIFFS_PER_WORD], usize);

/// (count, bits, nibble, dnib) packings, tried in order.
const STEIM1_PACKINGS: [(usize, u32, u8, Option<u32>); 3] =
    [(4, 8, 0b01, None), (2, 16, 0b10, None), (1, 32, 0b11, None)];

const STEIM2_PACKINGS: [(usize, u32, u8, Option<u32>); 7] = [
    (7, 4, 0b11, Some(0b10)),
    (6, 5, 0b11, Some(0b01)),
    (5, 6, 0b11, Some(0b00)),
    (4, 8, 0b01, None),
    (3, 10, 0b10, Some(0b11)),
    (2, 15, 0b10, Some(0b10)),
    (1, 30, 0b10, Some(0b01)),
];

impl Steim {
    fn packings(self) -> &'static [(usize, u32, u8, Option<u32>)] {
        match self {
            Steim::One => &STEIM1_PACKINGS,
            Steim::Two => &STEIM2_PACKINGS,
        }
    }

    /// Whether a single difference is representable at all.
    fn fits(self, diff: i32) -> bool {
        match self {
            Steim::One => true,
            Steim::Two => fits_bits(diff, 30),
        }
    }

    fn unpack(self, word: u32, nibble: u8) -> Result<Unpacked> {
        let dnib = word >> 30;
        let layout = match (self, nibble, dnib) {
            (_, 0b00, _) => return Ok(([0; MAX_DIFFS_PER_WORD], 0)),
            (_, 0b01, _) => (4, 8),
            (Steim::One, 0b10, _) => (2, 16),
            (Steim::One, _, _) => (1, 32),
            (Steim::Two, 0b10, 0b01) => (1, 30),
            (Steim::Two, 0b10, 0b10) => (2, 15),
            (Steim::Two, 0b10, 0b11) => (3, 10),
            (Steim::Two, 0b11, 0b00) => (5, 6),
            (Steim::Two, 0b11, 0b01) => (6, 5),
            (Steim::Two, 0b11, 0b10) => (7, 4),
            (Steim::Two, _, _) => {
                return Err(MseedError::SteimDecode(format!(
                    "steim2 nibble={nibble:02b} invalid dnib={dnib:02b}"
                )));
            }
        };
        Ok(split_word(word, layout.0, layout.1))
    }

    /// Pack leading differences into one word: (word, nibble, consumed).
    fn pack(self, diffs: &[i32]) -> Option<(u32, u8, usize)> {
        self.packings()
            .iter()
            .find(|(count, bits, _, _)| {
                diffs.len() >= *count && diffs[..*count].iter().all(|&d| fits_bits(d, *bits))
            })
            .map(|&(count, bits, nibble, dnib)| {
                let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
                let mut word = dnib.map_or(0, |d| d << 30);
                for (i, &d) in diffs[..count].iter().enumerate() {
                    word |= ((d as u32) & mask) << ((count - 1 - i) as u32 * bits);
                }
                (word, nibble, count)
            })
    }
}

fn fits_bits(value: i32, bits: u32) -> bool {
    if bits >= 32 {
        return true;
    }
    let limit = 1i64 << (bits - 1);
    (-limit..limit).contains(&(value as i64))
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    (value as i32).wrapping_shl(shift).wrapping_shr(shift)
}

/// Split a word into `count` right-aligned signed fields of `bits` each.
fn split_word(word: u32, count: usize, bits: u32) -> Unpacked {
    let mut diffs = [0; MAX_DIFFS_PER_WORD];
    if bits == 32 {
        diffs[0] = word as i32;
        return (diffs, 1);
    }
    let mask = (1u32 << bits) - 1;
    for (i, slot) in diffs.iter_mut().take(count).enumerate() {
        let shift = (count - 1 - i) as u32 * bits;
        *slot = sign_extend((word >> shift) & mask, bits);
    }
    (diffs, count)
}

fn nibble_at(control: u32, word_idx: usize) -> u8 {
    ((control >> (30 - word_idx * 2)) & 0x03) as u8
}

/// Decode Steim1 compressed data into i32 samples.
pub fn decode_steim1(data: &[u8], num_samples: usize, byte_order: ByteOrder) -> Result<Vec<i32>> {
    decode(data, num_samples, byte_order, Steim::One)
}

/// Decode Steim2 compressed data into i32 samples.
pub fn decode_steim2(data: &[u8], num_samples: usize, byte_order: ByteOrder) -> Result<Vec<i32>> {
    decode(data, num_samples, byte_order, Steim::Two)
}

/// Decode `num_samples` samples from whole frames of `data`.
///
/// The first sample is X₀; the first difference only links the record to
/// its predecessor and is skipped. A trailing partial frame is ignored.
pub fn decode(
    data: &[u8],
    num_samples: usize,
    byte_order: ByteOrder,
    steim: Steim,
) -> Result<Vec<i32>> {
    if num_samples == 0 {
        return Ok(Vec::new());
    }
    let num_frames = data.len() / FRAME_SIZE;
    if num_frames == 0 {
        return Err(MseedError::SteimDecode("no frames in data".into()));
    }

    let x0 = byte_order.u32_at(data, 4) as i32;
    let xn = byte_order.u32_at(data, 8) as i32;
    let mut samples: Vec<i32> = Vec::with_capacity(num_samples);

    'frames: for frame_idx in 0..num_frames {
        let frame_offset = frame_idx * FRAME_SIZE;
        let control = byte_order.u32_at(data, frame_offset);

        for word_idx in 1..WORDS_PER_FRAME {
            // Skip X₀ and Xₙ words in frame 0
            if frame_idx == 0 && word_idx < 3 {
                continue;
            }
            let word = byte_order.u32_at(data, frame_offset + word_idx * 4);
            let (diffs, count) = steim.unpack(word, nibble_at(control, word_idx))?;

            for &diff in &diffs[..count] {
                if samples.len() >= num_samples {
                    break 'frames;
                }
                let value = match samples.last() {
                    None => x0,
                    Some(&prev) => prev.wrapping_add(diff),
                };
                samples.push(value);
            }
        }
    }

    if samples.len() != num_samples {
        return Err(MseedError::SampleCountMismatch {
            expected: num_samples,
            actual: samples.len(),
        });
    }

    if let Some(&last) = samples.last() {
        if last != xn {
            warn!("{steim:?} integrity check failed: last sample {last}, Xn {xn}");
        }
    }

    Ok(samples)
}

/// Encode i32 samples using Steim1 compression.
pub fn encode_steim1(samples: &[i32], byte_order: ByteOrder) -> Result<Vec<u8>> {
    pack_frames(samples, None, usize::MAX, byte_order, Steim::One).map(|(bytes, _)| bytes)
}

/// Encode i32 samples using Steim2 compression.
pub fn encode_steim2(samples: &[i32], byte_order: ByteOrder) -> Result<Vec<u8>> {
    pack_frames(samples, None, usize::MAX, byte_order, Steim::Two).map(|(bytes, _)| bytes)
}

/// Pack as many leading samples as fit into at most `max_frames` frames.
///
/// `previous` is the last sample of the preceding record in the same trace;
/// the first difference is taken against it (or is zero without one).
/// Returns the frame bytes and the number of samples packed.
pub fn pack_frames(
    samples: &[i32],
    previous: Option<i32>,
    max_frames: usize,
    byte_order: ByteOrder,
    steim: Steim,
) -> Result<(Vec<u8>, usize)> {
    if samples.is_empty() {
        return Err(MseedError::EncodeError("no samples to encode".into()));
    }
    if max_frames == 0 {
        return Err(MseedError::EncodeError("no room for a steim frame".into()));
    }

    let window = samples
        .len()
        .min(max_frames.saturating_mul(WORDS_PER_FRAME * MAX_DIFFS_PER_WORD));
    let first = previous
        .map(|p| samples[0].wrapping_sub(p))
        .filter(|&d| steim.fits(d))
        .unwrap_or(0);
    let mut diffs = Vec::with_capacity(window);
    diffs.push(first);
    diffs.extend(samples[..window].windows(2).map(|w| w[1].wrapping_sub(w[0])));

    let mut frames: Vec<[u32; WORDS_PER_FRAME]> = Vec::new();
    let mut packed = 0;

    while packed < diffs.len() && frames.len() < max_frames {
        let mut frame = [0u32; WORDS_PER_FRAME];
        let mut control: u32 = 0;
        let start_word = if frames.is_empty() { 3 } else { 1 };

        for (word_idx, slot) in frame.iter_mut().enumerate().skip(start_word) {
            if packed >= diffs.len() {
                break;
            }
            let (word, nibble, consumed) = steim.pack(&diffs[packed..]).ok_or_else(|| {
                MseedError::EncodeError(format!(
                    "difference {} at sample {packed} does not fit in {steim:?}",
                    diffs[packed]
                ))
            })?;
            *slot = word;
            control |= (nibble as u32) << (30 - word_idx * 2);
            packed += consumed;
        }

        frame[0] = control;
        frames.push(frame);
    }

    frames[0][1] = samples[0] as u32;
    frames[0][2] = samples[packed - 1] as u32;

    let mut output = Vec::with_capacity(frames.len() * FRAME_SIZE);
    for word in frames.iter().flatten() {
        byte_order.put_u32(&mut output, *word);
    }

    Ok((output, packed))
}

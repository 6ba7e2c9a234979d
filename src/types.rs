//! Shared types: [`ByteOrder`], [`EncodingFormat`] and [`SampleType`].

use std::fmt;
use std::str::FromStr;

use crate::{MseedError, Result};

/// Byte order for multi-byte fields in a miniSEED record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    pub(crate) fn u16_at(self, data: &[u8], offset: usize) -> u16 {
        let bytes = [data[offset], data[offset + 1]];
        match self {
            Self::Big => u16::from_be_bytes(bytes),
            Self::Little => u16::from_le_bytes(bytes),
        }
    }

    pub(crate) fn i16_at(self, data: &[u8], offset: usize) -> i16 {
        self.u16_at(data, offset) as i16
    }

    pub(crate) fn u32_at(self, data: &[u8], offset: usize) -> u32 {
        let bytes = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }

    pub(crate) fn put_u32(self, out: &mut Vec<u8>, value: u32) {
        match self {
            Self::Big => out.extend_from_slice(&value.to_be_bytes()),
            Self::Little => out.extend_from_slice(&value.to_le_bytes()),
        }
    }
}

/// Encoding format for sample data, as stored in Blockette 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// ASCII text, as in log and console records (code 0).
    Text,
    /// 16-bit signed integer (code 1).
    Int16,
    /// 32-bit signed integer (code 3).
    Int32,
    /// 32-bit IEEE float (code 4).
    Float32,
    /// 64-bit IEEE double (code 5).
    Float64,
    /// Steim-1 compressed integers (code 10).
    Steim1,
    /// Steim-2 compressed integers (code 11).
    Steim2,
}

impl EncodingFormat {
    /// Convert a raw encoding code (from Blockette 1000) to an `EncodingFormat`.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Text),
            1 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            4 => Ok(Self::Float32),
            5 => Ok(Self::Float64),
            10 => Ok(Self::Steim1),
            11 => Ok(Self::Steim2),
            _ => Err(MseedError::UnsupportedEncoding(code)),
        }
    }

    /// Convert to the raw encoding code for Blockette 1000.
    pub fn to_code(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Int16 => 1,
            Self::Int32 => 3,
            Self::Float32 => 4,
            Self::Float64 => 5,
            Self::Steim1 => 10,
            Self::Steim2 => 11,
        }
    }

    /// Whether this encoding stores integer samples.
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Text | Self::Float32 | Self::Float64)
    }

    pub fn is_steim(self) -> bool {
        matches!(self, Self::Steim1 | Self::Steim2)
    }

    /// Bytes per sample for uncompressed encodings.
    pub(crate) fn sample_width(self) -> Option<usize> {
        match self {
            Self::Text => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Float64 => Some(8),
            Self::Steim1 | Self::Steim2 => None,
        }
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::Int16 => write!(f, "INT16"),
            Self::Int32 => write!(f, "INT32"),
            Self::Float32 => write!(f, "FLOAT32"),
            Self::Float64 => write!(f, "FLOAT64"),
            Self::Steim1 => write!(f, "Steim1"),
            Self::Steim2 => write!(f, "Steim2"),
        }
    }
}

impl FromStr for EncodingFormat {
    type Err = MseedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "ascii" => Ok(Self::Text),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            "steim1" => Ok(Self::Steim1),
            "steim2" => Ok(Self::Steim2),
            _ => Err(MseedError::UnknownEncoding(s.to_string())),
        }
    }
}

/// Sample type of a decoded buffer, the discriminant of [`Samples`](crate::Samples).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Text,
    Int32,
    Float32,
    Float64,
}

impl SampleType {
    /// Single-character tag used in trace listings (`a`, `i`, `f`, `d`).
    pub fn tag(self) -> char {
        match self {
            Self::Text => 'a',
            Self::Int32 => 'i',
            Self::Float32 => 'f',
            Self::Float64 => 'd',
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

//! Error types for the record codec, the detide pipeline and configuration.

use thiserror::Error;

/// Errors raised while decoding or encoding miniSEED records.
#[derive(Debug, Error)]
pub enum MseedError {
    #[error("record too short: expected at least {expected} bytes, got {actual}")]
    RecordTooShort { expected: usize, actual: usize },

    #[error("invalid fixed header: {0}")]
    InvalidHeader(String),

    #[error("invalid record length: {0} bytes")]
    InvalidRecordLength(usize),

    #[error("unsupported encoding format: {0}")]
    UnsupportedEncoding(u8),

    #[error("unknown encoding name: {0}")]
    UnknownEncoding(String),

    #[error("blockette 1000 not found")]
    MissingBlockette1000,

    #[error("steim decode error: {0}")]
    SteimDecode(String),

    #[error("sample count mismatch: header says {expected}, decoded {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },

    #[error("truncated record: needed {expected} bytes, stream ended after {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("encode error: {0}")]
    EncodeError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MseedError>;

/// A failure that abandons the current input source.
#[derive(Debug, Error)]
pub enum DetideError {
    #[error("decode failed: {0}")]
    Decode(#[source] MseedError),

    #[error("encode failed: {0}")]
    Encode(#[source] MseedError),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed configuration, detected before any record is read.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid tidal constituent {0:?}: expected <label>/<amplitude>/<lag>")]
    InvalidConstituent(String),

    #[error("unknown tidal constituent label {0:?}")]
    UnknownConstituent(String),

    #[error("too many tidal constituents: {count} given, at most {max} allowed")]
    TooManyConstituents { count: usize, max: usize },

    #[error("latitude {0} is outside -90..=90 degrees")]
    LatitudeOutOfRange(f64),

    #[error("orientation must be a single ASCII character, got {0:?}")]
    InvalidOrientation(String),

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },
}

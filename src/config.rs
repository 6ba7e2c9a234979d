//! Correction parameters for a detide run.

use std::fmt;

use crate::error::ConfigError;
use crate::tide::{Constituent, HarmonicPredictor, MAX_CONSTITUENTS};

pub const DEFAULT_OFFSET: f64 = 0.0;
pub const DEFAULT_SCALE: f64 = 10.0;
pub const DEFAULT_ORIENTATION: char = 'T';

/// Immutable parameters applied to every record of a run.
///
/// A sample `x` at epoch `t` becomes `x - (offset + scale * height(t))`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetideParams {
    /// Added to the predicted height (alpha).
    pub offset: f64,
    /// Multiplies the predicted height (beta).
    pub scale: f64,
    /// Reference latitude in degrees.
    pub latitude: f64,
    /// Reference time zone offset in hours.
    pub zone: f64,
    /// Replacement for the third channel character, if any.
    pub orientation: Option<char>,
    pub constituents: Vec<Constituent>,
}

impl Default for DetideParams {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            scale: DEFAULT_SCALE,
            latitude: 0.0,
            zone: 0.0,
            orientation: Some(DEFAULT_ORIENTATION),
            constituents: Vec::new(),
        }
    }
}

impl DetideParams {
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_latitude(mut self, latitude: f64) -> Self {
        self.latitude = latitude;
        self
    }

    pub fn with_zone(mut self, zone: f64) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_orientation(mut self, orientation: Option<char>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_constituents(mut self, constituents: Vec<Constituent>) -> Self {
        self.constituents = constituents;
        self
    }

    /// Check ranges and constituent labels against the harmonic predictor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("offset", self.offset),
            ("scale", self.scale),
            ("latitude", self.latitude),
            ("zone", self.zone),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::LatitudeOutOfRange(self.latitude));
        }
        if self.constituents.len() > MAX_CONSTITUENTS {
            return Err(ConfigError::TooManyConstituents {
                count: self.constituents.len(),
                max: MAX_CONSTITUENTS,
            });
        }
        HarmonicPredictor::check(&self.constituents)
    }
}

impl fmt::Display for DetideParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let orient = self.orientation.map(String::from).unwrap_or_default();
        write!(
            f,
            "tidal [{orient}] zone={} latitude={} alpha={} beta={}",
            self.zone, self.latitude, self.offset, self.scale
        )
    }
}

/// Parse repeated `<label>/<amplitude>/<lag>` arguments.
pub fn parse_constituents<S: AsRef<str>>(args: &[S]) -> Result<Vec<Constituent>, ConfigError> {
    if args.len() > MAX_CONSTITUENTS {
        return Err(ConfigError::TooManyConstituents {
            count: args.len(),
            max: MAX_CONSTITUENTS,
        });
    }
    args.iter().map(|a| a.as_ref().parse()).collect()
}

/// Parse an orientation override; it must be exactly one ASCII character.
pub fn parse_orientation(arg: &str) -> Result<char, ConfigError> {
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && !c.is_ascii_control() => Ok(c),
        _ => Err(ConfigError::InvalidOrientation(arg.to_string())),
    }
}

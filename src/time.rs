//! Record timestamps and their conversion to epoch time.
//!
//! [`NanoTime`] is the in-memory start time of a record. miniSEED v2 stores
//! it on the wire as a [`BTime`], whose sub-second field has 100 µs
//! resolution. The detide transform works in epoch seconds, so both
//! directions of the epoch conversion live here.

use std::fmt;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Nanosecond-precision timestamp (year + day-of-year + time of day).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NanoTime {
    pub year: u16,
    pub day: u16,        // 1-366
    pub hour: u8,        // 0-23
    pub minute: u8,      // 0-59
    pub second: u8,      // 0-60
    pub nanosecond: u32, // 0-999_999_999
}

impl NanoTime {
    /// 1970-001 00:00:00.000000000
    pub fn epoch() -> Self {
        Self {
            year: 1970,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
        }
    }

    /// Build from a wire [`BTime`]; the 0.0001 s field becomes nanoseconds.
    pub fn from_btime(bt: &BTime) -> Self {
        Self {
            year: bt.year,
            day: bt.day,
            hour: bt.hour,
            minute: bt.minute,
            second: bt.second,
            nanosecond: bt.fract as u32 * 100_000,
        }
    }

    /// Convert to a wire [`BTime`], truncating to 0.0001 s units.
    pub fn to_btime(self) -> BTime {
        BTime {
            year: self.year,
            day: self.day,
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            fract: (self.nanosecond / 100_000) as u16,
        }
    }

    /// Nanoseconds since 1970-01-01T00:00:00Z.
    ///
    /// A leap second (`second == 60`) counts as one extra second of the
    /// minute, the same as POSIX time does for the instant after it.
    pub fn to_epoch_nanos(&self) -> i64 {
        let days = days_from_civil(self.year as i64, 1, 1) + self.day as i64 - 1;
        let seconds = days * SECONDS_PER_DAY
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64;
        seconds * NANOS_PER_SECOND + self.nanosecond as i64
    }

    /// Inverse of [`to_epoch_nanos`](Self::to_epoch_nanos).
    pub fn from_epoch_nanos(nanos: i64) -> Self {
        let seconds = nanos.div_euclid(NANOS_PER_SECOND);
        let nanosecond = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let of_day = seconds.rem_euclid(SECONDS_PER_DAY);

        let year = year_of_days(days);
        let day = days - days_from_civil(year, 1, 1) + 1;

        Self {
            year: year as u16,
            day: day as u16,
            hour: (of_day / 3600) as u8,
            minute: (of_day % 3600 / 60) as u8,
            second: (of_day % 60) as u8,
            nanosecond,
        }
    }

    /// Seconds since the Unix epoch with fractional precision.
    ///
    /// Whole seconds and the fraction are converted separately so the
    /// sub-second part keeps full `f64` precision.
    pub fn to_epoch_seconds(&self) -> f64 {
        let nanos = self.to_epoch_nanos();
        nanos.div_euclid(NANOS_PER_SECOND) as f64
            + nanos.rem_euclid(NANOS_PER_SECOND) as f64 / NANOS_PER_SECOND as f64
    }

    pub fn from_epoch_seconds(seconds: f64) -> Self {
        Self::from_epoch_nanos((seconds * NANOS_PER_SECOND as f64).round() as i64)
    }

    /// Shift by a signed number of nanoseconds.
    pub fn add_nanos(self, nanos: i64) -> Self {
        Self::from_epoch_nanos(self.to_epoch_nanos() + nanos)
    }

    /// Time of sample `index` in a series starting at `self`.
    ///
    /// The offset is computed directly from the index so long records do
    /// not accumulate rounding error.
    pub fn offset_by_samples(self, index: usize, sample_rate: f64) -> Self {
        if sample_rate == 0.0 {
            return self;
        }
        let offset = (index as f64 * NANOS_PER_SECOND as f64 / sample_rate).round() as i64;
        self.add_nanos(offset)
    }
}

impl Default for NanoTime {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for NanoTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:03} {:02}:{:02}:{:02}.{:09}",
            self.year, self.day, self.hour, self.minute, self.second, self.nanosecond
        )
    }
}

impl From<BTime> for NanoTime {
    fn from(bt: BTime) -> Self {
        Self::from_btime(&bt)
    }
}

impl From<NanoTime> for BTime {
    fn from(nt: NanoTime) -> Self {
        nt.to_btime()
    }
}

/// BTIME timestamp, the 10-byte start time of the v2 fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTime {
    pub year: u16,
    pub day: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fract: u16, // 0.0001 second units
}

impl fmt::Display for BTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:03} {:02}:{:02}:{:02}.{:04}",
            self.year, self.day, self.hour, self.minute, self.second, self.fract
        )
    }
}

// Proleptic Gregorian day count relative to 1970-01-01.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn year_of_days(days: i64) -> i64 {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let year = yoe + era * 400;
    // March-based years roll over in January and February.
    if mp >= 10 { year + 1 } else { year }
}

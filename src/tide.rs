//! Harmonic tide prediction.
//!
//! The predicted height is a sum of harmonic constituents:
//!
//! h(t) = Σᵢ fᵢ(t) Aᵢ cos(Vᵢ(t) + uᵢ(t) − 360° gᵢ)
//!
//! where Aᵢ is the amplitude, gᵢ the lag as a fraction of a cycle, Vᵢ the
//! astronomical argument built from the Doodson numbers of the constituent,
//! and fᵢ/uᵢ the nodal amplitude and phase corrections for the 18.6 year
//! lunar node cycle.
//!
//! References:
//! - Doodson (1921): Harmonic development of the tide-generating potential
//! - Pugh (1987): Tides, Surges and Mean Sea-Level, tables 4.1 and 4.3

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Largest number of constituents a predictor accepts.
pub const MAX_CONSTITUENTS: usize = 32;

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Julian date of 1970-01-01T00:00:00Z.
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian date of J2000.0.
const JD_J2000: f64 = 2_451_545.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// One harmonic term of a tide prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Constituent {
    /// Short name such as `M2` or `K1`, matched case-insensitively.
    pub label: String,
    pub amplitude: f64,
    /// Phase lag as a fraction of a cycle (degrees / 360).
    pub lag: f64,
}

impl Constituent {
    /// Create a constituent from a lag given in degrees.
    pub fn new(label: &str, amplitude: f64, lag_degrees: f64) -> Self {
        Self {
            label: label.to_string(),
            amplitude,
            lag: lag_degrees / 360.0,
        }
    }
}

/// Parses `<label>/<amplitude>/<lag-degrees>`, e.g. `M2/0.512/128.3`.
impl FromStr for Constituent {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidConstituent(s.to_string());

        let mut parts = s.split('/');
        let (Some(label), Some(amplitude), Some(lag), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let label = label.trim();
        if label.is_empty() {
            return Err(invalid());
        }
        let amplitude: f64 = amplitude.trim().parse().map_err(|_| invalid())?;
        let lag: f64 = lag.trim().parse().map_err(|_| invalid())?;
        if !amplitude.is_finite() || !lag.is_finite() {
            return Err(invalid());
        }

        Ok(Self::new(label, amplitude, lag))
    }
}

impl fmt::Display for Constituent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({:6.3})", self.label, self.amplitude, self.lag)
    }
}

/// A source of predicted tide heights.
///
/// `epoch` is in seconds since 1970-01-01T00:00:00Z, `latitude` in degrees
/// and `zone` in hours.
pub trait TidePredictor {
    fn height(&self, constituents: &[Constituent], epoch: f64, latitude: f64, zone: f64) -> f64;
}

impl<F> TidePredictor for F
where
    F: Fn(&[Constituent], f64, f64, f64) -> f64,
{
    fn height(&self, constituents: &[Constituent], epoch: f64, latitude: f64, zone: f64) -> f64 {
        self(constituents, epoch, latitude, zone)
    }
}

/// Nodal modulation applied to a constituent.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Nodal {
    /// Solar constituents are not modulated.
    None,
    /// Powers of the M2 factor, for M2-like and compound constituents.
    M2(i32),
    O1,
    K1,
    K2,
    J1,
    OO1,
    Mf,
    Mm,
}

/// Doodson numbers (τ, s, h, p, N′, p′) and phase offset in degrees.
#[derive(Debug, Clone, Copy)]
struct Doodson {
    label: &'static str,
    args: [i32; 6],
    phase: f64,
    nodal: Nodal,
}

const fn doodson(label: &'static str, args: [i32; 6], phase: f64, nodal: Nodal) -> Doodson {
    Doodson {
        label,
        args,
        phase,
        nodal,
    }
}

#[rustfmt::skip]
const CONSTITUENTS: &[Doodson] = &[
    // Semidiurnal
    doodson("M2",   [2,  0,  0,  0, 0,  0],   0.0, Nodal::M2(1)),
    doodson("S2",   [2,  2, -2,  0, 0,  0],   0.0, Nodal::None),
    doodson("N2",   [2, -1,  0,  1, 0,  0],   0.0, Nodal::M2(1)),
    doodson("K2",   [2,  2,  0,  0, 0,  0],   0.0, Nodal::K2),
    doodson("2N2",  [2, -2,  0,  2, 0,  0],   0.0, Nodal::M2(1)),
    doodson("MU2",  [2, -2,  2,  0, 0,  0],   0.0, Nodal::M2(1)),
    doodson("NU2",  [2, -1,  2, -1, 0,  0],   0.0, Nodal::M2(1)),
    doodson("L2",   [2,  1,  0, -1, 0,  0], 180.0, Nodal::M2(1)),
    doodson("T2",   [2,  2, -3,  0, 0,  1],   0.0, Nodal::None),
    // Diurnal
    doodson("K1",   [1,  1,  0,  0, 0,  0],  90.0, Nodal::K1),
    doodson("O1",   [1, -1,  0,  0, 0,  0], -90.0, Nodal::O1),
    doodson("P1",   [1,  1, -2,  0, 0,  0], -90.0, Nodal::None),
    doodson("Q1",   [1, -2,  0,  1, 0,  0], -90.0, Nodal::O1),
    doodson("J1",   [1,  2,  0, -1, 0,  0],  90.0, Nodal::J1),
    doodson("OO1",  [1,  3,  0,  0, 0,  0],  90.0, Nodal::OO1),
    doodson("2Q1",  [1, -3,  0,  2, 0,  0], -90.0, Nodal::O1),
    // Shallow water
    doodson("M4",   [4,  0,  0,  0, 0,  0],   0.0, Nodal::M2(2)),
    doodson("MS4",  [4,  2, -2,  0, 0,  0],   0.0, Nodal::M2(1)),
    doodson("MN4",  [4, -1,  0,  1, 0,  0],   0.0, Nodal::M2(2)),
    doodson("S4",   [4,  4, -4,  0, 0,  0],   0.0, Nodal::None),
    doodson("M6",   [6,  0,  0,  0, 0,  0],   0.0, Nodal::M2(3)),
    doodson("2MS6", [6,  2, -2,  0, 0,  0],   0.0, Nodal::M2(2)),
    doodson("M8",   [8,  0,  0,  0, 0,  0],   0.0, Nodal::M2(4)),
    // Long period
    doodson("MM",   [0,  1,  0, -1, 0,  0],   0.0, Nodal::Mm),
    doodson("MF",   [0,  2,  0,  0, 0,  0],   0.0, Nodal::Mf),
    doodson("MSF",  [0,  2, -2,  0, 0,  0],   0.0, Nodal::M2(-1)),
    doodson("SSA",  [0,  0,  2,  0, 0,  0],   0.0, Nodal::None),
    doodson("SA",   [0,  0,  1,  0, 0, -1],   0.0, Nodal::None),
];

fn lookup(label: &str) -> Option<&'static Doodson> {
    CONSTITUENTS
        .iter()
        .find(|c| c.label.eq_ignore_ascii_case(label))
}

/// Mean astronomical longitudes in degrees at one instant.
#[derive(Debug, Clone, Copy)]
struct Astro {
    /// Mean lunar time.
    tau: f64,
    /// Mean longitude of the moon.
    s: f64,
    /// Mean longitude of the sun.
    h: f64,
    /// Longitude of lunar perigee.
    p: f64,
    /// Longitude of the ascending lunar node.
    n: f64,
    /// Longitude of solar perigee.
    p1: f64,
}

impl Astro {
    fn at(epoch: f64) -> Self {
        let days = epoch / SECONDS_PER_DAY;
        let t = (days + JD_UNIX_EPOCH - JD_J2000) / DAYS_PER_CENTURY;

        let s = 218.316_447_7 + 481_267.881_234_21 * t;
        let h = 280.466_46 + 36_000.769_83 * t;
        let p = 83.353_246_5 + 4_069.013_728_7 * t;
        let n = 125.044_52 - 1_934.136_261 * t;
        let p1 = 282.94 + 1.719_2 * t;

        // Hours of the day; whole days drop out because τ coefficients are integers
        let hours = days.rem_euclid(1.0) * 24.0;
        let tau = 15.0 * hours + h - s;

        Self {
            tau,
            s,
            h,
            p,
            n,
            p1,
        }
    }

    /// Equilibrium argument V in degrees.
    fn argument(&self, c: &Doodson) -> f64 {
        let [tau, s, h, p, n, p1] = c.args.map(f64::from);
        // Doodson's N' is the negated node longitude
        tau * self.tau + s * self.s + h * self.h + p * self.p - n * self.n + p1 * self.p1 + c.phase
    }
}

/// Nodal factor f and phase correction u (degrees).
fn nodal_correction(nodal: Nodal, node: f64) -> (f64, f64) {
    let n = node.to_radians();
    let (c1, c2, c3) = (n.cos(), (2.0 * n).cos(), (3.0 * n).cos());
    let (s1, s2, s3) = (n.sin(), (2.0 * n).sin(), (3.0 * n).sin());

    match nodal {
        Nodal::None => (1.0, 0.0),
        Nodal::M2(power) => {
            let f = 1.0004 - 0.0373 * c1 + 0.0002 * c2;
            let u = -2.14 * s1;
            (f.powi(power.abs()), u * power as f64)
        }
        Nodal::O1 => (
            1.0089 + 0.1871 * c1 - 0.0147 * c2 + 0.0014 * c3,
            10.80 * s1 - 1.34 * s2 + 0.19 * s3,
        ),
        Nodal::K1 => (
            1.0060 + 0.1150 * c1 - 0.0088 * c2 + 0.0006 * c3,
            -8.86 * s1 + 0.68 * s2 - 0.07 * s3,
        ),
        Nodal::K2 => (
            1.0241 + 0.2863 * c1 + 0.0083 * c2 - 0.0015 * c3,
            -17.74 * s1 + 0.68 * s2 - 0.04 * s3,
        ),
        Nodal::J1 => (1.013 + 0.168 * c1 - 0.017 * c2, -12.9 * s1 + 1.3 * s2),
        Nodal::OO1 => (1.106 + 0.640 * c1 + 0.134 * c2, -36.7 * s1 + 4.0 * s2),
        Nodal::Mf => (1.043 + 0.414 * c1, -23.7 * s1 + 2.7 * s2 - 0.4 * s3),
        Nodal::Mm => (1.0 - 0.130 * c1, 0.0),
    }
}

/// Predictor for the named constituents of [`HarmonicPredictor::labels`].
///
/// Unknown labels contribute nothing; [`HarmonicPredictor::check`] rejects
/// them up front. The latitude argument is accepted for interface
/// compatibility and does not change the result: the harmonic constants
/// are already local to the gauge.
///
/// ```
/// use mseed_detide::tide::{Constituent, HarmonicPredictor, TidePredictor};
///
/// let s2 = [Constituent::new("S2", 1.5, 0.0)];
/// // S2 peaks at 00:00 and 12:00 UTC
/// let h = HarmonicPredictor.height(&s2, 0.0, 0.0, 0.0);
/// assert!((h - 1.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HarmonicPredictor;

impl HarmonicPredictor {
    /// Labels of every supported constituent.
    pub fn labels() -> impl Iterator<Item = &'static str> {
        CONSTITUENTS.iter().map(|c| c.label)
    }

    pub fn knows(label: &str) -> bool {
        lookup(label).is_some()
    }

    /// Fail on the first constituent whose label is not supported.
    pub fn check(constituents: &[Constituent]) -> Result<(), ConfigError> {
        match constituents.iter().find(|c| !Self::knows(&c.label)) {
            Some(c) => Err(ConfigError::UnknownConstituent(c.label.clone())),
            None => Ok(()),
        }
    }
}

impl TidePredictor for HarmonicPredictor {
    fn height(&self, constituents: &[Constituent], epoch: f64, _latitude: f64, zone: f64) -> f64 {
        let astro = Astro::at(epoch + zone * 3600.0);
        constituents
            .iter()
            .filter_map(|c| lookup(&c.label).map(|d| (c, d)))
            .map(|(c, d)| {
                let (f, u) = nodal_correction(d.nodal, astro.n);
                let phase = astro.argument(d) + u - 360.0 * c.lag;
                f * c.amplitude * phase.to_radians().cos()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 2012-07-20T00:00:00Z
    const T0: f64 = 1_342_742_400.0;

    #[test]
    fn test_parse_constituent() {
        let c: Constituent = "M2/0.5/90".parse().unwrap();
        assert_eq!(c.label, "M2");
        assert_eq!(c.amplitude, 0.5);
        assert_eq!(c.lag, 0.25);

        let c: Constituent = " k1 / 0.12 / -45 ".parse().unwrap();
        assert_eq!(c.label, "k1");
        assert_eq!(c.lag, -0.125);
    }

    #[test]
    fn test_parse_constituent_errors() {
        for bad in ["", "M2", "M2/0.5", "M2/0.5/1/2", "/0.5/1", "M2/x/1", "M2/1/nan", "M2/inf/0"] {
            assert_eq!(
                bad.parse::<Constituent>(),
                Err(ConfigError::InvalidConstituent(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_closure_predictor() {
        let constant = |_: &[Constituent], _: f64, _: f64, _: f64| 5.0;
        assert_eq!(constant.height(&[], T0, 0.0, 0.0), 5.0);
    }

    #[test]
    fn test_s2_is_solar_time_locked() {
        let s2 = [Constituent::new("S2", 2.0, 0.0)];
        let p = HarmonicPredictor;
        assert_abs_diff_eq!(p.height(&s2, T0, 0.0, 0.0), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.height(&s2, T0 + 6.0 * 3600.0, 0.0, 0.0), -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.height(&s2, T0 + 3.0 * 3600.0, 0.0, 0.0), 0.0, epsilon = 1e-9);
        // A 90 degree lag shifts the peak by 3 hours
        let lagged = [Constituent::new("S2", 2.0, 90.0)];
        assert_abs_diff_eq!(p.height(&lagged, T0 + 3.0 * 3600.0, 0.0, 0.0), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zone_shifts_time_argument() {
        let s2 = [Constituent::new("S2", 1.0, 0.0)];
        let p = HarmonicPredictor;
        assert_abs_diff_eq!(
            p.height(&s2, T0, 0.0, 6.0),
            p.height(&s2, T0 + 6.0 * 3600.0, 0.0, 0.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_m2_period() {
        let m2 = [Constituent::new("m2", 1.0, 37.0)];
        let p = HarmonicPredictor;
        let period = 12.420_601_2 * 3600.0;
        for k in 0..8 {
            let t = T0 + k as f64 * 4321.0;
            assert_abs_diff_eq!(
                p.height(&m2, t, 0.0, 0.0),
                p.height(&m2, t + period, 0.0, 0.0),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn test_heights_are_bounded_by_nodal_amplitude() {
        let all: Vec<Constituent> = HarmonicPredictor::labels()
            .map(|l| Constituent::new(l, 1.0, 0.0))
            .collect();
        assert!(all.len() <= MAX_CONSTITUENTS);
        let p = HarmonicPredictor;
        for i in 0..48 {
            let h = p.height(&all[..1], T0 + i as f64 * 1800.0, -38.0, 0.0);
            assert!(h.abs() <= 1.04, "{h}");
        }
    }

    #[test]
    fn test_nodal_factors_within_published_ranges() {
        for deg in (0..360).step_by(15) {
            let n = deg as f64;
            let (f_m2, u_m2) = nodal_correction(Nodal::M2(1), n);
            assert!((0.96..=1.04).contains(&f_m2));
            assert!(u_m2.abs() <= 2.2);
            let (f_k1, _) = nodal_correction(Nodal::K1, n);
            assert!((0.88..=1.12).contains(&f_k1));
            let (f_o1, _) = nodal_correction(Nodal::O1, n);
            assert!((0.80..=1.19).contains(&f_o1));
            let (f_msf, u_msf) = nodal_correction(Nodal::M2(-1), n);
            assert_eq!(f_msf, f_m2);
            assert_eq!(u_msf, -u_m2);
        }
        assert_eq!(nodal_correction(Nodal::None, 123.0), (1.0, 0.0));
    }

    #[test]
    fn test_check_labels() {
        let ok = [Constituent::new("MSf", 1.0, 0.0), Constituent::new("2q1", 1.0, 0.0)];
        assert_eq!(HarmonicPredictor::check(&ok), Ok(()));
        let bad = [Constituent::new("M2", 1.0, 0.0), Constituent::new("X9", 1.0, 0.0)];
        assert_eq!(
            HarmonicPredictor::check(&bad),
            Err(ConfigError::UnknownConstituent("X9".into()))
        );
        assert_eq!(HarmonicPredictor.height(&bad[1..], T0, 0.0, 0.0), 0.0);
    }
}

//! Clock frequency metadata attached to sequential contexts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit suffixes accepted by [`Frequency::from_str`], longest first.
const UNITS: [(&str, f64); 4] = [
    ("ghz", 1_000_000_000.0),
    ("mhz", 1_000_000.0),
    ("khz", 1_000.0),
    ("hz", 1.0),
];

/// A clock frequency in Hertz.
///
/// Frequencies are pure metadata: they are carried from `[clocks]` in
/// `weft.toml` or from the tracer to the backend and never influence state
/// synthesis.
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a frequency from a value in Hertz.
    pub fn new(hz: f64) -> Self {
        Self(hz)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns the frequency in megahertz.
    pub fn mhz(&self) -> f64 {
        self.0 / 1_000_000.0
    }

    /// Returns the clock period in nanoseconds, or `None` for a zero frequency.
    pub fn period_ns(&self) -> Option<f64> {
        (self.0 > 0.0).then(|| 1_000_000_000.0 / self.0)
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (suffix, scale) in UNITS {
            if self.0 >= scale && scale > 1.0 {
                let unit = match suffix {
                    "ghz" => "GHz",
                    "mhz" => "MHz",
                    _ => "KHz",
                };
                return write!(f, "{}{unit}", self.0 / scale);
            }
        }
        write!(f, "{}Hz", self.0)
    }
}

/// Error returned when a frequency string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid frequency: '{input}'")]
pub struct ParseFrequencyError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };
        let lower = s.to_ascii_lowercase();
        let (number, scale) = UNITS
            .iter()
            .find_map(|(suffix, scale)| lower.strip_suffix(suffix).map(|n| (n, *scale)))
            .unwrap_or((lower.as_str(), 1.0));
        let value: f64 = number.trim().parse().map_err(|_| err())?;
        if !value.is_finite() || value < 0.0 {
            return Err(err());
        }
        Ok(Frequency(value * scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_units() {
        assert_eq!("1GHz".parse::<Frequency>().unwrap().hz(), 1e9);
        assert_eq!("50MHz".parse::<Frequency>().unwrap().hz(), 50e6);
        assert_eq!("100 kHz".parse::<Frequency>().unwrap().hz(), 100e3);
        assert_eq!("48000Hz".parse::<Frequency>().unwrap().hz(), 48e3);
    }

    #[test]
    fn parse_bare_number_is_hz() {
        assert_eq!("25000000".parse::<Frequency>().unwrap().hz(), 25e6);
    }

    #[test]
    fn parse_rejects_garbage_and_negatives() {
        assert!("fast".parse::<Frequency>().is_err());
        assert!("-5MHz".parse::<Frequency>().is_err());
    }

    #[test]
    fn period() {
        let f = Frequency::new(100e6);
        assert!((f.period_ns().unwrap() - 10.0).abs() < 1e-9);
        assert!(Frequency::new(0.0).period_ns().is_none());
    }

    #[test]
    fn display_selects_unit() {
        assert_eq!(Frequency::new(1e9).to_string(), "1GHz");
        assert_eq!(Frequency::new(50e6).to_string(), "50MHz");
        assert_eq!(Frequency::new(44_100.0).to_string(), "44.1KHz");
        assert_eq!(Frequency::new(500.0).to_string(), "500Hz");
    }
}

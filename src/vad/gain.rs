//! Linear amplitude ratios with an optional decibel text form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A dimensionless linear amplitude ratio.
///
/// Parses from either a bare number (`"0.5"`, linear) or a number suffixed
/// with `dB` (`"-20dB"`, decibel). The suffix is case-sensitive: `"20db"`
/// is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Gain(f64);

#[derive(Debug, Error, PartialEq)]
pub enum GainParseError {
    #[error("empty gain value")]
    Empty,
    #[error("could not parse {0:?} as a number")]
    NotANumber(String),
}

impl Gain {
    pub fn linear(value: f64) -> Self {
        Gain(value)
    }

    pub fn from_db(db: f64) -> Self {
        Gain(10f64.powf(db / 10.0))
    }

    /// Underlying linear ratio.
    pub fn as_linear(&self) -> f64 {
        self.0
    }

    /// Equivalent decibel value: `10 * log10(g)`.
    pub fn db(&self) -> f64 {
        10.0 * self.0.log10()
    }
}

impl FromStr for Gain {
    type Err = GainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GainParseError::Empty);
        }
        if let Some(prefix) = s.strip_suffix("dB") {
            let db: f64 = prefix
                .trim()
                .parse()
                .map_err(|_| GainParseError::NotANumber(s.to_string()))?;
            return Ok(Gain::from_db(db));
        }
        let linear: f64 = s
            .parse()
            .map_err(|_| GainParseError::NotANumber(s.to_string()))?;
        Ok(Gain::linear(linear))
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Gain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Gain::linear(n)),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl Default for Gain {
    fn default() -> Self {
        Gain::linear(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decibel_suffix() {
        let g: Gain = "-20dB".parse().unwrap();
        assert!((g.db() - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn parses_bare_number_as_linear() {
        let g: Gain = "0.5".parse().unwrap();
        assert_eq!(g.as_linear(), 0.5);
    }

    #[test]
    fn db_suffix_is_case_sensitive() {
        assert!("20db".parse::<Gain>().is_err());
        assert!("20Db".parse::<Gain>().is_err());
        assert!("20DB".parse::<Gain>().is_err());
        assert!("20dB".parse::<Gain>().is_ok());
    }

    #[test]
    fn malformed_input_fails() {
        assert!("".parse::<Gain>().is_err());
        assert!("not a number".parse::<Gain>().is_err());
        assert!("dB".parse::<Gain>().is_err());
    }

    #[test]
    fn round_trips_through_linear_and_db() {
        let g = Gain::from_db(-6.0);
        assert!((g.db() - (-6.0)).abs() < 1e-9);
    }
}

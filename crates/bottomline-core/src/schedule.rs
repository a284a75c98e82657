//! Import frequency setting and the cadences it maps to.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Operator-selected import frequency, persisted as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Off,
    Daily,
    TwiceDaily,
    Hourly,
}

impl Frequency {
    /// Stored code: `0` off, `1` daily, `2` twice daily, `3` hourly.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Frequency::Off => 0,
            Frequency::Daily => 1,
            Frequency::TwiceDaily => 2,
            Frequency::Hourly => 3,
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFrequency`] for codes outside `0..=3`.
    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        match code {
            0 => Ok(Frequency::Off),
            1 => Ok(Frequency::Daily),
            2 => Ok(Frequency::TwiceDaily),
            3 => Ok(Frequency::Hourly),
            other => Err(CoreError::InvalidFrequency(other.to_string())),
        }
    }

    /// The recurring cadence for this frequency; `None` when imports are off.
    #[must_use]
    pub fn cadence(self) -> Option<Cadence> {
        match self {
            Frequency::Off => None,
            Frequency::Daily => Some(Cadence::Daily),
            Frequency::TwiceDaily => Some(Cadence::TwiceDaily),
            Frequency::Hourly => Some(Cadence::Hourly),
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Frequency::Off
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    /// Accepts either the stored code or the lowercase name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "off" | "never" => Ok(Frequency::Off),
            "daily" => Ok(Frequency::Daily),
            "twicedaily" | "twice-daily" => Ok(Frequency::TwiceDaily),
            "hourly" => Ok(Frequency::Hourly),
            _ => Err(CoreError::InvalidFrequency(s.to_string())),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Off => write!(f, "off"),
            Frequency::Daily => write!(f, "daily"),
            Frequency::TwiceDaily => write!(f, "twicedaily"),
            Frequency::Hourly => write!(f, "hourly"),
        }
    }
}

/// A named recurring interval understood by the trigger registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    TwiceDaily,
    Hourly,
}

impl Cadence {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::TwiceDaily => "twicedaily",
            Cadence::Hourly => "hourly",
        }
    }

    #[must_use]
    pub fn period(self) -> Duration {
        match self {
            Cadence::Daily => Duration::from_secs(24 * 60 * 60),
            Cadence::TwiceDaily => Duration::from_secs(12 * 60 * 60),
            Cadence::Hourly => Duration::from_secs(60 * 60),
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for freq in [
            Frequency::Off,
            Frequency::Daily,
            Frequency::TwiceDaily,
            Frequency::Hourly,
        ] {
            assert_eq!(Frequency::from_code(i64::from(freq.code())).unwrap(), freq);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(
            Frequency::from_code(7),
            Err(CoreError::InvalidFrequency("7".to_string()))
        );
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("3".parse::<Frequency>().unwrap(), Frequency::Hourly);
        assert_eq!("TwiceDaily".parse::<Frequency>().unwrap(), Frequency::TwiceDaily);
        assert_eq!(" off ".parse::<Frequency>().unwrap(), Frequency::Off);
        assert!("weekly".parse::<Frequency>().is_err());
    }

    #[test]
    fn off_has_no_cadence() {
        assert_eq!(Frequency::Off.cadence(), None);
        assert_eq!(Frequency::Daily.cadence(), Some(Cadence::Daily));
    }

    #[test]
    fn cadence_periods_shrink_with_frequency() {
        assert!(Cadence::Daily.period() > Cadence::TwiceDaily.period());
        assert!(Cadence::TwiceDaily.period() > Cadence::Hourly.period());
        assert_eq!(Cadence::Hourly.period().as_secs(), 3600);
    }

    #[test]
    fn frequency_serializes_lowercase() {
        let json = serde_json::to_string(&Frequency::TwiceDaily).unwrap();
        assert_eq!(json, "\"twicedaily\"");
    }
}

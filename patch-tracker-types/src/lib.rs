//! Plain-data types shared between the patch tracker core and its drivers.

use serde::{Deserialize, Serialize};

/// Event and trajectory time, in seconds.
pub type Time = f64;

/// Image-plane coordinate, in pixels.
pub type Location = f32;

/// In-plane rotation, in radians.
pub type Orientation = f32;

/// Sign of a per-pixel brightness change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Negative,
    Positive,
}

impl Polarity {
    pub fn is_positive(&self) -> bool {
        *self == Polarity::Positive
    }
}

impl From<bool> for Polarity {
    fn from(orig: bool) -> Self {
        if orig {
            Polarity::Positive
        } else {
            Polarity::Negative
        }
    }
}

impl TryFrom<u8> for Polarity {
    type Error = ParseError;

    /// Convert from the `0 | 1` encoding used in plain-text event files.
    fn try_from(orig: u8) -> Result<Self, Self::Error> {
        match orig {
            0 => Ok(Polarity::Negative),
            1 => Ok(Polarity::Positive),
            other => Err(ParseError::BadPolarity(other)),
        }
    }
}

/// One event camera observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub t: Time,
    pub x: Location,
    pub y: Location,
    pub p: Polarity,
}

/// A tracker seed, or a recorded tracker state.
///
/// The on-disk line format is `t,x,y,theta,id`, with the id optional when
/// used as a seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSeed {
    pub t: Time,
    pub x: Location,
    pub y: Location,
    pub theta: Orientation,
    pub id: Option<u64>,
}

impl FeatureSeed {
    pub fn new(t: Time, x: Location, y: Location, theta: Orientation, id: Option<u64>) -> Self {
        Self { t, x, y, theta, id }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("expected 4 or 5 comma-delimited tokens, found {0}")]
    BadTokenCount(usize),
    #[error("invalid number: {0}")]
    BadNumber(String),
    #[error("polarity must be 0 or 1, found {0}")]
    BadPolarity(u8),
}

impl std::str::FromStr for FeatureSeed {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.trim().split(',').collect();
        if tokens.len() != 4 && tokens.len() != 5 {
            return Err(ParseError::BadTokenCount(tokens.len()));
        }
        fn num<T: std::str::FromStr>(tok: &str) -> Result<T, ParseError> {
            tok.trim()
                .parse()
                .map_err(|_| ParseError::BadNumber(tok.to_string()))
        }
        let t: Time = num(tokens[0])?;
        let x: Location = num(tokens[1])?;
        let y: Location = num(tokens[2])?;
        let theta: Orientation = num(tokens[3])?;
        let id = if tokens.len() == 5 {
            Some(num(tokens[4])?)
        } else {
            None
        };
        Ok(FeatureSeed { t, x, y, theta, id })
    }
}

impl std::fmt::Display for FeatureSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6},{}",
            self.t,
            self.x,
            self.y,
            self.theta,
            self.id.unwrap_or(0)
        )
    }
}

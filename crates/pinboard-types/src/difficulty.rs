use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fibonacci-style effort label. Serialized as its point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
#[repr(u8)]
pub enum Difficulty {
    One = 1,
    Two = 2,
    Three = 3,
    Five = 5,
    Eight = 8,
    Thirteen = 13,
    TwentyOne = 21,
    ThirtyFour = 34,
    FiftyFive = 55,
}

impl Difficulty {
    pub const SCALE: [Difficulty; 9] = [
        Difficulty::One,
        Difficulty::Two,
        Difficulty::Three,
        Difficulty::Five,
        Difficulty::Eight,
        Difficulty::Thirteen,
        Difficulty::TwentyOne,
        Difficulty::ThirtyFour,
        Difficulty::FiftyFive,
    ];

    pub fn points(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid difficulty {0}: expected one of 1, 2, 3, 5, 8, 13, 21, 34, 55")]
pub struct InvalidDifficulty(pub i64);

impl TryFrom<i64> for Difficulty {
    type Error = InvalidDifficulty;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Difficulty::SCALE
            .into_iter()
            .find(|d| i64::from(d.points()) == value)
            .ok_or(InvalidDifficulty(value))
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.points()
    }
}

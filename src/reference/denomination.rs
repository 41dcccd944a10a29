use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::VerificationError;

/// Supported note denominations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Denomination {
    Rs100,
    Rs200,
    Rs500,
    Rs2000,
}

impl Denomination {
    /// Every denomination, highest first
    pub const ALL: [Denomination; 4] = [
        Denomination::Rs2000,
        Denomination::Rs500,
        Denomination::Rs200,
        Denomination::Rs100,
    ];

    pub fn value(&self) -> u32 {
        match self {
            Denomination::Rs100 => 100,
            Denomination::Rs200 => 200,
            Denomination::Rs500 => 500,
            Denomination::Rs2000 => 2000,
        }
    }
}

impl TryFrom<u32> for Denomination {
    type Error = VerificationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            100 => Ok(Denomination::Rs100),
            200 => Ok(Denomination::Rs200),
            500 => Ok(Denomination::Rs500),
            2000 => Ok(Denomination::Rs2000),
            other => Err(VerificationError::UnknownDenomination {
                value: other.to_string(),
            }),
        }
    }
}

impl From<Denomination> for u32 {
    fn from(denomination: Denomination) -> Self {
        denomination.value()
    }
}

impl FromStr for Denomination {
    type Err = VerificationError;

    /// Accepts `500`, `₹500` and `Rs500`, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('₹')
            .or_else(|| trimmed.strip_prefix("Rs"))
            .unwrap_or(trimmed)
            .trim();

        digits
            .parse::<u32>()
            .map_err(|_| VerificationError::UnknownDenomination {
                value: s.to_string(),
            })
            .and_then(Denomination::try_from)
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.value())
    }
}

use std::fmt;
use std::str::FromStr;

use crate::interval::IntervalError;

/// Represents the strand of a genomic feature.
///
/// Variants are declared in the byte order of their symbols (`+` < `-` < `.`),
/// which is the tie-breaker used when sorting intervals for packing.
///
/// # Example
///
/// ```
/// use genome_browser::strand::Strand;
///
/// let strand: Strand = "-".parse().unwrap();
/// assert_eq!(strand, Strand::Reverse);
/// assert!(Strand::Forward < Strand::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    /// Positive strand (`+`).
    Forward,
    /// Negative strand (`-`).
    Reverse,
    /// No orientation (`.`).
    #[default]
    Unknown,
}

impl Strand {
    /// Returns the single-character symbol of the strand.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::Unknown => ".",
        }
    }

    /// Returns `true` for `+` and `-`.
    #[inline]
    pub fn is_directional(&self) -> bool {
        !matches!(self, Strand::Unknown)
    }
}

impl FromStr for Strand {
    type Err = IntervalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." => Ok(Strand::Unknown),
            other => Err(IntervalError::InvalidStrand(other.to_string())),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

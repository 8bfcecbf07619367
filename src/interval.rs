use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use crate::strand::Strand;

/// Result alias for interval construction.
pub type IntervalResult<T> = Result<T, IntervalError>;

/// An error raised while building an interval or one of its specialisations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// The interval does not have a strictly positive length.
    InvalidLength {
        /// The requested start coordinate.
        start: u64,
        /// The requested end coordinate.
        end: u64,
    },
    /// The strand symbol is not one of `+`, `-` or `.`.
    InvalidStrand(String),
    /// The reading frame is outside `0..=2` and is not the `-1` sentinel.
    InvalidFrame(i64),
    /// Exon ranks are 1-based.
    InvalidRank,
}

impl fmt::Display for IntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalError::InvalidLength { start, end } => {
                write!(f, "interval [{start}, {end}) must have end > start")
            }
            IntervalError::InvalidStrand(raw) => {
                write!(f, "expected '+', '-' or '.', got '{raw}'")
            }
            IntervalError::InvalidFrame(frame) => {
                write!(f, "frame must be -1, 0, 1 or 2, got {frame}")
            }
            IntervalError::InvalidRank => f.write_str("exon rank must be at least 1"),
        }
    }
}

impl std::error::Error for IntervalError {}

/// A metadata value attached to an interval, typically a rendering hint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Returns the value as a string slice if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

/// Values above `i64::MAX` become [`Value::Float`].
impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Value::Float(value as f64), Value::Integer)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Free-form metadata keyed by name.
pub type Metadata = BTreeMap<String, Value>;

/// A half-open genomic range `[start, end)` on one chromosome.
///
/// Two orderings exist and are deliberately kept apart:
///
/// * the packing priority returned by [`Interval::packing_key`]
///   (ascending start, descending length, then strand), used to feed the
///   packer;
/// * the positional comparisons ([`Interval::starts_before`],
///   [`Interval::ends_after`], ...), which only relate intervals on the
///   same chromosome and look at a single coordinate.
///
/// `Interval` therefore implements `PartialEq` but not `Ord`.
///
/// # Example
///
/// ```
/// use genome_browser::{Interval, Strand};
///
/// let interval = Interval::new("chr1", 100, 200, Strand::Forward).unwrap();
/// assert_eq!(interval.len(), 100);
/// assert_eq!(interval.sam_interval(), "chr1:100-200");
/// ```
#[derive(Debug, Clone)]
pub struct Interval {
    chrom: String,
    start: u64,
    end: u64,
    strand: Strand,
    name: Option<String>,
    metadata: Metadata,
}

impl Interval {
    /// Creates a new interval, rejecting anything with `end <= start`.
    pub fn new(
        chrom: impl Into<String>,
        start: u64,
        end: u64,
        strand: Strand,
    ) -> IntervalResult<Self> {
        if end <= start {
            return Err(IntervalError::InvalidLength { start, end });
        }

        Ok(Self {
            chrom: chrom.into(),
            start,
            end,
            strand,
            name: None,
            metadata: Metadata::new(),
        })
    }

    /// Creates an interval from a textual strand symbol.
    pub fn parse(
        chrom: impl Into<String>,
        start: u64,
        end: u64,
        strand: &str,
    ) -> IntervalResult<Self> {
        Self::new(chrom, start, end, strand.parse()?)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the length of the interval. Always at least 1.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always `false`; zero-length intervals cannot be constructed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Renders the interval as `chrom:start-end`.
    pub fn sam_interval(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }

    /// Looks up a named attribute, falling back to the metadata map.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "chrom" => Some(Value::from(self.chrom.as_str())),
            "start" => Some(Value::from(self.start)),
            "end" => Some(Value::from(self.end)),
            "strand" => Some(Value::from(self.strand.as_str())),
            "name" => self.name.as_deref().map(Value::from),
            other => self.metadata.get(other).cloned(),
        }
    }

    /// Sort key for packing: ascending start, descending length, then strand.
    #[inline]
    pub fn packing_key(&self) -> (u64, Reverse<u64>, Strand) {
        (self.start, Reverse(self.len()), self.strand)
    }

    /// Half-open overlap test on the same chromosome.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.start < other.end && other.start < self.end
    }

    #[inline]
    pub fn starts_before(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.start < other.start
    }

    #[inline]
    pub fn starts_at_or_before(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.start <= other.start
    }

    #[inline]
    pub fn ends_after(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.end > other.end
    }

    #[inline]
    pub fn ends_at_or_after(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.end >= other.end
    }
}

/// Equality ignores the name and metadata.
impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.chrom == other.chrom
            && self.start == other.start
            && self.end == other.end
            && self.strand == other.strand
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interval(\"{}\", {}, {}, \"{}\")",
            self.chrom, self.start, self.end, self.strand
        )
    }
}

/// Sorts intervals in place by packing priority.
pub fn sort_for_packing(intervals: &mut [Interval]) {
    intervals.sort_by_key(Interval::packing_key);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_prefers_fields_over_metadata() {
        let interval = Interval::new("chr2", 5, 9, Strand::Unknown)
            .unwrap()
            .with_metadata("start", "shadowed")
            .with_metadata("color", "#3498DB");

        assert_eq!(interval.get("start"), Some(Value::Integer(5)));
        assert_eq!(interval.get("color"), Some(Value::from("#3498DB")));
        assert_eq!(interval.get("name"), None);
        assert_eq!(interval.get("missing"), None);
    }

    #[test]
    fn positional_comparisons_require_same_chrom() {
        let a = Interval::new("chr1", 10, 50, Strand::Forward).unwrap();
        let b = Interval::new("chr1", 20, 30, Strand::Forward).unwrap();
        let c = Interval::new("chr2", 20, 30, Strand::Forward).unwrap();

        assert!(a.starts_before(&b));
        assert!(a.ends_after(&b));
        assert!(!a.starts_before(&c));
        assert!(!a.ends_after(&c));
        assert!(!a.overlaps(&c));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn large_unsigned_values_do_not_wrap() {
        assert_eq!(Value::from(42u64), Value::Integer(42));
        assert_eq!(Value::from(i64::MAX as u64), Value::Integer(i64::MAX));
        assert_eq!(Value::from(u64::MAX), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn equality_ignores_metadata() {
        let a = Interval::new("chr1", 1, 2, Strand::Reverse).unwrap();
        let b = a.clone().with_name("x").with_metadata("color", "red");
        assert_eq!(a, b);
    }
}

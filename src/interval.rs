//! Half-open position ranges on a PRG string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PrgError;

/// A half-open interval `[start, end)`.
///
/// Zero-length intervals are allowed, and mark junctions in the graph which
/// carry no sequence. Ordered by `start`, then by `end`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Interval {
    /// First position covered
    pub start: u32,
    /// One past the last position covered
    pub end: u32,
}

impl Interval {
    /// Create a new interval.
    ///
    /// # Panics
    /// If `end < start`.
    pub fn new(start: u32, end: u32) -> Self {
        assert!(
            end >= start,
            "Interval end {end} is before its start {start}"
        );
        Self { start, end }
    }

    /// Number of positions covered
    #[inline]
    pub fn length(&self) -> u32 {
        self.end - self.start
    }

    /// Whether this interval has no sequence
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl FromStr for Interval {
    type Err = PrgError;

    /// Parses the `[start, end)` form written by [`fmt::Display`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| PrgError::Parse(format!("`{s}` is not an interval")))?;
        let (start, end) = inner
            .split_once(',')
            .ok_or_else(|| PrgError::Parse(format!("`{s}` is not an interval")))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| PrgError::Parse(format!("Invalid interval start in `{s}`")))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| PrgError::Parse(format!("Invalid interval end in `{s}`")))?;
        if end < start {
            return Err(PrgError::Parse(format!("Interval `{s}` ends before it starts")));
        }
        Ok(Self { start, end })
    }
}

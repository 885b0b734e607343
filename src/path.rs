//! Walks through the coordinate space of a PRG string.
//!
//! A [`Path`] is an ordered list of [`Interval`]s. It is used both as the
//! identity of a k-mer graph node (its genomic coordinates) and as the unit
//! produced by graph walks.

use std::cmp::min;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PrgError;
use crate::interval::Interval;

/// An ordered walk of intervals.
///
/// Ordering is lexicographic over the interval list, so a path which is a
/// strict prefix of another sorts first. Equality is equality of the interval
/// lists.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Path {
    path: Vec<Interval>,
}

impl Path {
    /// An empty path, with no intervals
    pub fn new() -> Self {
        Self { path: Vec::new() }
    }

    /// Create a path from a list of intervals, which must be non-overlapping
    /// and in increasing order.
    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        debug_assert!(intervals.windows(2).all(|w| w[0].end <= w[1].start));
        Self { path: intervals }
    }

    /// A path of a single interval
    pub fn from_interval(interval: Interval) -> Self {
        Self {
            path: vec![interval],
        }
    }

    /// The intervals making up the walk
    pub fn intervals(&self) -> &[Interval] {
        &self.path
    }

    /// Number of intervals
    pub fn num_intervals(&self) -> usize {
        self.path.len()
    }

    /// Start of the first interval (0 if empty)
    pub fn start(&self) -> u32 {
        self.path.first().map_or(0, |i| i.start)
    }

    /// End of the last interval (0 if empty)
    pub fn end(&self) -> u32 {
        self.path.last().map_or(0, |i| i.end)
    }

    /// Total sequence length along the path
    pub fn length(&self) -> u32 {
        self.path.iter().map(Interval::length).sum()
    }

    /// Whether the path contains no intervals
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Append an interval, which must not start before the current end.
    pub fn add_end_interval(&mut self, interval: Interval) {
        assert!(
            self.path.is_empty() || interval.start >= self.end(),
            "Cannot add {interval} after path ending at {}",
            self.end()
        );
        self.path.push(interval);
    }

    /// Prepend an interval, which must end before the current start.
    pub fn add_start_interval(&mut self, interval: Interval) {
        assert!(
            self.path.is_empty() || interval.end <= self.start(),
            "Cannot add {interval} before path starting at {}",
            self.start()
        );
        self.path.insert(0, interval);
    }

    /// Extend the final interval by one position
    pub(crate) fn extend_end(&mut self) {
        if let Some(last) = self.path.last_mut() {
            last.end += 1;
        }
    }

    /// Drop zero-length intervals before the first base
    pub(crate) fn trim_start(&mut self) {
        let first_base = self
            .path
            .iter()
            .position(|i| !i.is_empty())
            .unwrap_or(self.path.len());
        self.path.drain(..first_base);
    }

    /// The part of the walk covering `len` positions, starting `offset`
    /// positions along the path (not along the PRG string).
    ///
    /// Zero-length intervals inside the covered region are kept, those before
    /// it are not.
    ///
    /// # Panics
    /// If `offset + len` is beyond the end of the path.
    pub fn subpath(&self, offset: u32, len: u32) -> Path {
        assert!(
            offset + len <= self.length(),
            "Subpath {offset}+{len} runs past the end of {self}"
        );
        let mut intervals = Vec::new();
        let mut covered = 0;
        let mut remaining = len;
        let mut started = false;
        for interval in &self.path {
            if !started {
                if (covered == offset && interval.length() > 0)
                    || (covered < offset && covered + interval.length() > offset)
                {
                    started = true;
                    let sub_start = interval.start + offset - covered;
                    let sub_end = min(interval.end, sub_start + remaining);
                    intervals.push(Interval::new(sub_start, sub_end));
                    remaining -= sub_end - sub_start;
                }
            } else if remaining > 0 {
                let sub_end = min(interval.end, interval.start + remaining);
                intervals.push(Interval::new(interval.start, sub_end));
                remaining -= sub_end - interval.start;
            }
            if started && remaining == 0 {
                break;
            }
            covered += interval.length();
        }
        Path { path: intervals }
    }

    /// Whether this path is a contiguous piece of `big_path`.
    pub fn is_subpath(&self, big_path: &Path) -> bool {
        let len = self.length();
        let big_len = big_path.length();
        if big_len < len || big_path.start() > self.start() || big_path.end() < self.end() {
            return false;
        }
        (0..=(big_len - len)).any(|offset| big_path.subpath(offset, len) == *self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{{", self.path.len())?;
        for interval in &self.path {
            write!(f, "{interval}")?;
        }
        write!(f, "}}")
    }
}

impl FromStr for Path {
    type Err = PrgError;

    /// Parses the `N{[a, b)[c, d)}` form written by [`fmt::Display`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (count, rest) = s
            .split_once('{')
            .ok_or_else(|| PrgError::Parse(format!("`{s}` is not a path")))?;
        let count: usize = count
            .parse()
            .map_err(|_| PrgError::Parse(format!("Invalid interval count in `{s}`")))?;
        let body = rest
            .strip_suffix('}')
            .ok_or_else(|| PrgError::Parse(format!("Unterminated path `{s}`")))?;

        let mut path = Path::new();
        for piece in body.split_inclusive(')') {
            let interval: Interval = piece.parse()?;
            if !path.is_empty() && interval.start < path.end() {
                return Err(PrgError::Parse(format!("Intervals out of order in `{s}`")));
            }
            path.path.push(interval);
        }
        if path.path.len() != count {
            return Err(PrgError::Parse(format!(
                "Path `{s}` should have {count} intervals but has {}",
                path.path.len()
            )));
        }
        Ok(path)
    }
}

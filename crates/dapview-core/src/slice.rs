//! Dimension subsetting descriptors

use crate::error::{DapviewError, Result};
use serde::Serialize;
use std::fmt;

/// A `first:stride:stop` subset of one dimension.
///
/// `stop` is exclusive and may be absent, in which case the slice is
/// *incomplete* and runs to the end of whatever dimension it is later
/// completed against. `constrained` records whether the constraint expression
/// bounded this position at all; `whole` records whether the slice covers the
/// entire dimension it was completed against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Slice {
    first: u64,
    stride: u64,
    stop: Option<u64>,
    constrained: bool,
    whole: bool,
}

impl Default for Slice {
    fn default() -> Self {
        Self::unconstrained()
    }
}

impl Slice {
    /// A placeholder for a dimension position the expression left untouched.
    pub fn unconstrained() -> Self {
        Self {
            first: 0,
            stride: 1,
            stop: None,
            constrained: false,
            whole: false,
        }
    }

    /// An explicitly bounded slice. `stop` is exclusive; `None` leaves the
    /// upper bound open until [`Slice::complete`].
    pub fn new(first: u64, stride: u64, stop: Option<u64>) -> Result<Self> {
        if stride == 0 {
            return Err(DapviewError::InvalidSlice(format!(
                "stride must be positive in [{}:{}:...]",
                first, stride
            )));
        }
        if let Some(stop) = stop {
            if stop <= first {
                return Err(DapviewError::InvalidSlice(format!(
                    "empty range: first {} >= stop {}",
                    first, stop
                )));
            }
        }
        Ok(Self {
            first,
            stride,
            stop,
            constrained: true,
            whole: false,
        })
    }

    /// A single index
    pub fn index(i: u64) -> Self {
        Self {
            first: i,
            stride: 1,
            stop: Some(i + 1),
            constrained: true,
            whole: false,
        }
    }

    /// The first `count` elements of a dimension
    pub fn of_count(count: u64) -> Result<Self> {
        Self::new(0, 1, Some(count))
    }

    /// The whole, unconstrained slice over a dimension of length `len`.
    pub fn fill(len: u64) -> Self {
        Self {
            first: 0,
            stride: 1,
            stop: Some(len),
            constrained: false,
            whole: true,
        }
    }

    pub fn first(&self) -> u64 {
        self.first
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Exclusive upper bound, if known
    pub fn stop(&self) -> Option<u64> {
        self.stop
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    pub fn is_whole(&self) -> bool {
        self.whole
    }

    /// Missing an explicit upper bound
    pub fn is_incomplete(&self) -> bool {
        self.stop.is_none()
    }

    /// Fill in the open upper bound against a dimension of length `len` and
    /// recompute `whole`.
    pub fn complete(&mut self, len: u64) -> Result<()> {
        let stop = self.stop.unwrap_or(len);
        if stop > len || (self.first >= stop && len > 0) {
            return Err(DapviewError::InvalidSlice(format!(
                "{} does not fit a dimension of length {}",
                self, len
            )));
        }
        self.stop = Some(stop);
        self.whole = self.first == 0 && self.stride == 1 && stop == len;
        Ok(())
    }

    /// Number of selected elements; zero while incomplete.
    pub fn count(&self) -> u64 {
        match self.stop {
            Some(stop) => span(self.first, self.stride, stop),
            None => 0,
        }
    }

    /// Number of selected elements if completed against length `len`.
    pub fn count_within(&self, len: u64) -> u64 {
        span(self.first, self.stride, self.stop.unwrap_or(len))
    }

    /// Index of the last selected element
    pub fn last(&self) -> Option<u64> {
        match self.count() {
            0 => None,
            n => Some(self.first + (n - 1) * self.stride),
        }
    }

    /// Compact, URL-safe form: `[i]`, `[first:last]`, or `[first:stride:last]`.
    pub fn to_constraint_string(&self) -> String {
        match (self.last(), self.stop) {
            (_, None) if self.stride == 1 => format!("[{}:]", self.first),
            (_, None) => format!("[{}:{}:]", self.first, self.stride),
            (None, Some(_)) => "[]".to_string(),
            (Some(last), _) if last == self.first => format!("[{}]", self.first),
            (Some(last), _) if self.stride == 1 => format!("[{}:{}]", self.first, last),
            (Some(last), _) => format!("[{}:{}:{}]", self.first, self.stride, last),
        }
    }
}

fn span(first: u64, stride: u64, stop: u64) -> u64 {
    if stop <= first {
        0
    } else {
        (stop - first).div_ceil(stride)
    }
}

/// Human-readable form, always `[first:stride:last]`.
impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.stop, self.last()) {
            (None, _) => write!(f, "[{}:{}:]", self.first, self.stride),
            (Some(_), None) => write!(f, "[]"),
            (Some(_), Some(last)) => write!(f, "[{}:{}:{}]", self.first, self.stride, last),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

/// Slider range of one axis: `min <= max` and `step > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AxisRange {
    /// Range given to axes that appear before any layer reports an extent.
    pub const DEFAULT: Self = Self {
        min: 0.0,
        max: 0.0,
        step: 1.0,
    };

    /// Identity for `union`: every real range widens it.
    pub const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        step: f64::INFINITY,
    };

    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn validate(&self, axis: usize) -> Result<()> {
        let valid = !self.min.is_nan()
            && !self.max.is_nan()
            && self.min <= self.max
            && self.step > 0.0;
        if valid {
            Ok(())
        } else {
            Err(ViewerError::InvalidRange {
                axis,
                min: self.min,
                max: self.max,
                step: self.step,
            })
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            step: self.step.min(other.step),
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<(f64, f64, f64)> for AxisRange {
    fn from((min, max, step): (f64, f64, f64)) -> Self {
        Self::new(min, max, step)
    }
}

/// Per-axis slicing instruction derived from the current point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisIndex {
    /// Sliced at a single integer position.
    At(i64),
    /// Displayed axis, kept whole.
    All,
}

impl AxisIndex {
    pub fn position(&self) -> Option<i64> {
        match self {
            Self::At(index) => Some(*index),
            Self::All => None,
        }
    }
}

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::events::EventEmitter;

use super::{AxisIndex, AxisRange, align_order_from_trailing};

/// Notification streams for one `Dims`. Payloads name the affected axis where
/// one exists.
#[derive(Debug, Clone, Default)]
pub struct DimsEvents {
    /// Point changed on an axis.
    pub axis: EventEmitter<usize>,
    pub range: EventEmitter<usize>,
    pub ndim: EventEmitter<usize>,
    pub ndisplay: EventEmitter<usize>,
    pub order: EventEmitter<Vec<usize>>,
    /// The displayed space changed shape and cameras should be reset.
    pub camera: EventEmitter<()>,
}

/// Plain-data copy of a `Dims`, used for reporting and for change detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimsSnapshot {
    pub ndim: usize,
    pub ndisplay: usize,
    pub order: Vec<usize>,
    pub point: Vec<f64>,
    pub range: Vec<AxisRange>,
    pub displayed: Vec<usize>,
}

/// Dimensional state: per-axis range and point, axis order and the number of
/// trailing axes in that order that are displayed.
#[derive(Debug)]
pub struct Dims {
    range: Vec<AxisRange>,
    point: Vec<f64>,
    order: Vec<usize>,
    ndisplay: usize,
    pub events: DimsEvents,
}

impl Default for Dims {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Dims {
    pub fn new(ndim: usize) -> Self {
        Self {
            range: vec![AxisRange::DEFAULT; ndim],
            point: vec![0.0; ndim],
            order: (0..ndim).collect(),
            ndisplay: 2,
            events: DimsEvents::default(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.order.len()
    }

    pub fn range(&self) -> &[AxisRange] {
        &self.range
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn ndisplay(&self) -> usize {
        self.ndisplay
    }

    /// Trailing `ndisplay` entries of the order, or the whole order when
    /// there are fewer axes than that.
    pub fn displayed(&self) -> &[usize] {
        let start = self.ndim().saturating_sub(self.ndisplay);
        &self.order[start..]
    }

    pub fn not_displayed(&self) -> &[usize] {
        let start = self.ndim().saturating_sub(self.ndisplay);
        &self.order[..start]
    }

    pub fn is_displayed(&self, axis: usize) -> bool {
        self.displayed().contains(&axis)
    }

    /// Permutation that moves the axes of `data[indices]` (which keeps the
    /// displayed axes in ascending order) into `displayed` order.
    pub fn displayed_order(&self) -> Vec<usize> {
        let displayed = self.displayed();
        let mut sorted = displayed.to_vec();
        sorted.sort_unstable();
        displayed
            .iter()
            .map(|axis| {
                sorted
                    .iter()
                    .position(|candidate| candidate == axis)
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn indices(&self) -> Vec<AxisIndex> {
        (0..self.ndim())
            .map(|axis| {
                if self.is_displayed(axis) {
                    AxisIndex::All
                } else {
                    AxisIndex::At(self.point[axis].round() as i64)
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> DimsSnapshot {
        DimsSnapshot {
            ndim: self.ndim(),
            ndisplay: self.ndisplay,
            order: self.order.clone(),
            point: self.point.clone(),
            range: self.range.clone(),
            displayed: self.displayed().to_vec(),
        }
    }

    /// Grows by prepending leading axes or shrinks by dropping leading axes,
    /// so the trailing axes keep their ranges, points and relative order.
    pub fn set_ndim(&mut self, ndim: usize) -> bool {
        let current = self.ndim();
        if ndim == current {
            return false;
        }

        if ndim > current {
            let added = ndim - current;
            let mut range = vec![AxisRange::DEFAULT; added];
            range.extend_from_slice(&self.range);
            let mut point = vec![0.0; added];
            point.extend_from_slice(&self.point);
            self.range = range;
            self.point = point;
            self.order = align_order_from_trailing(&self.order, ndim);
            debug!("dims grew from {current} to {ndim} axes");
            self.events.ndim.emit(ndim);
            for axis in 0..added {
                self.events.axis.emit(axis);
            }
        } else {
            let dropped = current - ndim;
            self.range.drain(..dropped);
            self.point.drain(..dropped);
            self.order = align_order_from_trailing(&self.order, ndim);
            debug!("dims shrank from {current} to {ndim} axes");
            self.events.ndim.emit(ndim);
            for axis in 0..ndim {
                self.events.axis.emit(axis);
            }
        }
        self.events.order.emit(self.order.clone());
        true
    }

    /// Replaces an axis range, clamping the point into it when needed.
    pub fn set_range(&mut self, axis: usize, range: impl Into<AxisRange>) -> Result<bool> {
        let range = range.into();
        if !self.fit_range(axis, range)? {
            return Ok(false);
        }
        let clamped = range.clamp(self.point[axis]);
        if clamped != self.point[axis] {
            self.point[axis] = clamped;
            self.events.axis.emit(axis);
        }
        Ok(true)
    }

    /// Replaces an axis range and leaves the point where it is. Layer dims
    /// use this: their point follows the viewer, not their own extent.
    pub(crate) fn fit_range(&mut self, axis: usize, range: AxisRange) -> Result<bool> {
        self.assert_axis_in_bounds(axis)?;
        range.validate(axis)?;
        if self.range[axis] == range {
            return Ok(false);
        }
        self.range[axis] = range;
        self.events.range.emit(axis);
        Ok(true)
    }

    pub fn set_point(&mut self, axis: usize, value: f64) -> Result<bool> {
        self.assert_axis_in_bounds(axis)?;
        let value = if value.is_finite() {
            self.range[axis].clamp(value)
        } else {
            value
        };
        self.follow_point(axis, value)
    }

    /// Stores a point without clamping it into the axis range, so a layer
    /// slices where the viewer is even outside the layer's own data.
    pub(crate) fn follow_point(&mut self, axis: usize, value: f64) -> Result<bool> {
        self.assert_axis_in_bounds(axis)?;
        if !value.is_finite() {
            return Err(ViewerError::InvalidArgument(format!(
                "point on axis {axis} must be finite, got {value}"
            )));
        }
        if self.point[axis] == value {
            return Ok(false);
        }
        self.point[axis] = value;
        self.events.axis.emit(axis);
        Ok(true)
    }

    pub fn set_order(&mut self, order: Vec<usize>) -> Result<bool> {
        let ndim = self.ndim();
        let mut seen = vec![false; ndim];
        let is_permutation = order.len() == ndim
            && order.iter().all(|axis| {
                *axis < ndim && !std::mem::replace(&mut seen[*axis], true)
            });
        if !is_permutation {
            return Err(ViewerError::InvalidOrder { order, ndim });
        }
        if self.order == order {
            return Ok(false);
        }
        self.order = order;
        self.events.order.emit(self.order.clone());
        Ok(true)
    }

    pub fn set_ndisplay(&mut self, ndisplay: usize) -> Result<bool> {
        if !matches!(ndisplay, 2 | 3) {
            return Err(ViewerError::InvalidNdisplay(ndisplay));
        }
        if self.ndisplay == ndisplay {
            return Ok(false);
        }
        self.ndisplay = ndisplay;
        self.events.ndisplay.emit(ndisplay);
        self.events.camera.emit(());
        Ok(true)
    }

    fn assert_axis_in_bounds(&self, axis: usize) -> Result<()> {
        if axis < self.ndim() {
            Ok(())
        } else {
            Err(ViewerError::AxisOutOfBounds {
                axis,
                ndim: self.ndim(),
            })
        }
    }
}

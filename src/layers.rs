mod base;
mod image;
mod labels;
mod list;
mod points;
mod raster;
mod shapes;
mod style;
mod thumbnail;
mod vectors;
mod xml;

#[cfg(test)]
mod tests;

use std::any::Any;
use std::fmt;

use log::{trace, warn};
use serde::Serialize;

pub use base::{Blending, Cursor, LayerBase, LayerEvents, LayerId, LayerOptions};
pub use image::{Image, ImageEvents, ImageOptions, Interpolation, Rendering};
pub use labels::{Labels, LabelsEvents, LabelsMode, LabelsOptions};
pub use list::{LayerList, LayerListEvents};
pub use points::{PointSize, Points, PointsEvents, PointsMode, PointsOptions, Symbol};
pub use shapes::{Shape, ShapeType, Shapes, ShapesOptions};
pub use style::PerItem;
pub use thumbnail::THUMBNAIL_SHAPE;
pub use vectors::{Vectors, VectorsOptions};
pub use xml::XmlElement;

use crate::dims::AxisRange;
use crate::error::Result;
use crate::interaction::{MouseEvent, MouseEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Image,
    Labels,
    Points,
    Shapes,
    Vectors,
}

impl LayerKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Labels => "labels",
            Self::Points => "points",
            Self::Shapes => "shapes",
            Self::Vectors => "vectors",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// What lies under the cursor in a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerValue {
    Scalar(f32),
    Channels(Vec<f32>),
    Label(u32),
    /// Index of a point, shape or vector in the layer data.
    Item(usize),
}

impl fmt::Display for LayerValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(formatter, "{value:.3}"),
            Self::Channels(values) => {
                let parts = values
                    .iter()
                    .map(|value| format!("{value:.3}"))
                    .collect::<Vec<_>>();
                write!(formatter, "[{}]", parts.join(", "))
            }
            Self::Label(label) => write!(formatter, "{label}"),
            Self::Item(index) => write!(formatter, "{index}"),
        }
    }
}

/// Capabilities shared by every layer kind. The viewer holds layers as
/// `Box<dyn Layer>` and drives them only through this trait.
pub trait Layer: Any + fmt::Debug {
    fn base(&self) -> &LayerBase;

    fn base_mut(&mut self) -> &mut LayerBase;

    fn kind(&self) -> LayerKind;

    /// Rank implied by the current data.
    fn data_ndim(&self) -> usize;

    /// `(min, max)` of the data along each layer axis.
    fn extent(&self) -> Vec<(f64, f64)>;

    /// Recomputes the displayed slice from the layer dims.
    fn set_view_slice(&mut self);

    fn update_thumbnail(&mut self);

    /// Value at the current cursor coordinates, if any.
    fn get_value(&self) -> Option<LayerValue>;

    /// SVG elements for the current slice.
    fn to_xml_list(&self) -> Result<Vec<XmlElement>>;

    fn on_mouse_press(&mut self, _event: &MouseEvent) -> Result<()> {
        Ok(())
    }

    fn on_mouse_move(&mut self, _event: &MouseEvent) -> Result<()> {
        Ok(())
    }

    fn on_mouse_release(&mut self, _event: &MouseEvent) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn ndim(&self) -> usize {
        self.base().dims().ndim()
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    /// Slider ranges; degenerate or non-finite extents fall back to `(0, 1)`.
    fn range(&self) -> Vec<AxisRange> {
        self.extent()
            .into_iter()
            .map(|(min, max)| {
                if min.is_finite() && max.is_finite() && min <= max {
                    AxisRange::new(min, max, 1.0)
                } else {
                    AxisRange::new(0.0, 1.0, 1.0)
                }
            })
            .collect()
    }

    /// Bounding box of the data as `(min corner, max corner)`.
    fn bounding_box(&self) -> (Vec<f64>, Vec<f64>) {
        self.range().iter().map(|range| (range.min, range.max)).unzip()
    }

    /// Re-slices and re-renders, or records a pending refresh while blocked.
    fn refresh(&mut self) {
        if self.base().refresh_is_blocked() {
            self.base_mut().defer_refresh();
            return;
        }
        trace!("refreshing layer `{}`", self.name());
        self.set_view_slice();
        self.update_thumbnail();
        self.base().events.set_data.emit(());
    }

    /// Resizes the layer dims to the data and refreshes.
    fn update_dims(&mut self) {
        let ndim = self.data_ndim();
        let ranges = self.range();
        let base = self.base_mut();
        base.fit_rank(ndim);
        base.dims_mut().set_ndim(ndim);
        for (axis, range) in ranges.into_iter().enumerate() {
            if let Err(error) = base.dims_mut().fit_range(axis, range) {
                warn!("layer `{}`: {error}", base.name());
            }
        }
        self.refresh();
    }

    /// Applies a viewer-derived order, ndisplay and point in one step and
    /// refreshes at most once. `None` leaves that axis point as it is. The
    /// point is taken as given, even outside the layer's own range.
    fn sync_dims(
        &mut self,
        order: Vec<usize>,
        ndisplay: usize,
        point: &[Option<f64>],
    ) -> Result<bool> {
        let dims = self.base_mut().dims_mut();
        let mut changed = dims.set_order(order)?;
        changed |= dims.set_ndisplay(ndisplay)?;
        for (axis, value) in point.iter().enumerate() {
            if let Some(value) = value {
                changed |= dims.follow_point(axis, *value)?;
            }
        }
        if changed {
            self.refresh();
        }
        Ok(changed)
    }

    fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        if self.base_mut().set_opacity(opacity)? {
            self.update_thumbnail();
        }
        Ok(())
    }

    /// Moves the cursor and updates the status line.
    fn set_coordinates(&mut self, coordinates: &[f64]) -> Result<()> {
        self.base_mut().set_coordinates(coordinates)?;
        let message = self.get_message();
        self.base_mut().set_status(message);
        Ok(())
    }

    /// Status text: layer name, rounded cursor coordinates and the value
    /// under the cursor.
    fn get_message(&self) -> String {
        let coordinates = self
            .base()
            .coordinates()
            .iter()
            .map(|value| format!("{}", value.round() as i64))
            .collect::<Vec<_>>()
            .join(", ");
        match self.get_value() {
            Some(value) => format!("{} [{coordinates}], {value}", self.name()),
            None => format!("{} [{coordinates}]", self.name()),
        }
    }

    /// Sets the cursor from `event` and routes it to the matching handler.
    fn handle_mouse(&mut self, event: &MouseEvent) -> Result<()> {
        self.set_coordinates(&event.coordinate)?;
        match event.kind {
            MouseEventKind::Press => self.on_mouse_press(event),
            MouseEventKind::Move => self.on_mouse_move(event),
            MouseEventKind::Release => self.on_mouse_release(event),
        }
    }
}

/// Runs `edit` with refreshes suppressed; a single refresh follows if any
/// were requested in between. Nested calls refresh once, at the outermost.
pub fn with_refresh_blocked<L, R>(layer: &mut L, edit: impl FnOnce(&mut L) -> R) -> R
where
    L: Layer + ?Sized,
{
    layer.base_mut().block_refresh();
    let result = edit(layer);
    if layer.base_mut().unblock_refresh() {
        layer.refresh();
    }
    result
}

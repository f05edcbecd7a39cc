use std::any::Any;

use ndarray::{Array2, Array3, ArrayD, Axis};
use serde::{Deserialize, Serialize};

use super::base::{LayerBase, LayerOptions};
use super::thumbnail::ThumbnailCanvas;
use super::xml::XmlElement;
use super::{Layer, LayerKind, LayerValue};
use crate::colormaps::{Rgba, deserialize_rgba, to_hex};
use crate::dims::AxisIndex;
use crate::error::{Result, ViewerError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorsOptions {
    #[serde(flatten)]
    pub layer: LayerOptions,
    pub edge_width: f64,
    #[serde(deserialize_with = "deserialize_rgba")]
    pub edge_color: Rgba,
    /// Multiplier applied to every projection.
    pub length: f64,
}

impl Default for VectorsOptions {
    fn default() -> Self {
        Self {
            layer: LayerOptions::default(),
            edge_width: 1.0,
            edge_color: [1.0, 0.0, 0.0, 1.0],
            length: 1.0,
        }
    }
}

/// Line segments stored as `(N, 2, D)`: a start position and a projection
/// per vector.
#[derive(Debug)]
pub struct Vectors {
    base: LayerBase,
    data: Array3<f64>,
    edge_width: f64,
    edge_color: Rgba,
    length: f64,
    indices_view: Vec<usize>,
    /// `(start, end)` of each vector on the slice, in displayed axes.
    data_view: Array3<f64>,
}

impl Vectors {
    pub fn new(data: Array3<f64>, options: VectorsOptions) -> Result<Self> {
        let (_, pair, ndim) = data.dim();
        if pair != 2 || ndim < 2 {
            return Err(ViewerError::ShapeMismatch(format!(
                "vector data must be (N, 2, D) with D >= 2, got {:?}",
                data.shape()
            )));
        }
        validate_length(options.length)?;
        let mut layer = Self {
            base: LayerBase::new(ndim, "Vectors", 0.7, options.layer)?,
            data,
            edge_width: options.edge_width,
            edge_color: options.edge_color,
            length: options.length,
            indices_view: Vec::new(),
            data_view: Array3::zeros((0, 2, 2)),
        };
        layer.update_dims();
        Ok(layer)
    }

    /// Builds from image-like data `(N1, ..., Nd, d)`: every grid position
    /// holds the projection of a vector starting there.
    pub fn from_image(field: ArrayD<f64>, options: VectorsOptions) -> Result<Self> {
        let shape = field.shape().to_vec();
        let Some((&components, grid)) = shape.split_last() else {
            return Err(ViewerError::ShapeMismatch(
                "image-like vector data cannot be zero-dimensional".to_string(),
            ));
        };
        if components != grid.len() {
            return Err(ViewerError::ShapeMismatch(format!(
                "image-like vector data of shape {shape:?} needs a trailing axis of {}",
                grid.len()
            )));
        }
        let count = grid.iter().product::<usize>();
        let mut data = Array3::zeros((count, 2, components));
        let projections = field
            .to_shape((count, components))
            .map_err(|error| ViewerError::ShapeMismatch(error.to_string()))?;
        for (row, mut vector) in data.axis_iter_mut(Axis(0)).enumerate() {
            let mut remainder = row;
            for axis in (0..components).rev() {
                vector[[0, axis]] = (remainder % grid[axis]) as f64;
                remainder /= grid[axis];
            }
            vector.row_mut(1).assign(&projections.row(row));
        }
        Self::new(data, options)
    }

    /// Builds from `[start, projection]` pairs of equal rank.
    pub fn from_pairs(pairs: &[[Vec<f64>; 2]], options: VectorsOptions) -> Result<Self> {
        let ndim = pairs.first().map_or(2, |[start, _]| start.len());
        let mut rows = Array2::zeros((pairs.len() * 2, ndim));
        for (index, [start, projection]) in pairs.iter().enumerate() {
            if start.len() != ndim || projection.len() != ndim {
                return Err(ViewerError::ShapeMismatch(format!(
                    "vector {index} does not have {ndim} coordinates"
                )));
            }
            for axis in 0..ndim {
                rows[[index * 2, axis]] = start[axis];
                rows[[index * 2 + 1, axis]] = projection[axis];
            }
        }
        let data = rows
            .into_shape_with_order((pairs.len(), 2, ndim))
            .map_err(|error| ViewerError::ShapeMismatch(error.to_string()))?;
        Self::new(data, options)
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn indices_view(&self) -> &[usize] {
        &self.indices_view
    }

    pub fn data_view(&self) -> &Array3<f64> {
        &self.data_view
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn set_length(&mut self, length: f64) -> Result<()> {
        validate_length(length)?;
        self.length = length;
        self.update_dims();
        Ok(())
    }

    pub fn edge_width(&self) -> f64 {
        self.edge_width
    }

    pub fn edge_color(&self) -> Rgba {
        self.edge_color
    }

    pub fn set_edge_color(&mut self, color: Rgba) {
        self.edge_color = color;
        self.update_thumbnail();
    }

    /// Last two columns of the displayed view, as (row, col) segments.
    fn plane_segments(&self) -> Vec<([f64; 2], [f64; 2])> {
        let columns = self.data_view.len_of(Axis(2));
        if columns < 2 {
            return Vec::new();
        }
        self.data_view
            .outer_iter()
            .map(|segment| {
                (
                    [segment[[0, columns - 2]], segment[[0, columns - 1]]],
                    [segment[[1, columns - 2]], segment[[1, columns - 1]]],
                )
            })
            .collect()
    }
}

impl Layer for Vectors {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Vectors
    }

    fn data_ndim(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Spans both ends of every vector at the current length.
    fn extent(&self) -> Vec<(f64, f64)> {
        if self.is_empty() {
            return vec![(0.0, 1.0); self.data_ndim()];
        }
        (0..self.data_ndim())
            .map(|axis| {
                self.data.outer_iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(min, max), vector| {
                        let start = vector[[0, axis]];
                        let end = start + self.length * vector[[1, axis]];
                        (min.min(start.min(end)), max.max(start.max(end)))
                    },
                )
            })
            .collect()
    }

    fn set_view_slice(&mut self) {
        let dims = self.base.dims();
        let indices = dims.indices();
        let not_displayed = dims.not_displayed().to_vec();
        let displayed = dims.displayed().to_vec();
        let kept = self
            .data
            .outer_iter()
            .enumerate()
            .filter(|(_, vector)| {
                not_displayed.iter().all(|axis| match indices[*axis] {
                    AxisIndex::At(position) => vector[[0, *axis]].round() == position as f64,
                    AxisIndex::All => true,
                })
            })
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        let mut view = Array3::zeros((kept.len(), 2, displayed.len()));
        for (position, index) in kept.iter().enumerate() {
            for (column, axis) in displayed.iter().enumerate() {
                let start = self.data[[*index, 0, *axis]];
                view[[position, 0, column]] = start;
                view[[position, 1, column]] = start + self.length * self.data[[*index, 1, *axis]];
            }
        }
        self.indices_view = kept;
        self.data_view = view;
    }

    fn update_thumbnail(&mut self) {
        let segments = self.plane_segments();
        let (min, max) = segments.iter().fold(
            ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
            |(min, max), (start, end)| {
                (
                    [min[0].min(start[0]).min(end[0]), min[1].min(start[1]).min(end[1])],
                    [max[0].max(start[0]).max(end[0]), max[1].max(start[1]).max(end[1])],
                )
            },
        );
        let mut canvas = if segments.is_empty() {
            ThumbnailCanvas::fit([0.0, 0.0], [1.0, 1.0])
        } else {
            ThumbnailCanvas::fit(min, max)
        };
        for (start, end) in &segments {
            canvas.line(*start, *end, self.edge_color);
        }
        let thumbnail = canvas.finish(self.base.opacity());
        self.base.set_thumbnail(thumbnail);
    }

    fn get_value(&self) -> Option<LayerValue> {
        None
    }

    fn to_xml_list(&self) -> Result<Vec<XmlElement>> {
        Ok(self
            .plane_segments()
            .into_iter()
            .map(|(start, end)| {
                XmlElement::new("line")
                    .attr("x1", start[1])
                    .attr("y1", start[0])
                    .attr("x2", end[1])
                    .attr("y2", end[0])
                    .attr("stroke", to_hex(self.edge_color))
                    .attr("stroke-width", self.edge_width)
                    .attr("opacity", self.base.opacity())
            })
            .collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn validate_length(length: f64) -> Result<()> {
    if length.is_finite() && length >= 0.0 {
        Ok(())
    } else {
        Err(ViewerError::InvalidArgument(format!(
            "vector length must be a non-negative number, got {length}"
        )))
    }
}

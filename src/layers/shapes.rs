use std::any::Any;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::base::{LayerBase, LayerOptions};
use super::style::{PerItem, deserialize_rgba_items};
use super::thumbnail::ThumbnailCanvas;
use super::xml::XmlElement;
use super::{Layer, LayerKind, LayerValue};
use crate::colormaps::{Rgba, to_hex};
use crate::dims::AxisIndex;
use crate::error::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Line,
    #[default]
    Rectangle,
    Ellipse,
    Path,
    Polygon,
}

impl ShapeType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Path => "path",
            Self::Polygon => "polygon",
        }
    }

    const fn closed(self) -> bool {
        matches!(self, Self::Rectangle | Self::Ellipse | Self::Polygon)
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl FromStr for ShapeType {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "rectangle" => Ok(Self::Rectangle),
            "ellipse" => Ok(Self::Ellipse),
            "path" => Ok(Self::Path),
            "polygon" => Ok(Self::Polygon),
            other => Err(ViewerError::InvalidArgument(format!(
                "unknown shape type `{other}`"
            ))),
        }
    }
}

/// One shape: vertices (one row per vertex) plus its style.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub shape_type: ShapeType,
    pub vertices: Array2<f64>,
    pub edge_width: f64,
    pub edge_color: Rgba,
    pub face_color: Rgba,
    pub z_index: i32,
}

impl Shape {
    /// Validates the vertex count for `shape_type`. Rectangles and ellipses
    /// given as two opposite corners are expanded to four in the last two
    /// axes.
    pub fn new(shape_type: ShapeType, vertices: Array2<f64>) -> Result<Self> {
        let count = vertices.nrows();
        let valid = match shape_type {
            ShapeType::Line => count == 2,
            ShapeType::Rectangle | ShapeType::Ellipse => count == 2 || count == 4,
            ShapeType::Path => count >= 2,
            ShapeType::Polygon => count >= 3,
        };
        if !valid || vertices.ncols() < 2 {
            return Err(ViewerError::ShapeMismatch(format!(
                "a {shape_type} cannot be built from {count} vertices of {} dimensions",
                vertices.ncols()
            )));
        }
        let vertices = if shape_type.closed() && count == 2 {
            expand_corners(&vertices)
        } else {
            vertices
        };
        Ok(Self {
            shape_type,
            vertices,
            edge_width: 1.0,
            edge_color: [0.0, 0.0, 0.0, 1.0],
            face_color: [1.0, 1.0, 1.0, 1.0],
            z_index: 0,
        })
    }

    pub fn ndim(&self) -> usize {
        self.vertices.ncols()
    }

    /// Rounded `(min, max)` of the vertices along `axis`.
    fn slice_key(&self, axis: usize) -> (f64, f64) {
        self.vertices
            .column(axis)
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
                (min.min(value.round()), max.max(value.round()))
            })
    }
}

fn expand_corners(corners: &Array2<f64>) -> Array2<f64> {
    let ndim = corners.ncols();
    let (row_axis, col_axis) = (ndim - 2, ndim - 1);
    let (a, b) = (corners.row(0), corners.row(1));
    let mut expanded = Array2::zeros((4, ndim));
    for (index, mut vertex) in expanded.axis_iter_mut(Axis(0)).enumerate() {
        vertex.assign(&a);
        let (row_from, col_from) = match index {
            0 => (a, a),
            1 => (a, b),
            2 => (b, b),
            _ => (b, a),
        };
        vertex[row_axis] = row_from[row_axis];
        vertex[col_axis] = col_from[col_axis];
    }
    expanded
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapesOptions {
    #[serde(flatten)]
    pub layer: LayerOptions,
    /// Rank used when no shapes are given.
    pub ndim: Option<usize>,
    pub shape_type: PerItem<ShapeType>,
    pub edge_width: PerItem<f64>,
    #[serde(deserialize_with = "deserialize_rgba_items")]
    pub edge_color: PerItem<Rgba>,
    #[serde(deserialize_with = "deserialize_rgba_items")]
    pub face_color: PerItem<Rgba>,
    pub z_index: PerItem<i32>,
}

impl Default for ShapesOptions {
    fn default() -> Self {
        Self {
            layer: LayerOptions::default(),
            ndim: None,
            shape_type: PerItem::All(ShapeType::Rectangle),
            edge_width: PerItem::All(1.0),
            edge_color: PerItem::All([0.0, 0.0, 0.0, 1.0]),
            face_color: PerItem::All([1.0, 1.0, 1.0, 1.0]),
            z_index: PerItem::All(0),
        }
    }
}

/// Vector shapes drawn in z-index order.
#[derive(Debug)]
pub struct Shapes {
    base: LayerBase,
    shapes: Vec<Shape>,
    ndim: usize,
    indices_view: Vec<usize>,
}

impl Shapes {
    pub fn new(data: Vec<Array2<f64>>, options: ShapesOptions) -> Result<Self> {
        let count = data.len();
        let shape_types = options.shape_type.resolve(count, "shape_type")?;
        let edge_widths = options.edge_width.resolve(count, "edge_width")?;
        let edge_colors = options.edge_color.resolve(count, "edge_color")?;
        let face_colors = options.face_color.resolve(count, "face_color")?;
        let z_indices = options.z_index.resolve(count, "z_index")?;

        let ndim = match data.first() {
            Some(first) => first.ncols(),
            None => options.ndim.unwrap_or(2),
        };
        let mut shapes = Vec::with_capacity(count);
        for (index, vertices) in data.into_iter().enumerate() {
            if vertices.ncols() != ndim {
                return Err(ViewerError::ShapeMismatch(format!(
                    "shape {index} has {} dimensions, expected {ndim}",
                    vertices.ncols()
                )));
            }
            let mut shape = Shape::new(shape_types[index], vertices)?;
            shape.edge_width = edge_widths[index];
            shape.edge_color = edge_colors[index];
            shape.face_color = face_colors[index];
            shape.z_index = z_indices[index];
            shapes.push(shape);
        }

        let mut layer = Self {
            base: LayerBase::new(ndim, "Shapes", 0.7, options.layer)?,
            shapes,
            ndim,
            indices_view: Vec::new(),
        };
        layer.update_dims();
        Ok(layer)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Indices of shapes on the current slice, back to front.
    pub fn indices_view(&self) -> &[usize] {
        &self.indices_view
    }

    pub fn add(&mut self, shape: Shape) -> Result<usize> {
        if shape.ndim() != self.ndim {
            return Err(ViewerError::ShapeMismatch(format!(
                "shape has {} dimensions but the layer has {}",
                shape.ndim(),
                self.ndim
            )));
        }
        self.shapes.push(shape);
        self.base.events.data.emit(());
        self.update_dims();
        Ok(self.shapes.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Result<Shape> {
        if index >= self.shapes.len() {
            return Err(ViewerError::InvalidArgument(format!(
                "shape index {index} is out of range for {} shapes",
                self.shapes.len()
            )));
        }
        let shape = self.shapes.remove(index);
        self.base.events.data.emit(());
        self.update_dims();
        Ok(shape)
    }

    pub fn set_z_index(&mut self, index: usize, z_index: i32) -> Result<()> {
        let shape = self.shapes.get_mut(index).ok_or_else(|| {
            ViewerError::InvalidArgument(format!("no shape at index {index}"))
        })?;
        shape.z_index = z_index;
        self.refresh();
        Ok(())
    }

    /// Displayed (row, column) vertices of a shape, from the last two
    /// displayed axes.
    fn plane_vertices(&self, shape: &Shape) -> Vec<[f64; 2]> {
        let displayed = self.base.dims().displayed();
        let plane = &displayed[displayed.len().saturating_sub(2)..];
        let (row_axis, col_axis) = match plane {
            [row, col] => (*row, *col),
            _ => (0, 0),
        };
        shape
            .vertices
            .outer_iter()
            .map(|vertex| [vertex[row_axis], vertex[col_axis]])
            .collect()
    }

    fn shape_element(&self, shape: &Shape) -> XmlElement {
        let vertices = self.plane_vertices(shape);
        let points = vertices
            .iter()
            .map(|[y, x]| format!("{x},{y}"))
            .collect::<Vec<_>>()
            .join(" ");
        let element = match shape.shape_type {
            ShapeType::Line => XmlElement::new("line")
                .attr("x1", vertices[0][1])
                .attr("y1", vertices[0][0])
                .attr("x2", vertices[1][1])
                .attr("y2", vertices[1][0]),
            ShapeType::Ellipse => {
                let (min, max) = plane_bounds(&vertices);
                XmlElement::new("ellipse")
                    .attr("cx", (min[1] + max[1]) / 2.0)
                    .attr("cy", (min[0] + max[0]) / 2.0)
                    .attr("rx", (max[1] - min[1]) / 2.0)
                    .attr("ry", (max[0] - min[0]) / 2.0)
            }
            ShapeType::Path => XmlElement::new("polyline")
                .attr("points", points)
                .attr("fill", "none"),
            ShapeType::Rectangle | ShapeType::Polygon => {
                XmlElement::new("polygon").attr("points", points)
            }
        };
        let element = if shape.shape_type.closed() {
            element.attr("fill", to_hex(shape.face_color))
        } else {
            element
        };
        element
            .attr("stroke", to_hex(shape.edge_color))
            .attr("stroke-width", shape.edge_width)
            .attr("opacity", self.base.opacity())
    }
}

fn plane_bounds(vertices: &[[f64; 2]]) -> ([f64; 2], [f64; 2]) {
    vertices.iter().fold(
        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
        |(min, max), [row, col]| {
            (
                [min[0].min(*row), min[1].min(*col)],
                [max[0].max(*row), max[1].max(*col)],
            )
        },
    )
}

impl Layer for Shapes {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Shapes
    }

    fn data_ndim(&self) -> usize {
        self.ndim
    }

    fn extent(&self) -> Vec<(f64, f64)> {
        if self.shapes.is_empty() {
            return vec![(0.0, 1.0); self.ndim];
        }
        (0..self.ndim)
            .map(|axis| {
                self.shapes.iter().flat_map(|shape| shape.vertices.column(axis).to_vec()).fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(min, max), value| (min.min(value), max.max(value)),
                )
            })
            .collect()
    }

    /// A shape is on the slice when every hidden-axis index lies within the
    /// rounded span of its vertices on that axis.
    fn set_view_slice(&mut self) {
        let dims = self.base.dims();
        let indices = dims.indices();
        let not_displayed = dims.not_displayed().to_vec();
        let mut visible = self
            .shapes
            .iter()
            .enumerate()
            .filter(|(_, shape)| {
                not_displayed.iter().all(|axis| {
                    let AxisIndex::At(position) = indices[*axis] else {
                        return true;
                    };
                    let (min, max) = shape.slice_key(*axis);
                    min <= position as f64 && position as f64 <= max
                })
            })
            .map(|(index, shape)| (shape.z_index, index))
            .collect::<Vec<_>>();
        visible.sort();
        self.indices_view = visible.into_iter().map(|(_, index)| index).collect();
    }

    fn update_thumbnail(&mut self) {
        let displayed = self.base.dims().displayed();
        let plane = &displayed[displayed.len().saturating_sub(2)..];
        let (min, max) = self.bounding_box();
        let mut canvas = match plane {
            [row, col] => ThumbnailCanvas::fit([min[*row], min[*col]], [max[*row], max[*col]]),
            _ => ThumbnailCanvas::fit([0.0, 0.0], [1.0, 1.0]),
        };
        for index in &self.indices_view {
            let shape = &self.shapes[*index];
            let vertices = self.plane_vertices(shape);
            for pair in vertices.windows(2) {
                canvas.line(pair[0], pair[1], shape.edge_color);
            }
            if shape.shape_type.closed() {
                if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
                    canvas.line(*last, *first, shape.edge_color);
                }
            }
        }
        let thumbnail = canvas.finish(self.base.opacity());
        self.base.set_thumbnail(thumbnail);
    }

    /// Frontmost shape whose displayed bounding box holds the cursor.
    fn get_value(&self) -> Option<LayerValue> {
        let displayed = self.base.dims().displayed();
        let plane = &displayed[displayed.len().saturating_sub(2)..];
        let coordinates = self.base.coordinates();
        let [row, col] = match plane {
            [row, col] => [*coordinates.get(*row)?, *coordinates.get(*col)?],
            _ => return None,
        };
        self.indices_view
            .iter()
            .rev()
            .find(|index| {
                let (min, max) = plane_bounds(&self.plane_vertices(&self.shapes[**index]));
                min[0] <= row && row <= max[0] && min[1] <= col && col <= max[1]
            })
            .map(|index| LayerValue::Item(*index))
    }

    fn to_xml_list(&self) -> Result<Vec<XmlElement>> {
        Ok(self
            .indices_view
            .iter()
            .map(|index| self.shape_element(&self.shapes[*index]))
            .collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

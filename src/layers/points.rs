use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Axis, s};
use serde::{Deserialize, Serialize};

use super::base::{Cursor, LayerBase, LayerOptions};
use super::thumbnail::ThumbnailCanvas;
use super::xml::XmlElement;
use super::{Layer, LayerKind, LayerValue};
use crate::colormaps::{Rgba, deserialize_rgba, to_hex};
use crate::dims::AxisIndex;
use crate::error::{Result, ViewerError};
use crate::events::EventEmitter;
use crate::interaction::MouseEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsMode {
    #[default]
    PanZoom,
    Add,
    Select,
}

impl PointsMode {
    pub const fn token(self) -> &'static str {
        match self {
            Self::PanZoom => "pan_zoom",
            Self::Add => "add",
            Self::Select => "select",
        }
    }

    const fn help(self) -> &'static str {
        match self {
            Self::PanZoom => "enter add or select mode to edit points",
            Self::Add => "hold <space> to pan/zoom, click to add a point",
            Self::Select => "hold <space> to pan/zoom, click to select a point",
        }
    }
}

impl fmt::Display for PointsMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.token())
    }
}

impl FromStr for PointsMode {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pan_zoom" => Ok(Self::PanZoom),
            "add" => Ok(Self::Add),
            "select" => Ok(Self::Select),
            _ => Err(ViewerError::UnknownMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    #[default]
    Disc,
    Square,
    Cross,
    Diamond,
}

/// Point sizes: one value for everything, one per point, or one per point
/// and axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointSize {
    Uniform(f64),
    PerPoint(Vec<f64>),
    PerAxis(Vec<Vec<f64>>),
}

impl Default for PointSize {
    fn default() -> Self {
        Self::Uniform(10.0)
    }
}

impl PointSize {
    fn resolve(&self, count: usize, ndim: usize) -> Result<Array2<f64>> {
        let sizes = match self {
            Self::Uniform(size) => Array2::from_elem((count, ndim), *size),
            Self::PerPoint(sizes) if sizes.len() == count => {
                Array2::from_shape_fn((count, ndim), |(row, _)| sizes[row])
            }
            Self::PerAxis(rows)
                if rows.len() == count && rows.iter().all(|row| row.len() == ndim) =>
            {
                Array2::from_shape_fn((count, ndim), |(row, col)| rows[row][col])
            }
            _ => {
                return Err(ViewerError::ShapeMismatch(format!(
                    "point sizes do not broadcast to ({count}, {ndim})"
                )));
            }
        };
        if sizes.iter().any(|size| size.is_nan() || *size < 0.0) {
            return Err(ViewerError::InvalidArgument(
                "point sizes must be non-negative".to_string(),
            ));
        }
        Ok(sizes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsOptions {
    #[serde(flatten)]
    pub layer: LayerOptions,
    /// Rank used when no coordinates are given.
    pub ndim: Option<usize>,
    pub size: PointSize,
    pub symbol: Symbol,
    pub edge_width: f64,
    #[serde(deserialize_with = "deserialize_rgba")]
    pub edge_color: Rgba,
    #[serde(deserialize_with = "deserialize_rgba")]
    pub face_color: Rgba,
    pub n_dimensional: bool,
}

impl Default for PointsOptions {
    fn default() -> Self {
        Self {
            layer: LayerOptions::default(),
            ndim: None,
            size: PointSize::default(),
            symbol: Symbol::Disc,
            edge_width: 1.0,
            edge_color: [0.0, 0.0, 0.0, 1.0],
            face_color: [1.0, 1.0, 1.0, 1.0],
            n_dimensional: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointsEvents {
    pub mode: EventEmitter<PointsMode>,
    pub n_dimensional: EventEmitter<bool>,
    pub symbol: EventEmitter<Symbol>,
    pub selected: EventEmitter<Vec<usize>>,
}

/// Coordinate markers, one row of `data` per point.
#[derive(Debug)]
pub struct Points {
    base: LayerBase,
    data: Array2<f64>,
    sizes: Array2<f64>,
    symbol: Symbol,
    edge_width: f64,
    edge_color: Rgba,
    face_color: Rgba,
    n_dimensional: bool,
    mode: PointsMode,
    current_size: f64,
    selected: BTreeSet<usize>,
    indices_view: Vec<usize>,
    data_view: Array2<f64>,
    sizes_view: Vec<f64>,
    pub events: PointsEvents,
}

impl Points {
    pub fn new(data: Array2<f64>, options: PointsOptions) -> Result<Self> {
        let ndim = if data.nrows() == 0 {
            options.ndim.unwrap_or(data.ncols().max(2))
        } else {
            data.ncols()
        };
        if ndim == 0 {
            return Err(ViewerError::ShapeMismatch(
                "points need at least one coordinate axis".to_string(),
            ));
        }
        let data = if data.nrows() == 0 {
            Array2::zeros((0, ndim))
        } else {
            data
        };
        let sizes = options.size.resolve(data.nrows(), ndim)?;
        let current_size = match options.size {
            PointSize::Uniform(size) => size,
            _ => 10.0,
        };
        let mut layer = Self {
            base: LayerBase::new(ndim, "Points", 1.0, options.layer)?,
            data,
            sizes,
            symbol: options.symbol,
            edge_width: options.edge_width,
            edge_color: options.edge_color,
            face_color: options.face_color,
            n_dimensional: options.n_dimensional,
            mode: PointsMode::PanZoom,
            current_size,
            selected: BTreeSet::new(),
            indices_view: Vec::new(),
            data_view: Array2::zeros((0, 2)),
            sizes_view: Vec::new(),
            events: PointsEvents::default(),
        };
        layer.base.set_status(PointsMode::PanZoom.token());
        layer.base.set_help(PointsMode::PanZoom.help());
        layer.update_dims();
        Ok(layer)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn sizes(&self) -> &Array2<f64> {
        &self.sizes
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Data indices of the points in the current slice.
    pub fn indices_view(&self) -> &[usize] {
        &self.indices_view
    }

    /// Displayed coordinates of the points in the current slice.
    pub fn data_view(&self) -> &Array2<f64> {
        &self.data_view
    }

    /// On-screen diameter of each point in the current slice.
    pub fn sizes_view(&self) -> &[f64] {
        &self.sizes_view
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn set_symbol(&mut self, symbol: Symbol) {
        if symbol != self.symbol {
            self.symbol = symbol;
            self.events.symbol.emit(symbol);
        }
    }

    pub fn face_color(&self) -> Rgba {
        self.face_color
    }

    pub fn set_face_color(&mut self, color: Rgba) {
        self.face_color = color;
        self.update_thumbnail();
    }

    pub fn edge_color(&self) -> Rgba {
        self.edge_color
    }

    pub fn set_edge_color(&mut self, color: Rgba) {
        self.edge_color = color;
    }

    pub fn edge_width(&self) -> f64 {
        self.edge_width
    }

    pub fn n_dimensional(&self) -> bool {
        self.n_dimensional
    }

    pub fn set_n_dimensional(&mut self, n_dimensional: bool) {
        if n_dimensional != self.n_dimensional {
            self.n_dimensional = n_dimensional;
            self.events.n_dimensional.emit(n_dimensional);
            self.refresh();
        }
    }

    pub fn mode(&self) -> PointsMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PointsMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        let cursor = match mode {
            PointsMode::PanZoom => Cursor::Standard,
            PointsMode::Add => Cursor::Cross,
            PointsMode::Select => Cursor::Pointing,
        };
        self.base.set_cursor(cursor);
        self.base.set_interactive(mode == PointsMode::PanZoom);
        self.base.set_help(mode.help());
        self.base.set_status(mode.token());
        if mode != PointsMode::Select {
            self.set_selected(BTreeSet::new());
        }
        self.events.mode.emit(mode);
        self.base.events.mode.emit(mode.token().to_string());
    }

    pub fn selected(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn set_selected(&mut self, selected: BTreeSet<usize>) {
        let selected = selected
            .into_iter()
            .filter(|index| *index < self.data.nrows())
            .collect::<BTreeSet<_>>();
        if selected != self.selected {
            self.selected = selected;
            self.events.selected.emit(self.selected());
        }
    }

    /// Appends a point with the current default size.
    pub fn add(&mut self, coord: &[f64]) -> Result<usize> {
        if coord.len() != self.data.ncols() {
            return Err(ViewerError::ShapeMismatch(format!(
                "point has {} coordinates but the layer has {} dimensions",
                coord.len(),
                self.data.ncols()
            )));
        }
        let ndim = self.data.ncols();
        self.data
            .push_row(Array1::from(coord.to_vec()).view())
            .map_err(|error| ViewerError::ShapeMismatch(error.to_string()))?;
        self.sizes
            .push_row(Array1::from_elem(ndim, self.current_size).view())
            .map_err(|error| ViewerError::ShapeMismatch(error.to_string()))?;
        self.base.events.data.emit(());
        self.update_dims();
        Ok(self.data.nrows() - 1)
    }

    /// Removes the selected points and clears the selection.
    pub fn remove_selected(&mut self) -> usize {
        if self.selected.is_empty() {
            return 0;
        }
        let keep = (0..self.data.nrows())
            .filter(|index| !self.selected.contains(index))
            .collect::<Vec<_>>();
        let removed = self.data.nrows() - keep.len();
        self.data = self.data.select(Axis(0), &keep);
        self.sizes = self.sizes.select(Axis(0), &keep);
        self.set_selected(BTreeSet::new());
        self.base.events.data.emit(());
        self.update_dims();
        removed
    }

    /// Topmost displayed point whose disc covers the cursor.
    fn point_under_cursor(&self) -> Option<usize> {
        let displayed = self.base.dims().displayed();
        let coordinates = self.base.coordinates();
        let cursor = displayed
            .iter()
            .map(|axis| coordinates.get(*axis).copied())
            .collect::<Option<Vec<_>>>()?;
        self.data_view
            .outer_iter()
            .zip(&self.sizes_view)
            .zip(&self.indices_view)
            .filter(|((position, size), _)| {
                let distance = position
                    .iter()
                    .zip(&cursor)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt();
                distance <= **size / 2.0
            })
            .map(|(_, index)| *index)
            .last()
    }
}

impl Layer for Points {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Points
    }

    fn data_ndim(&self) -> usize {
        self.data.ncols()
    }

    fn extent(&self) -> Vec<(f64, f64)> {
        if self.data.nrows() == 0 {
            return vec![(0.0, 1.0); self.data.ncols()];
        }
        self.data
            .axis_iter(Axis(1))
            .map(|column| {
                column.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
                    (min.min(*value), max.max(*value))
                })
            })
            .collect()
    }

    /// Keeps points on the current slice. In n-dimensional mode a point
    /// within half its size of the slice on every hidden axis is kept and
    /// drawn smaller the further away it lies.
    fn set_view_slice(&mut self) {
        let dims = self.base.dims();
        let displayed = dims.displayed().to_vec();
        let not_displayed = dims.not_displayed().to_vec();
        let indices = dims.indices();
        let slice_at = |axis: usize| match indices[axis] {
            AxisIndex::At(position) => position as f64,
            AxisIndex::All => 0.0,
        };

        let mut kept = Vec::new();
        let mut scales = Vec::new();
        for (row, (point, size)) in self
            .data
            .outer_iter()
            .zip(self.sizes.outer_iter())
            .enumerate()
        {
            if not_displayed.is_empty() {
                kept.push(row);
                scales.push(1.0);
            } else if self.n_dimensional && self.data.ncols() > 2 {
                let mut scale = 1.0_f64;
                let mut inside = true;
                for axis in &not_displayed {
                    let distance = (point[*axis] - slice_at(*axis)).abs();
                    let radius = size[*axis] / 2.0;
                    if distance > radius {
                        inside = false;
                        break;
                    }
                    if radius > 0.0 {
                        scale = scale.min(1.0 - distance / radius);
                    }
                }
                if inside {
                    kept.push(row);
                    scales.push(scale.max(0.0));
                }
            } else if not_displayed
                .iter()
                .all(|axis| point[*axis].round() == slice_at(*axis))
            {
                kept.push(row);
                scales.push(1.0);
            }
        }

        let mut data_view = Array2::zeros((kept.len(), displayed.len()));
        let mut sizes_view = Vec::with_capacity(kept.len());
        for (position, (row, scale)) in kept.iter().zip(&scales).enumerate() {
            for (column, axis) in displayed.iter().enumerate() {
                data_view[[position, column]] = self.data[[*row, *axis]];
            }
            let mean_size = displayed
                .iter()
                .map(|axis| self.sizes[[*row, *axis]])
                .sum::<f64>()
                / displayed.len().max(1) as f64;
            sizes_view.push(mean_size * scale);
        }
        self.indices_view = kept;
        self.data_view = data_view;
        self.sizes_view = sizes_view;
    }

    fn update_thumbnail(&mut self) {
        let (min, max) = self.bounding_box();
        let displayed = self.base.dims().displayed();
        let plane = &displayed[displayed.len().saturating_sub(2)..];
        let opacity = self.base.opacity();
        let thumbnail = if plane.len() == 2 {
            let mut canvas = ThumbnailCanvas::fit(
                [min[plane[0]], min[plane[1]]],
                [max[plane[0]], max[plane[1]]],
            );
            let offset = self.data_view.ncols() - 2;
            for position in self.data_view.outer_iter() {
                canvas.plot([position[offset], position[offset + 1]], self.face_color);
            }
            canvas.finish(opacity)
        } else {
            ThumbnailCanvas::fit([0.0, 0.0], [1.0, 1.0]).finish(opacity)
        };
        self.base.set_thumbnail(thumbnail);
    }

    fn get_value(&self) -> Option<LayerValue> {
        self.point_under_cursor().map(LayerValue::Item)
    }

    /// Circles in (x, y) = (last, second to last displayed axis).
    fn to_xml_list(&self) -> Result<Vec<XmlElement>> {
        let columns = self.data_view.ncols();
        if columns < 2 {
            return Ok(Vec::new());
        }
        let view = self.data_view.slice(s![.., columns - 2..]);
        Ok(view
            .outer_iter()
            .zip(&self.sizes_view)
            .map(|(position, size)| {
                XmlElement::new("circle")
                    .attr("cx", position[1])
                    .attr("cy", position[0])
                    .attr("r", size / 2.0)
                    .attr("stroke", to_hex(self.edge_color))
                    .attr("stroke-width", self.edge_width)
                    .attr("fill", to_hex(self.face_color))
                    .attr("opacity", self.base.opacity())
            })
            .collect())
    }

    fn on_mouse_press(&mut self, event: &MouseEvent) -> Result<()> {
        match self.mode {
            PointsMode::PanZoom => {}
            PointsMode::Add => {
                let coordinates = self.base.coordinates().to_vec();
                self.add(&coordinates)?;
            }
            PointsMode::Select => {
                let hit = self.point_under_cursor();
                let mut selected = if event.modifiers.shift {
                    self.selected.clone()
                } else {
                    BTreeSet::new()
                };
                if let Some(index) = hit {
                    if !selected.remove(&index) {
                        selected.insert(index);
                    }
                }
                self.set_selected(selected);
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

mod edit;
mod mode;


use std::any::Any;
use std::ops::Range;

use log::debug;
use ndarray::{Array2, ArrayD, Axis, Slice};
use serde::{Deserialize, Serialize};

pub use mode::LabelsMode;

use edit::{brush_span, flood_fill, paint_region, replace_all};

use super::base::{LayerBase, LayerOptions};
use super::raster::{pixel_index, png_data_uri, slice_raster};
use super::thumbnail::{colorize, pad_to_thumbnail, project_to_plane, zoom_nearest};
use super::xml::XmlElement;
use super::{Layer, LayerKind, LayerValue, with_refresh_blocked};
use crate::colormaps::{LabelColormap, Rgba};
use crate::error::{Result, ViewerError};
use crate::events::EventEmitter;
use crate::interaction::{MouseEvent, interpolate_coordinates};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsOptions {
    #[serde(flatten)]
    pub layer: LayerOptions,
    pub num_colors: usize,
    pub seed: f64,
    pub n_dimensional: bool,
}

impl Default for LabelsOptions {
    fn default() -> Self {
        let colormap = LabelColormap::default();
        Self {
            layer: LayerOptions::default(),
            num_colors: colormap.num_colors,
            seed: colormap.seed,
            n_dimensional: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelsEvents {
    pub mode: EventEmitter<LabelsMode>,
    pub n_dimensional: EventEmitter<bool>,
    pub contiguous: EventEmitter<bool>,
    pub brush_size: EventEmitter<f64>,
    pub selected_label: EventEmitter<u32>,
    pub colormap: EventEmitter<()>,
}

/// Integer segmentation raster with paint, fill and picker editing.
#[derive(Debug)]
pub struct Labels {
    base: LayerBase,
    data: ArrayD<u32>,
    data_labels: ArrayD<u32>,
    colormap: LabelColormap,
    n_dimensional: bool,
    contiguous: bool,
    brush_size: f64,
    selected_label: u32,
    mode: LabelsMode,
    last_cursor_coord: Option<Vec<f64>>,
    pub events: LabelsEvents,
}

impl Labels {
    pub fn new(data: ArrayD<u32>, options: LabelsOptions) -> Result<Self> {
        validate_shape(data.shape())?;
        let mut base = LayerBase::new(data.ndim(), "Labels", 0.7, options.layer)?;
        let mode = LabelsMode::default();
        base.set_status(mode.token());
        base.set_help(mode.help());
        let mut layer = Self {
            base,
            data,
            data_labels: ArrayD::zeros(vec![1, 1]),
            colormap: LabelColormap::new(options.num_colors, options.seed),
            n_dimensional: options.n_dimensional,
            contiguous: true,
            brush_size: 10.0,
            selected_label: 0,
            mode,
            last_cursor_coord: None,
            events: LabelsEvents::default(),
        };
        layer.update_dims();
        Ok(layer)
    }

    pub fn data(&self) -> &ArrayD<u32> {
        &self.data
    }

    pub fn set_data(&mut self, data: ArrayD<u32>) -> Result<()> {
        validate_shape(data.shape())?;
        self.data = data;
        self.base.events.data.emit(());
        self.update_dims();
        Ok(())
    }

    /// Raw label values of the displayed slice, in displayed axis order.
    pub fn data_labels(&self) -> &ArrayD<u32> {
        &self.data_labels
    }

    pub fn mode(&self) -> LabelsMode {
        self.mode
    }

    /// Switches the editing mode and the cursor, interactivity and help text
    /// that go with it.
    pub fn set_mode(&mut self, mode: LabelsMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        if mode == LabelsMode::Paint {
            let size = self.brush_size / self.base.scale_factor();
            self.base.set_cursor_size(Some(size));
        }
        self.base.set_cursor(mode.cursor());
        self.base.set_interactive(mode.interactive());
        self.base.set_help(mode.help());
        self.base.set_status(mode.token());
        self.events.mode.emit(mode);
        self.base.events.mode.emit(mode.token().to_string());
    }

    /// Parses a mode token such as `"paint"` and applies it.
    pub fn set_mode_str(&mut self, token: &str) -> Result<()> {
        self.set_mode(token.parse()?);
        Ok(())
    }

    pub fn n_dimensional(&self) -> bool {
        self.n_dimensional
    }

    pub fn set_n_dimensional(&mut self, n_dimensional: bool) {
        if n_dimensional != self.n_dimensional {
            self.n_dimensional = n_dimensional;
            self.events.n_dimensional.emit(n_dimensional);
        }
    }

    pub fn contiguous(&self) -> bool {
        self.contiguous
    }

    pub fn set_contiguous(&mut self, contiguous: bool) {
        if contiguous != self.contiguous {
            self.contiguous = contiguous;
            self.events.contiguous.emit(contiguous);
        }
    }

    pub fn brush_size(&self) -> f64 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, brush_size: f64) -> Result<()> {
        if !(brush_size > 0.0 && brush_size.is_finite()) {
            return Err(ViewerError::InvalidArgument(format!(
                "brush size must be positive, got {brush_size}"
            )));
        }
        if brush_size != self.brush_size {
            self.brush_size = brush_size;
            let size = brush_size / self.base.scale_factor();
            self.base.set_cursor_size(Some(size));
            self.events.brush_size.emit(brush_size);
        }
        Ok(())
    }

    pub fn selected_label(&self) -> u32 {
        self.selected_label
    }

    /// Rejects negative labels and leaves the current selection untouched.
    pub fn set_selected_label(&mut self, label: i64) -> Result<()> {
        if label < 0 {
            return Err(ViewerError::NegativeLabel(label));
        }
        let label = u32::try_from(label).map_err(|_| {
            ViewerError::InvalidArgument(format!("label {label} does not fit in 32 bits"))
        })?;
        if label != self.selected_label {
            self.selected_label = label;
            self.events.selected_label.emit(label);
        }
        Ok(())
    }

    /// Colour of the currently selected label, `None` for background.
    pub fn selected_color(&self) -> Option<Rgba> {
        self.get_color(self.selected_label)
    }

    pub fn get_color(&self, label: u32) -> Option<Rgba> {
        self.colormap.color(label)
    }

    pub fn seed(&self) -> f64 {
        self.colormap.seed
    }

    pub fn set_seed(&mut self, seed: f64) {
        self.colormap.seed = seed;
        self.events.colormap.emit(());
        self.refresh();
    }

    pub fn num_colors(&self) -> usize {
        self.colormap.num_colors
    }

    pub fn set_num_colors(&mut self, num_colors: usize) {
        self.colormap = LabelColormap::new(num_colors, self.colormap.seed);
        self.events.colormap.emit(());
        self.refresh();
    }

    /// Moves to a new seed so every label gets a different colour. The next
    /// seed is derived from the current one, so the sequence is repeatable.
    pub fn new_colormap(&mut self) {
        let next = (self.colormap.seed + std::f64::consts::FRAC_1_SQRT_2).fract();
        self.set_seed(next);
    }

    /// Label under the cursor in the displayed slice.
    pub fn value_at_cursor(&self) -> Option<u32> {
        let dims = self.base.dims();
        let coordinates = self.base.coordinates();
        let index = dims
            .displayed()
            .iter()
            .enumerate()
            .map(|(position, axis)| {
                pixel_index(*coordinates.get(*axis)?, self.data_labels.len_of(Axis(position)))
            })
            .collect::<Option<Vec<_>>>()?;
        self.data_labels.get(index.as_slice()).copied()
    }

    /// Whether edits reach every axis rather than the displayed slice.
    fn edits_whole_volume(&self) -> bool {
        self.n_dimensional || self.data.ndim() == 2
    }

    /// Stamps `label` into a brush-sized box around `coord`, clipped to the
    /// data. Outside n-dimensional mode the box covers the displayed axes
    /// and is pinned to `coord` on the others.
    pub fn paint(&mut self, coord: &[f64], label: u32) -> Result<()> {
        self.check_coordinate(coord)?;
        let dims = self.base.dims();
        let mut region: Vec<Range<usize>> = Vec::with_capacity(coord.len());
        for (axis, (center, len)) in coord.iter().zip(self.data.shape()).enumerate() {
            if self.edits_whole_volume() || dims.is_displayed(axis) {
                region.push(brush_span(*center, self.brush_size, *len));
            } else {
                match pixel_index(*center, *len) {
                    Some(index) => region.push(index..index + 1),
                    None => return Ok(()),
                }
            }
        }
        let painted = paint_region(self.data.view_mut(), &region, label);
        debug!("painted {painted} cells with label {label} in `{}`", self.base.name());
        self.refresh();
        Ok(())
    }

    /// Replaces `old_label` with `new_label`, limited to the component
    /// containing `coord` when contiguous. The whole volume is in scope in
    /// n-dimensional mode or for 2D data, otherwise only the current slice.
    pub fn fill(&mut self, coord: &[f64], old_label: u32, new_label: u32) -> Result<()> {
        self.check_coordinate(coord)?;
        let whole_volume = self.edits_whole_volume();
        let dims = self.base.dims();
        let shape = self.data.shape().to_vec();
        let pinned = (0..shape.len())
            .map(|axis| {
                if whole_volume || dims.is_displayed(axis) {
                    None
                } else {
                    let point = dims.point()[axis].round();
                    Some(point.clamp(0.0, (shape[axis] - 1) as f64) as usize)
                }
            })
            .collect::<Vec<_>>();
        let seed = coord
            .iter()
            .zip(&shape)
            .zip(&pinned)
            .map(|((value, len), pin)| match pin {
                Some(_) => Some(0),
                None => pixel_index(*value, *len),
            })
            .collect::<Option<Vec<_>>>();

        let scope = self.data.slice_each_axis_mut(|axis| match pinned[axis.axis.index()] {
            Some(index) => Slice::from(index..index + 1),
            None => Slice::from(..),
        });
        let changed = if self.contiguous {
            seed.map_or(0, |seed| flood_fill(scope, &seed, old_label, new_label))
        } else {
            replace_all(scope, old_label, new_label)
        };
        debug!(
            "filled {changed} cells {old_label} -> {new_label} in `{}`",
            self.base.name()
        );
        self.refresh();
        Ok(())
    }

    fn check_coordinate(&self, coord: &[f64]) -> Result<()> {
        if coord.len() == self.data.ndim() {
            Ok(())
        } else {
            Err(ViewerError::ShapeMismatch(format!(
                "coordinate has {} axes but labels data has {}",
                coord.len(),
                self.data.ndim()
            )))
        }
    }

    fn label_plane(&self) -> Array2<u32> {
        project_to_plane(&self.data_labels, 0)
    }
}

impl Layer for Labels {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Labels
    }

    fn data_ndim(&self) -> usize {
        self.data.ndim()
    }

    fn extent(&self) -> Vec<(f64, f64)> {
        self.data.shape().iter().map(|len| (0.0, *len as f64)).collect()
    }

    fn set_view_slice(&mut self) {
        self.data_labels = slice_raster(&self.data, self.base.dims(), 0);
    }

    /// Background is drawn black rather than transparent.
    fn update_thumbnail(&mut self) {
        let zoomed = zoom_nearest(&self.label_plane());
        let colormap = self.colormap;
        let thumbnail = colorize(&zoomed, self.base.opacity(), move |label| {
            let mut rgba = colormap.color(label).unwrap_or([0.0, 0.0, 0.0, 1.0]);
            rgba[3] = 1.0;
            rgba
        });
        self.base.set_thumbnail(pad_to_thumbnail(&thumbnail));
    }

    fn get_value(&self) -> Option<LayerValue> {
        self.value_at_cursor().map(LayerValue::Label)
    }

    fn to_xml_list(&self) -> Result<Vec<XmlElement>> {
        let colormap = self.colormap;
        let rendered = colorize(&self.label_plane(), 1.0, move |label| colormap.rgba(label));
        let (height, width, _) = rendered.dim();
        let href = png_data_uri(&rendered)?;
        Ok(vec![
            XmlElement::new("image")
                .attr("width", width)
                .attr("height", height)
                .attr("opacity", self.base.opacity())
                .attr("xlink:href", href),
        ])
    }

    fn on_mouse_press(&mut self, _event: &MouseEvent) -> Result<()> {
        match self.mode {
            LabelsMode::PanZoom => {}
            LabelsMode::Picker => {
                if let Some(label) = self.value_at_cursor() {
                    self.set_selected_label(i64::from(label))?;
                }
            }
            LabelsMode::Paint => {
                let coordinates = self.base.coordinates().to_vec();
                self.paint(&coordinates, self.selected_label)?;
                self.last_cursor_coord = Some(coordinates);
            }
            LabelsMode::Fill => {
                if let Some(old_label) = self.value_at_cursor() {
                    let coordinates = self.base.coordinates().to_vec();
                    self.fill(&coordinates, old_label, self.selected_label)?;
                }
            }
        }
        Ok(())
    }

    /// Drags in paint mode stroke from the previous cursor sample with a
    /// single refresh per move.
    fn on_mouse_move(&mut self, event: &MouseEvent) -> Result<()> {
        if self.mode != LabelsMode::Paint || !event.is_dragging {
            return Ok(());
        }
        let coordinates = self.base.coordinates().to_vec();
        let stroke = interpolate_coordinates(
            self.last_cursor_coord.as_deref(),
            &coordinates,
            self.brush_size,
        );
        let label = self.selected_label;
        with_refresh_blocked(self, |layer| {
            stroke
                .iter()
                .try_for_each(|coord| layer.paint(coord, label))
        })?;
        self.last_cursor_coord = Some(coordinates);
        Ok(())
    }

    fn on_mouse_release(&mut self, _event: &MouseEvent) -> Result<()> {
        self.last_cursor_coord = None;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn validate_shape(shape: &[usize]) -> Result<()> {
    if shape.len() < 2 || shape.contains(&0) {
        return Err(ViewerError::ShapeMismatch(format!(
            "labels data needs at least two non-empty axes, got shape {shape:?}"
        )));
    }
    Ok(())
}

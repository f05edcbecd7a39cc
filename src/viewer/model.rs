use log::{debug, info};
use ndarray::{Array2, Array3, ArrayD, IxDyn};
use serde::Serialize;

use super::config::ViewerConfig;
use super::reconcile::reconcile_layer;
use crate::dims::{AxisRange, Dims, align_from_trailing, union_ranges_from_trailing};
use crate::error::{Result, ViewerError};
use crate::events::EventEmitter;
use crate::interaction::MouseEvent;
use crate::layers::{
    Cursor, Image, ImageOptions, Labels, LabelsOptions, Layer, LayerId, LayerList,
    Points, PointsOptions, Shapes, ShapesOptions, Vectors, VectorsOptions,
};

const READY: &str = "Ready";

/// Camera placement requested after the displayed space changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "camera", rename_all = "lowercase")]
pub enum ResetView {
    /// 2D: `x, y` is the top left corner of the padded bounding box.
    Viewbox {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// 3D: orbit around the box center.
    Arcball { center: Vec<f64>, scale_factor: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct ViewerEvents {
    pub title: EventEmitter<String>,
    pub status: EventEmitter<String>,
    pub help: EventEmitter<String>,
    pub cursor: EventEmitter<Cursor>,
    pub cursor_size: EventEmitter<Option<f64>>,
    pub interactive: EventEmitter<bool>,
    pub active_layer: EventEmitter<Option<LayerId>>,
    pub reset_view: EventEmitter<ResetView>,
}

/// Global dims, the layer stack and the status fields a front end mirrors.
#[derive(Debug)]
pub struct ViewerModel {
    title: String,
    status: String,
    help: String,
    cursor: Cursor,
    cursor_size: Option<f64>,
    interactive: bool,
    active_layer: Option<LayerId>,
    dims: Dims,
    layers: LayerList,
    pub events: ViewerEvents,
}

impl Default for ViewerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerModel {
    /// Empty 2D viewer over two axes.
    pub fn new() -> Self {
        Self {
            title: ViewerConfig::default().title,
            status: READY.to_string(),
            help: String::new(),
            cursor: Cursor::Standard,
            cursor_size: None,
            interactive: true,
            active_layer: None,
            dims: Dims::new(2),
            layers: LayerList::new(),
            events: ViewerEvents::default(),
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Result<Self> {
        config.validate()?;
        let mut viewer = Self::new();
        viewer.dims.set_ndim(config.ndim());
        viewer.dims.set_ndisplay(config.ndisplay)?;
        if let Some(order) = &config.order {
            viewer.dims.set_order(order.clone())?;
        }
        viewer.title = config.title.clone();
        Ok(viewer)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.title != title {
            self.title = title;
            self.events.title.emit(self.title.clone());
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cursor_size(&self) -> Option<f64> {
        self.cursor_size
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn dims(&self) -> &Dims {
        &self.dims
    }

    pub fn layers(&self) -> &LayerList {
        &self.layers
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.active_layer
    }

    pub fn active_layer_index(&self) -> Option<usize> {
        self.active_layer.and_then(|id| self.layers.index_of(id))
    }

    pub fn layer_as<L: Layer>(&self, index: usize) -> Option<&L> {
        self.layers.get(index)?.as_any().downcast_ref::<L>()
    }

    /// Appends a layer, selects it alone and fits the dims to the new
    /// stack. The view is reset when this is the first layer.
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) -> Result<usize> {
        let index = self.layers.append(layer);
        self.layers.select_only(index)?;
        self.on_layers_change()?;
        self.update_active_layer();
        if self.layers.len() == 1 {
            self.reset_view();
        }
        Ok(index)
    }

    pub fn add_image(&mut self, data: ArrayD<f32>, options: ImageOptions) -> Result<usize> {
        self.add_layer(Box::new(Image::new(data, options)?))
    }

    pub fn add_labels(&mut self, data: ArrayD<u32>, options: LabelsOptions) -> Result<usize> {
        self.add_layer(Box::new(Labels::new(data, options)?))
    }

    pub fn add_points(&mut self, data: Array2<f64>, options: PointsOptions) -> Result<usize> {
        self.add_layer(Box::new(Points::new(data, options)?))
    }

    pub fn add_shapes(&mut self, data: Vec<Array2<f64>>, options: ShapesOptions) -> Result<usize> {
        self.add_layer(Box::new(Shapes::new(data, options)?))
    }

    pub fn add_vectors(&mut self, data: Array3<f64>, options: VectorsOptions) -> Result<usize> {
        self.add_layer(Box::new(Vectors::new(data, options)?))
    }

    /// Rank for new annotation layers: the viewer rank, at least 2.
    fn annotation_ndim(&self) -> usize {
        self.dims.ndim().max(2)
    }

    pub fn new_points(&mut self) -> Result<usize> {
        let ndim = self.annotation_ndim();
        let options = PointsOptions {
            ndim: Some(ndim),
            ..PointsOptions::default()
        };
        self.add_points(Array2::zeros((0, ndim)), options)
    }

    pub fn new_shapes(&mut self) -> Result<usize> {
        let ndim = self.annotation_ndim();
        let options = ShapesOptions {
            ndim: Some(ndim),
            ..ShapesOptions::default()
        };
        self.add_shapes(Vec::new(), options)
    }

    /// Empty labels covering the current bounding box, or 512 x 512 when
    /// the viewer is empty.
    pub fn new_labels(&mut self) -> Result<usize> {
        let shape = if self.layers.is_empty() {
            vec![512, 512]
        } else {
            let (_, max) = self.calc_bbox();
            let shape = max
                .iter()
                .map(|max| (max.round().max(0.0) as usize).max(1))
                .collect::<Vec<_>>();
            align_from_trailing(&shape, self.annotation_ndim())
        };
        self.add_labels(ArrayD::zeros(IxDyn(&shape)), LabelsOptions::default())
    }

    pub fn remove_layer(&mut self, index: usize) -> Result<Box<dyn Layer>> {
        let layer = self.layers.remove(index)?;
        self.on_layers_change()?;
        self.update_active_layer();
        Ok(layer)
    }

    pub fn remove_selected(&mut self) -> Result<Vec<Box<dyn Layer>>> {
        let removed = self.layers.remove_selected();
        if !removed.is_empty() {
            self.on_layers_change()?;
            self.update_active_layer();
        }
        Ok(removed)
    }

    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<()> {
        self.layers.move_layer(from, to)
    }

    pub fn rename_layer(&mut self, index: usize, name: &str) -> Result<String> {
        self.layers.rename(index, name)
    }

    pub fn select_layer(&mut self, index: usize) -> Result<()> {
        self.layers.select_only(index)?;
        self.update_active_layer();
        Ok(())
    }

    /// Adds or removes one layer from the selection.
    pub fn toggle_layer_selection(&mut self, index: usize) -> Result<()> {
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(ViewerError::LayerIndex { index, len })?;
        let selected = layer.base().selected();
        layer.base_mut().set_selected(!selected);
        self.update_active_layer();
        Ok(())
    }

    pub fn unselect_all(&mut self) {
        self.layers.unselect_all();
        self.update_active_layer();
    }

    /// Runs `edit` against the global dims, then brings every layer in line.
    /// A change of ndisplay also resets the view.
    pub fn update_dims<R>(&mut self, edit: impl FnOnce(&mut Dims) -> R) -> Result<R> {
        let ndisplay = self.dims.ndisplay();
        let result = edit(&mut self.dims);
        self.update_layers()?;
        if self.dims.ndisplay() != ndisplay {
            self.reset_view();
        }
        Ok(result)
    }

    pub fn set_point(&mut self, axis: usize, value: f64) -> Result<bool> {
        self.update_dims(|dims| dims.set_point(axis, value))?
    }

    pub fn set_order(&mut self, order: Vec<usize>) -> Result<bool> {
        self.update_dims(|dims| dims.set_order(order))?
    }

    pub fn set_ndisplay(&mut self, ndisplay: usize) -> Result<bool> {
        self.update_dims(|dims| dims.set_ndisplay(ndisplay))?
    }

    /// Runs `edit` on one layer, then refits the dims to the stack in case
    /// the edit changed the layer extent.
    pub fn update_layer<R>(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut dyn Layer) -> R,
    ) -> Result<R> {
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(ViewerError::LayerIndex { index, len })?;
        let result = edit(layer.as_mut());
        self.on_layers_change()?;
        self.update_active_layer();
        Ok(result)
    }

    /// Same as `update_layer` for a layer of a known kind.
    pub fn update_layer_as<L: Layer, R>(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut L) -> R,
    ) -> Result<R> {
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(ViewerError::LayerIndex { index, len })?;
        let kind = layer.kind();
        let concrete = layer
            .as_any_mut()
            .downcast_mut::<L>()
            .ok_or_else(|| ViewerError::InvalidArgument(format!("layer {index} is a {kind} layer")))?;
        let result = edit(concrete);
        self.on_layers_change()?;
        self.update_active_layer();
        Ok(result)
    }

    /// Pushes the global order, ndisplay and point into every layer.
    /// Returns how many layers had to re-slice.
    pub fn update_layers(&mut self) -> Result<usize> {
        let dims = &self.dims;
        let mut refreshed = 0;
        for layer in self.layers.iter_mut() {
            if reconcile_layer(dims, layer.as_mut())? {
                refreshed += 1;
            }
        }
        debug!("reconciled {} layers, {refreshed} re-sliced", self.layers.len());
        Ok(refreshed)
    }

    /// Union of layer ranges, aligned from the trailing axis.
    pub fn calc_layers_ranges(&self) -> Vec<AxisRange> {
        let ranges = self
            .layers
            .iter()
            .map(|layer| layer.range())
            .collect::<Vec<_>>();
        union_ranges_from_trailing(ranges.iter().map(Vec::as_slice))
    }

    /// Refits the global rank and ranges to the layers, then reconciles.
    pub fn on_layers_change(&mut self) -> Result<()> {
        let ranges = self.calc_layers_ranges();
        if self.dims.set_ndim(ranges.len()) {
            info!("viewer now has {} axes", ranges.len());
        }
        for (axis, range) in ranges.into_iter().enumerate() {
            self.dims.set_range(axis, range)?;
        }
        self.update_layers()?;
        Ok(())
    }

    /// `(min corner, max corner)` of the global ranges.
    pub fn calc_bbox(&self) -> (Vec<f64>, Vec<f64>) {
        self.dims
            .range()
            .iter()
            .map(|range| (range.min, range.max))
            .unzip()
    }

    /// Emits and returns the camera placement framing the displayed axes.
    pub fn reset_view(&mut self) -> ResetView {
        let (min, max) = self.calc_bbox();
        let displayed = self.dims.displayed();
        let corner = displayed.iter().map(|axis| min[*axis]).collect::<Vec<_>>();
        let size = displayed
            .iter()
            .map(|axis| max[*axis] - min[*axis])
            .collect::<Vec<_>>();

        let view = if self.dims.ndisplay() == 3 && size.len() == 3 {
            let center = corner
                .iter()
                .zip(&size)
                .map(|(corner, size)| corner + size / 2.0)
                .collect();
            let mean = size.iter().sum::<f64>() / size.len() as f64;
            ResetView::Arcball {
                center,
                scale_factor: 1.5 * mean,
            }
        } else {
            let rows = size.len().saturating_sub(2);
            let (row, col) = (
                corner.get(rows).copied().unwrap_or_default(),
                corner.get(rows + 1).copied().unwrap_or_default(),
            );
            let (height, width) = (
                size.get(rows).copied().unwrap_or_default(),
                size.get(rows + 1).copied().unwrap_or_default(),
            );
            ResetView::Viewbox {
                x: col - 0.05 * width,
                y: row - 0.05 * height,
                width: 1.1 * width,
                height: 1.1 * height,
            }
        };
        debug!("reset view to {view:?}");
        self.events.reset_view.emit(view.clone());
        view
    }

    /// Global coordinate of a canvas position given in displayed axes; the
    /// other axes sit at the current point.
    pub fn canvas_to_data(&self, position: &[f64]) -> Result<Vec<f64>> {
        let displayed = self.dims.displayed();
        if position.len() != displayed.len() {
            return Err(ViewerError::ShapeMismatch(format!(
                "canvas position has {} coordinates, {} axes are displayed",
                position.len(),
                displayed.len()
            )));
        }
        let mut coordinate = self.dims.point().to_vec();
        for (axis, value) in displayed.iter().zip(position) {
            coordinate[*axis] = *value;
        }
        Ok(coordinate)
    }

    pub fn on_mouse_press(&mut self, event: &MouseEvent) -> Result<()> {
        self.dispatch_mouse(event)
    }

    pub fn on_mouse_move(&mut self, event: &MouseEvent) -> Result<()> {
        self.dispatch_mouse(event)
    }

    pub fn on_mouse_release(&mut self, event: &MouseEvent) -> Result<()> {
        self.dispatch_mouse(event)
    }

    /// Routes a pointer event to the active layer in its own axes. Layer
    /// edits that change the data extent refit the dims afterwards.
    fn dispatch_mouse(&mut self, event: &MouseEvent) -> Result<()> {
        let Some(index) = self.active_layer_index() else {
            return Ok(());
        };
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(ViewerError::LayerIndex { index, len })?;
        let rank = layer.ndim();
        if event.coordinate.len() < rank {
            return Err(ViewerError::ShapeMismatch(format!(
                "pointer has {} coordinates, layer `{}` has {rank} axes",
                event.coordinate.len(),
                layer.name()
            )));
        }
        let aligned = MouseEvent {
            coordinate: align_from_trailing(&event.coordinate, rank),
            ..event.clone()
        };
        let data_events = layer.base().events.data.delivered();
        layer.handle_mouse(&aligned)?;
        let data_changed = layer.base().events.data.delivered() != data_events;
        if data_changed {
            self.on_layers_change()?;
        }
        self.sync_interaction_state();
        Ok(())
    }

    /// The active layer is the single selected layer, if exactly one is.
    fn update_active_layer(&mut self) {
        let active = match self.layers.selected().as_slice() {
            [index] => self.layers.get(*index).map(|layer| layer.base().id()),
            _ => None,
        };
        if active != self.active_layer {
            self.active_layer = active;
            self.events.active_layer.emit(active);
        }
        self.sync_interaction_state();
    }

    /// Mirrors status, help and cursor state from the active layer.
    fn sync_interaction_state(&mut self) {
        let state = self
            .active_layer_index()
            .and_then(|index| self.layers.get(index))
            .map(|layer| {
                let base = layer.base();
                (
                    base.status().to_string(),
                    base.help().to_string(),
                    base.cursor(),
                    base.cursor_size(),
                    base.interactive(),
                )
            })
            .unwrap_or_else(|| (READY.to_string(), String::new(), Cursor::Standard, None, true));
        let (status, help, cursor, cursor_size, interactive) = state;

        if self.status != status {
            self.events.status.emit(status.clone());
            self.status = status;
        }
        if self.help != help {
            self.events.help.emit(help.clone());
            self.help = help;
        }
        if self.cursor != cursor {
            self.cursor = cursor;
            self.events.cursor.emit(cursor);
        }
        if self.cursor_size != cursor_size {
            self.cursor_size = cursor_size;
            self.events.cursor_size.emit(cursor_size);
        }
        if self.interactive != interactive {
            self.interactive = interactive;
            self.events.interactive.emit(interactive);
        }
    }
}

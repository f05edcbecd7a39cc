use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::thumbnail::{THUMBNAIL_SHAPE, blank_thumbnail};
use crate::dims::Dims;
use crate::error::{Result, ViewerError};
use crate::events::EventEmitter;

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(u64);

impl LayerId {
    fn next() -> Self {
        Self(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Blending {
    Opaque,
    #[default]
    Translucent,
    Additive,
}

impl FromStr for Blending {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "opaque" => Ok(Self::Opaque),
            "translucent" => Ok(Self::Translucent),
            "additive" => Ok(Self::Additive),
            other => Err(ViewerError::InvalidArgument(format!(
                "unknown blending `{other}`; expected opaque, translucent or additive"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    #[default]
    Standard,
    Cross,
    Square,
    Pointing,
}

/// Presentation options every layer kind accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerOptions {
    pub name: Option<String>,
    pub opacity: Option<f32>,
    pub blending: Blending,
    pub visible: Option<bool>,
    pub scale: Option<Vec<f64>>,
    pub translate: Option<Vec<f64>>,
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct LayerEvents {
    pub select: EventEmitter<()>,
    pub deselect: EventEmitter<()>,
    /// Raw data was replaced or edited.
    pub data: EventEmitter<()>,
    /// The displayed slice was recomputed.
    pub set_data: EventEmitter<()>,
    pub thumbnail: EventEmitter<()>,
    pub name: EventEmitter<String>,
    pub opacity: EventEmitter<f32>,
    pub visible: EventEmitter<bool>,
    pub blending: EventEmitter<Blending>,
    pub scale: EventEmitter<Vec<f64>>,
    pub translate: EventEmitter<Vec<f64>>,
    pub status: EventEmitter<String>,
    pub help: EventEmitter<String>,
    pub cursor: EventEmitter<Cursor>,
    pub cursor_size: EventEmitter<Option<f64>>,
    pub interactive: EventEmitter<bool>,
    pub mode: EventEmitter<String>,
}

/// State shared by every layer kind: identity, presentation, per-layer dims,
/// interaction strings and the thumbnail.
#[derive(Debug)]
pub struct LayerBase {
    id: LayerId,
    name: String,
    opacity: f32,
    blending: Blending,
    visible: bool,
    scale: Vec<f64>,
    translate: Vec<f64>,
    pub metadata: BTreeMap<String, Value>,
    selected: bool,
    status: String,
    help: String,
    cursor: Cursor,
    cursor_size: Option<f64>,
    interactive: bool,
    scale_factor: f64,
    coordinates: Vec<f64>,
    thumbnail: Array3<f32>,
    dims: Dims,
    refresh_blocked: usize,
    refresh_pending: bool,
    pub events: LayerEvents,
}

impl LayerBase {
    pub(crate) fn new(
        ndim: usize,
        default_name: &str,
        default_opacity: f32,
        options: LayerOptions,
    ) -> Result<Self> {
        let opacity = options.opacity.unwrap_or(default_opacity);
        validate_opacity(opacity)?;
        let scale = options.scale.unwrap_or_else(|| vec![1.0; ndim]);
        let translate = options.translate.unwrap_or_else(|| vec![0.0; ndim]);
        validate_transform("scale", &scale, ndim)?;
        validate_transform("translate", &translate, ndim)?;
        if scale.iter().any(|factor| *factor <= 0.0) {
            return Err(ViewerError::InvalidArgument(format!(
                "scale factors must be positive, got {scale:?}"
            )));
        }

        Ok(Self {
            id: LayerId::next(),
            name: options.name.unwrap_or_else(|| default_name.to_string()),
            opacity,
            blending: options.blending,
            visible: options.visible.unwrap_or(true),
            scale,
            translate,
            metadata: options.metadata,
            selected: false,
            status: String::new(),
            help: String::new(),
            cursor: Cursor::Standard,
            cursor_size: None,
            interactive: true,
            scale_factor: 1.0,
            coordinates: vec![0.0; ndim],
            thumbnail: blank_thumbnail(),
            dims: Dims::new(ndim),
            refresh_blocked: 0,
            refresh_pending: false,
            events: LayerEvents::default(),
        })
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.events.name.emit(self.name.clone());
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Prefer `Layer::set_opacity`, which also refreshes the thumbnail.
    pub(crate) fn set_opacity(&mut self, opacity: f32) -> Result<bool> {
        validate_opacity(opacity)?;
        if opacity == self.opacity {
            return Ok(false);
        }
        self.opacity = opacity;
        self.events.opacity.emit(opacity);
        Ok(true)
    }

    pub fn blending(&self) -> Blending {
        self.blending
    }

    pub fn set_blending(&mut self, blending: Blending) {
        if blending != self.blending {
            self.blending = blending;
            self.events.blending.emit(blending);
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if visible != self.visible {
            self.visible = visible;
            self.events.visible.emit(visible);
        }
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn set_scale(&mut self, scale: Vec<f64>) -> Result<()> {
        validate_transform("scale", &scale, self.dims.ndim())?;
        if scale.iter().any(|factor| *factor <= 0.0) {
            return Err(ViewerError::InvalidArgument(format!(
                "scale factors must be positive, got {scale:?}"
            )));
        }
        if scale != self.scale {
            self.scale = scale;
            self.events.scale.emit(self.scale.clone());
        }
        Ok(())
    }

    pub fn translate(&self) -> &[f64] {
        &self.translate
    }

    pub fn set_translate(&mut self, translate: Vec<f64>) -> Result<()> {
        validate_transform("translate", &translate, self.dims.ndim())?;
        if translate != self.translate {
            self.translate = translate;
            self.events.translate.emit(self.translate.clone());
        }
        Ok(())
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        if selected == self.selected {
            return;
        }
        self.selected = selected;
        if selected {
            self.events.select.emit(());
        } else {
            self.events.deselect.emit(());
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        if status != self.status {
            self.status = status;
            self.events.status.emit(self.status.clone());
        }
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn set_help(&mut self, help: impl Into<String>) {
        let help = help.into();
        if help != self.help {
            self.help = help;
            self.events.help.emit(self.help.clone());
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        if cursor != self.cursor {
            self.cursor = cursor;
            self.events.cursor.emit(cursor);
        }
    }

    pub fn cursor_size(&self) -> Option<f64> {
        self.cursor_size
    }

    pub fn set_cursor_size(&mut self, cursor_size: Option<f64>) {
        if cursor_size != self.cursor_size {
            self.cursor_size = cursor_size;
            self.events.cursor_size.emit(cursor_size);
        }
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        if interactive != self.interactive {
            self.interactive = interactive;
            self.events.interactive.emit(interactive);
        }
    }

    /// Canvas zoom relative to data units; brush cursors are sized by it.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) -> Result<()> {
        if !(scale_factor > 0.0) {
            return Err(ViewerError::InvalidArgument(format!(
                "scale factor must be positive, got {scale_factor}"
            )));
        }
        self.scale_factor = scale_factor;
        Ok(())
    }

    /// Cursor position in data coordinates, one entry per layer axis.
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub(crate) fn set_coordinates(&mut self, coordinates: &[f64]) -> Result<()> {
        if coordinates.len() != self.dims.ndim() {
            return Err(ViewerError::ShapeMismatch(format!(
                "cursor coordinate has {} axes but layer `{}` has {}",
                coordinates.len(),
                self.name,
                self.dims.ndim()
            )));
        }
        self.coordinates = coordinates.to_vec();
        Ok(())
    }

    /// RGBA preview of the current slice, `THUMBNAIL_SHAPE` pixels.
    pub fn thumbnail(&self) -> &Array3<f32> {
        &self.thumbnail
    }

    pub(crate) fn set_thumbnail(&mut self, thumbnail: Array3<f32>) {
        debug_assert_eq!(thumbnail.dim(), (THUMBNAIL_SHAPE.0, THUMBNAIL_SHAPE.1, 4));
        self.thumbnail = thumbnail;
        self.events.thumbnail.emit(());
    }

    pub fn dims(&self) -> &Dims {
        &self.dims
    }

    pub(crate) fn dims_mut(&mut self) -> &mut Dims {
        &mut self.dims
    }

    /// Keeps scale, translate and coordinates sized to a new rank, aligned
    /// from the trailing axis.
    pub(crate) fn fit_rank(&mut self, ndim: usize) {
        fn refit(values: &mut Vec<f64>, ndim: usize, fill: f64) {
            let len = values.len();
            if len > ndim {
                values.drain(..len - ndim);
            } else if len < ndim {
                let mut padded = vec![fill; ndim - len];
                padded.append(values);
                *values = padded;
            }
        }
        refit(&mut self.scale, ndim, 1.0);
        refit(&mut self.translate, ndim, 0.0);
        refit(&mut self.coordinates, ndim, 0.0);
    }

    pub(crate) fn refresh_is_blocked(&self) -> bool {
        self.refresh_blocked > 0
    }

    pub(crate) fn block_refresh(&mut self) {
        self.refresh_blocked += 1;
    }

    /// Returns true when the last blocker was released with a refresh owed.
    pub(crate) fn unblock_refresh(&mut self) -> bool {
        self.refresh_blocked = self.refresh_blocked.saturating_sub(1);
        if self.refresh_blocked == 0 && self.refresh_pending {
            self.refresh_pending = false;
            true
        } else {
            false
        }
    }

    pub(crate) fn defer_refresh(&mut self) {
        self.refresh_pending = true;
    }
}

fn validate_opacity(opacity: f32) -> Result<()> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(())
    } else {
        Err(ViewerError::InvalidArgument(format!(
            "opacity must be between 0 and 1, got {opacity}"
        )))
    }
}

fn validate_transform(what: &str, values: &[f64], ndim: usize) -> Result<()> {
    if values.len() == ndim {
        Ok(())
    } else {
        Err(ViewerError::ShapeMismatch(format!(
            "{what} has {} entries but the layer has {ndim} dimensions",
            values.len()
        )))
    }
}

use std::any::Any;
use std::str::FromStr;

use ndarray::{Array2, ArrayD, Axis};
use serde::{Deserialize, Serialize};

use super::base::{LayerBase, LayerOptions};
use super::raster::{pixel_index, png_data_uri, slice_raster};
use super::thumbnail::{colorize, pad_to_thumbnail, project_to_plane, zoom_nearest};
use super::xml::XmlElement;
use super::{Layer, LayerKind, LayerValue};
use crate::colormaps::{Colormap, Rgba};
use crate::error::{Result, ViewerError};
use crate::events::EventEmitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Nearest,
    Bilinear,
    Bicubic,
}

impl FromStr for Interpolation {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            other => Err(ViewerError::InvalidArgument(format!(
                "unknown interpolation `{other}`"
            ))),
        }
    }
}

/// Volume rendering used when three axes are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendering {
    #[default]
    Mip,
    Translucent,
    Additive,
}

impl FromStr for Rendering {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "mip" => Ok(Self::Mip),
            "translucent" => Ok(Self::Translucent),
            "additive" => Ok(Self::Additive),
            other => Err(ViewerError::InvalidArgument(format!(
                "unknown rendering `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    #[serde(flatten)]
    pub layer: LayerOptions,
    /// Treat a trailing axis of length 3 or 4 as colour channels. Inferred
    /// from the shape when unset.
    pub multichannel: Option<bool>,
    pub colormap: Colormap,
    pub contrast_limits: Option<[f32; 2]>,
    pub interpolation: Interpolation,
    pub rendering: Rendering,
}

#[derive(Debug, Clone, Default)]
pub struct ImageEvents {
    pub colormap: EventEmitter<Colormap>,
    pub contrast_limits: EventEmitter<[f32; 2]>,
    pub interpolation: EventEmitter<Interpolation>,
    pub rendering: EventEmitter<Rendering>,
}

/// Dense scalar or RGB(A) raster.
#[derive(Debug)]
pub struct Image {
    base: LayerBase,
    data: ArrayD<f32>,
    multichannel: bool,
    colormap: Colormap,
    contrast_limits: [f32; 2],
    interpolation: Interpolation,
    rendering: Rendering,
    data_view: ArrayD<f32>,
    pub events: ImageEvents,
}

impl Image {
    pub fn new(data: ArrayD<f32>, options: ImageOptions) -> Result<Self> {
        let multichannel = options
            .multichannel
            .unwrap_or_else(|| infer_multichannel(data.shape()));
        validate_shape(data.shape(), multichannel)?;
        let contrast_limits = match options.contrast_limits {
            Some(limits) => {
                validate_contrast_limits(limits)?;
                limits
            }
            None => default_contrast_limits(&data),
        };
        let ndim = data.ndim() - usize::from(multichannel);
        let mut layer = Self {
            base: LayerBase::new(ndim, "Image", 1.0, options.layer)?,
            data,
            multichannel,
            colormap: options.colormap,
            contrast_limits,
            interpolation: options.interpolation,
            rendering: options.rendering,
            data_view: ArrayD::zeros(vec![0, 0]),
            events: ImageEvents::default(),
        };
        layer.update_dims();
        Ok(layer)
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Replaces the data; the rank may change, the channel layout may not.
    pub fn set_data(&mut self, data: ArrayD<f32>) -> Result<()> {
        validate_shape(data.shape(), self.multichannel)?;
        self.data = data;
        self.base.events.data.emit(());
        self.update_dims();
        Ok(())
    }

    /// Currently displayed slice, displayed axes first then channels.
    pub fn data_view(&self) -> &ArrayD<f32> {
        &self.data_view
    }

    pub fn multichannel(&self) -> bool {
        self.multichannel
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        if colormap != self.colormap {
            self.colormap = colormap;
            self.events.colormap.emit(colormap);
            self.update_thumbnail();
        }
    }

    pub fn contrast_limits(&self) -> [f32; 2] {
        self.contrast_limits
    }

    pub fn set_contrast_limits(&mut self, limits: [f32; 2]) -> Result<()> {
        validate_contrast_limits(limits)?;
        if limits != self.contrast_limits {
            self.contrast_limits = limits;
            self.events.contrast_limits.emit(limits);
            self.update_thumbnail();
        }
        Ok(())
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        if interpolation != self.interpolation {
            self.interpolation = interpolation;
            self.events.interpolation.emit(interpolation);
        }
    }

    pub fn rendering(&self) -> Rendering {
        self.rendering
    }

    pub fn set_rendering(&mut self, rendering: Rendering) {
        if rendering != self.rendering {
            self.rendering = rendering;
            self.events.rendering.emit(rendering);
        }
    }

    fn normalize(&self, value: f32) -> f32 {
        let [low, high] = self.contrast_limits;
        (value - low) / (high - low)
    }

    /// Colour-mapped plane of the current slice; volumes are max-projected.
    fn color_plane(&self) -> Array2<Rgba> {
        if !self.multichannel {
            let plane = project_to_plane(&self.data_view, f32::NEG_INFINITY);
            return plane.mapv(|value| self.colormap.map(self.normalize(value)));
        }
        let channel_axis = Axis(self.data_view.ndim() - 1);
        let planes = self
            .data_view
            .axis_iter(channel_axis)
            .take(4)
            .map(|channel| project_to_plane(&channel.to_owned(), f32::NEG_INFINITY))
            .collect::<Vec<_>>();
        let (height, width) = planes.first().map_or((0, 0), |plane| plane.dim());
        Array2::from_shape_fn((height, width), |(row, col)| {
            let mut rgba: Rgba = [0.0, 0.0, 0.0, 1.0];
            for (slot, plane) in rgba.iter_mut().zip(&planes) {
                *slot = self.normalize(plane[[row, col]]).clamp(0.0, 1.0);
            }
            rgba
        })
    }
}

impl Layer for Image {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Image
    }

    fn data_ndim(&self) -> usize {
        self.data.ndim() - usize::from(self.multichannel)
    }

    fn extent(&self) -> Vec<(f64, f64)> {
        self.data.shape()[..self.data_ndim()]
            .iter()
            .map(|len| (0.0, *len as f64))
            .collect()
    }

    fn set_view_slice(&mut self) {
        self.data_view = slice_raster(
            &self.data,
            self.base.dims(),
            usize::from(self.multichannel),
        );
    }

    fn update_thumbnail(&mut self) {
        let zoomed = zoom_nearest(&self.color_plane());
        let thumbnail = colorize(&zoomed, self.base.opacity(), |rgba| rgba);
        self.base.set_thumbnail(pad_to_thumbnail(&thumbnail));
    }

    fn get_value(&self) -> Option<LayerValue> {
        let dims = self.base.dims();
        let coordinates = self.base.coordinates();
        let mut index = Vec::with_capacity(dims.displayed().len());
        for (position, axis) in dims.displayed().iter().enumerate() {
            let len = self.data_view.len_of(Axis(position));
            index.push(pixel_index(*coordinates.get(*axis)?, len)?);
        }
        if self.multichannel {
            let values = (0..self.data.shape()[self.data.ndim() - 1])
                .map(|channel| {
                    let mut full = index.clone();
                    full.push(channel);
                    self.data_view[full.as_slice()]
                })
                .collect();
            Some(LayerValue::Channels(values))
        } else {
            Some(LayerValue::Scalar(self.data_view[index.as_slice()]))
        }
    }

    fn to_xml_list(&self) -> Result<Vec<XmlElement>> {
        let rendered = colorize(&self.color_plane(), 1.0, |rgba| rgba);
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

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn infer_multichannel(shape: &[usize]) -> bool {
    shape.len() > 2 && matches!(shape.last(), Some(3 | 4))
}

fn validate_shape(shape: &[usize], multichannel: bool) -> Result<()> {
    let spatial = shape.len() - usize::from(multichannel).min(shape.len());
    if spatial < 2 {
        return Err(ViewerError::ShapeMismatch(format!(
            "image data needs at least two spatial axes, got shape {shape:?}"
        )));
    }
    if multichannel && !matches!(shape.last(), Some(3 | 4)) {
        return Err(ViewerError::ShapeMismatch(format!(
            "multichannel data needs a trailing axis of 3 or 4, got shape {shape:?}"
        )));
    }
    if shape.contains(&0) {
        return Err(ViewerError::ShapeMismatch(format!(
            "image data has an empty axis: {shape:?}"
        )));
    }
    Ok(())
}

fn validate_contrast_limits([low, high]: [f32; 2]) -> Result<()> {
    if low.is_finite() && high.is_finite() && low < high {
        Ok(())
    } else {
        Err(ViewerError::InvalidArgument(format!(
            "contrast limits must satisfy low < high, got [{low}, {high}]"
        )))
    }
}

fn default_contrast_limits(data: &ArrayD<f32>) -> [f32; 2] {
    let (low, high) = data
        .iter()
        .filter(|value| value.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), value| {
            (low.min(*value), high.max(*value))
        });
    if low < high { [low, high] } else if low.is_finite() { [low, low + 1.0] } else { [0.0, 1.0] }
}

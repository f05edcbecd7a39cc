use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, RgbaImage};
use ndarray::{Array3, ArrayD, Axis};

use crate::dims::{AxisIndex, Dims};
use crate::error::{Result, ViewerError};

/// `data[indices]` with the displayed axes put in displayed order. Trailing
/// `channel_axes` are carried through untouched after the displayed ones.
/// Indices past either end of an axis take its nearest plane.
pub(crate) fn slice_raster<T: Clone>(
    data: &ArrayD<T>,
    dims: &Dims,
    channel_axes: usize,
) -> ArrayD<T> {
    let mut view = data.view();
    for (axis, index) in dims.indices().iter().enumerate().rev() {
        if let AxisIndex::At(position) = index {
            let last = view.len_of(Axis(axis)).saturating_sub(1) as i64;
            view = view.index_axis_move(Axis(axis), (*position).clamp(0, last) as usize);
        }
    }
    let mut permutation = dims.displayed_order();
    let displayed = permutation.len();
    permutation.extend(displayed..displayed + channel_axes);
    view.permuted_axes(permutation).to_owned()
}

/// Rounds a cursor coordinate to an in-bounds array index.
pub(crate) fn pixel_index(coordinate: f64, len: usize) -> Option<usize> {
    let rounded = coordinate.round();
    (rounded >= 0.0 && rounded < len as f64).then_some(rounded as usize)
}

/// Encodes an `(height, width, 4)` float RGBA image as a PNG data URI.
pub(crate) fn png_data_uri(rgba: &Array3<f32>) -> Result<String> {
    let (height, width, _) = rgba.dim();
    let bytes = rgba
        .iter()
        .map(|value| (value.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect::<Vec<_>>();
    let buffer = RgbaImage::from_raw(width as u32, height as u32, bytes).ok_or_else(|| {
        ViewerError::ShapeMismatch(format!("cannot build a {width}x{height} RGBA raster"))
    })?;
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(buffer).write_to(&mut encoded, ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(encoded.into_inner())
    ))
}

use ndarray::{Array2, Array3, ArrayD, Axis, Zip};

use crate::colormaps::Rgba;

/// Height and width of every layer thumbnail, in pixels.
pub const THUMBNAIL_SHAPE: (usize, usize) = (32, 32);

pub(crate) fn blank_thumbnail() -> Array3<f32> {
    Array3::zeros((THUMBNAIL_SHAPE.0, THUMBNAIL_SHAPE.1, 4))
}

/// Collapses a displayed slice to a plane. Volumes are max-projected along
/// their first displayed axis.
pub(crate) fn project_to_plane<T>(view: &ArrayD<T>, floor: T) -> Array2<T>
where
    T: Copy + PartialOrd,
{
    let shape = view.shape();
    match shape.len() {
        0 => Array2::from_elem((1, 1), view.iter().next().copied().unwrap_or(floor)),
        1 => Array2::from_shape_fn((1, shape[0]), |(_, col)| view[&[col][..]]),
        2 => Array2::from_shape_fn((shape[0], shape[1]), |(row, col)| view[&[row, col][..]]),
        _ => {
            let leading = shape.len() - 2;
            let (height, width) = (shape[leading], shape[leading + 1]);
            let mut plane = Array2::from_elem((height, width), floor);
            for (index, value) in view.indexed_iter() {
                let slot = &mut plane[[index[leading], index[leading + 1]]];
                if *value > *slot {
                    *slot = *value;
                }
            }
            plane
        }
    }
}

/// Nearest-neighbour resize so the longer side fits the thumbnail.
pub(crate) fn zoom_nearest<T: Copy>(plane: &Array2<T>) -> Array2<T> {
    let (height, width) = plane.dim();
    if height == 0 || width == 0 {
        return plane.clone();
    }
    let zoom = (THUMBNAIL_SHAPE.0 as f64 / height as f64)
        .min(THUMBNAIL_SHAPE.1 as f64 / width as f64);
    let out_height = ((height as f64 * zoom).round() as usize).clamp(1, THUMBNAIL_SHAPE.0);
    let out_width = ((width as f64 * zoom).round() as usize).clamp(1, THUMBNAIL_SHAPE.1);
    Array2::from_shape_fn((out_height, out_width), |(row, col)| {
        let source_row = ((row as f64 / zoom) as usize).min(height - 1);
        let source_col = ((col as f64 / zoom) as usize).min(width - 1);
        plane[[source_row, source_col]]
    })
}

/// Maps every pixel through `color` in parallel, scaling alpha by `opacity`.
pub(crate) fn colorize<T, F>(plane: &Array2<T>, opacity: f32, color: F) -> Array3<f32>
where
    T: Copy + Sync,
    F: Fn(T) -> Rgba + Sync + Send,
{
    let (height, width) = plane.dim();
    let mut rgba = Array3::zeros((height, width, 4));
    Zip::from(rgba.lanes_mut(Axis(2)))
        .and(plane)
        .par_for_each(|mut pixel, value| {
            let mut mapped = color(*value);
            mapped[3] *= opacity;
            for (slot, channel) in pixel.iter_mut().zip(mapped) {
                *slot = channel;
            }
        });
    rgba
}

/// Centres an RGBA image no larger than the thumbnail on a transparent one.
pub(crate) fn pad_to_thumbnail(rgba: &Array3<f32>) -> Array3<f32> {
    let mut thumbnail = blank_thumbnail();
    let (height, width, _) = rgba.dim();
    let height = height.min(THUMBNAIL_SHAPE.0);
    let width = width.min(THUMBNAIL_SHAPE.1);
    let top = (THUMBNAIL_SHAPE.0 - height) / 2;
    let left = (THUMBNAIL_SHAPE.1 - width) / 2;
    for row in 0..height {
        for col in 0..width {
            for channel in 0..4 {
                thumbnail[[top + row, left + col, channel]] = rgba[[row, col, channel]];
            }
        }
    }
    thumbnail
}

/// Thumbnail canvas for vector layers: data coordinates within a bounding
/// box are scaled onto the pixel grid, keeping the aspect ratio.
pub(crate) struct ThumbnailCanvas {
    pixels: Array3<f32>,
    origin: [f64; 2],
    zoom: f64,
}

impl ThumbnailCanvas {
    pub(crate) fn fit(min: [f64; 2], max: [f64; 2]) -> Self {
        let span = (max[0] - min[0]).max(max[1] - min[1]);
        let zoom = if span > 0.0 && span.is_finite() {
            (THUMBNAIL_SHAPE.0.min(THUMBNAIL_SHAPE.1) - 1) as f64 / span
        } else {
            1.0
        };
        Self {
            pixels: blank_thumbnail(),
            origin: min,
            zoom,
        }
    }

    pub(crate) fn plot(&mut self, point: [f64; 2], color: Rgba) {
        let row = ((point[0] - self.origin[0]) * self.zoom).round();
        let col = ((point[1] - self.origin[1]) * self.zoom).round();
        if row < 0.0 || col < 0.0 {
            return;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= THUMBNAIL_SHAPE.0 || col >= THUMBNAIL_SHAPE.1 {
            return;
        }
        for (channel, value) in color.into_iter().enumerate() {
            self.pixels[[row, col, channel]] = value;
        }
    }

    pub(crate) fn line(&mut self, from: [f64; 2], to: [f64; 2], color: Rgba) {
        let length = ((to[0] - from[0]) * self.zoom)
            .abs()
            .max(((to[1] - from[1]) * self.zoom).abs());
        let steps = length.ceil().max(1.0) as usize;
        for step in 0..=steps {
            let fraction = step as f64 / steps as f64;
            self.plot(
                [
                    from[0] + (to[0] - from[0]) * fraction,
                    from[1] + (to[1] - from[1]) * fraction,
                ],
                color,
            );
        }
    }

    pub(crate) fn finish(mut self, opacity: f32) -> Array3<f32> {
        self.pixels
            .index_axis_mut(Axis(2), 3)
            .mapv_inplace(|alpha| alpha * opacity);
        self.pixels
    }
}

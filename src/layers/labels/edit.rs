//! Array kernels behind brush painting and bucket filling.

use std::collections::VecDeque;
use std::ops::Range;

use ndarray::{ArrayViewMutD, IxDyn, Slice};
use rayon::prelude::*;

/// Cells a brush of `brush_size` centred on `center` covers along an axis of
/// length `len`. Always inside `0..len`; empty when the brush misses.
pub(crate) fn brush_span(center: f64, brush_size: f64, len: usize) -> Range<usize> {
    let bound = |edge: f64| edge.clamp(0.0, len as f64).round_ties_even() as usize;
    let start = bound(center - brush_size / 2.0 + 0.5);
    let end = bound(center + brush_size / 2.0 + 0.5);
    start..end.max(start)
}

/// Writes `label` into the hyper-rectangle `region`; returns the cell count.
pub(crate) fn paint_region(
    mut data: ArrayViewMutD<'_, u32>,
    region: &[Range<usize>],
    label: u32,
) -> usize {
    let mut block =
        data.slice_each_axis_mut(|axis| Slice::from(region[axis.axis.index()].clone()));
    block.fill(label);
    block.len()
}

/// Replaces `old` with `new` in the face-connected component containing
/// `seed`. Returns the number of cells changed; zero when the seed is out of
/// bounds or does not hold `old`.
pub(crate) fn flood_fill(
    mut data: ArrayViewMutD<'_, u32>,
    seed: &[usize],
    old: u32,
    new: u32,
) -> usize {
    if old == new || seed.len() != data.ndim() {
        return 0;
    }
    if seed.iter().zip(data.shape()).any(|(index, len)| index >= len) {
        return 0;
    }
    if data[IxDyn(seed)] != old {
        return 0;
    }

    let shape = data.shape().to_vec();
    let mut queue = VecDeque::from([seed.to_vec()]);
    data[IxDyn(seed)] = new;
    let mut changed = 1;
    while let Some(index) = queue.pop_front() {
        for axis in 0..shape.len() {
            for forward in [false, true] {
                let position = index[axis];
                let next = if forward {
                    if position + 1 >= shape[axis] {
                        continue;
                    }
                    position + 1
                } else {
                    match position.checked_sub(1) {
                        Some(next) => next,
                        None => continue,
                    }
                };
                let mut neighbor = index.clone();
                neighbor[axis] = next;
                let cell = &mut data[IxDyn(&neighbor)];
                if *cell == old {
                    *cell = new;
                    changed += 1;
                    queue.push_back(neighbor);
                }
            }
        }
    }
    changed
}

/// Replaces every `old` with `new`, regardless of connectivity.
pub(crate) fn replace_all(data: ArrayViewMutD<'_, u32>, old: u32, new: u32) -> usize {
    if old == new {
        return 0;
    }
    data.into_par_iter()
        .map(|cell| {
            if *cell == old {
                *cell = new;
                1
            } else {
                0
            }
        })
        .sum()
}

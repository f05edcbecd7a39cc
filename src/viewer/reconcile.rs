//! Pushes the global dims down to each layer, aligned from the trailing
//! axis.

use log::trace;

use crate::dims::{Dims, align_order_from_trailing};
use crate::error::Result;
use crate::layers::Layer;

/// Global point per layer axis. Layer axes before the first global axis
/// (a layer with more axes than the viewer) get `None` and keep their own
/// point.
pub(crate) fn layer_point(global: &Dims, rank: usize) -> Vec<Option<f64>> {
    let offset = global.ndim() as isize - rank as isize;
    (0..rank)
        .map(|axis| {
            let global_axis = axis as isize + offset;
            usize::try_from(global_axis)
                .ok()
                .and_then(|global_axis| global.point().get(global_axis).copied())
        })
        .collect()
}

/// Brings one layer in line with the global dims. Returns whether the layer
/// had to re-slice.
pub(crate) fn reconcile_layer(global: &Dims, layer: &mut dyn Layer) -> Result<bool> {
    let rank = layer.ndim();
    let order = align_order_from_trailing(global.order(), rank);
    let point = layer_point(global, rank);
    let changed = layer.sync_dims(order, global.ndisplay(), &point)?;
    if changed {
        trace!("layer `{}` re-sliced to {:?}", layer.name(), layer.base().dims().point());
    }
    Ok(changed)
}

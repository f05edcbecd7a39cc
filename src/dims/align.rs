//! Trailing-axis alignment shared by the global dims and every layer.
//!
//! An entity with fewer axes than the global space owns the *last* axes of
//! that space, the same way array broadcasting lines shapes up from the end.

use super::AxisRange;

/// Per-axis values of a `rank`-dimensional entity taken from a global
/// per-axis sequence. When `rank` exceeds the global length the whole
/// sequence is returned and the caller owns the missing leading axes.
pub fn align_from_trailing<T: Clone>(global: &[T], rank: usize) -> Vec<T> {
    let offset = global.len().saturating_sub(rank);
    global[offset..].to_vec()
}

/// Axis order of a `rank`-dimensional entity derived from a global order.
///
/// Entries that refer to leading global axes the entity lacks are dropped and
/// the rest are renumbered down, preserving relative order. A `rank` larger
/// than the global order prepends the extra leading axes in identity order.
/// The result is always a permutation of `0..rank`.
pub fn align_order_from_trailing(order: &[usize], rank: usize) -> Vec<usize> {
    let ndim = order.len();
    if rank >= ndim {
        let pad = rank - ndim;
        (0..pad).chain(order.iter().map(|axis| axis + pad)).collect()
    } else {
        let offset = ndim - rank;
        order
            .iter()
            .filter(|axis| **axis >= offset)
            .map(|axis| axis - offset)
            .collect()
    }
}

/// Union of per-layer ranges, each aligned from its trailing axis. Axes only
/// some layers have take the union over those layers alone.
pub fn union_ranges_from_trailing<'a, I>(layer_ranges: I) -> Vec<AxisRange>
where
    I: IntoIterator<Item = &'a [AxisRange]>,
{
    let mut reversed: Vec<AxisRange> = Vec::new();
    for ranges in layer_ranges {
        for (position, range) in ranges.iter().rev().enumerate() {
            match reversed.get_mut(position) {
                Some(existing) => *existing = existing.union(range),
                None => reversed.push(AxisRange::EMPTY.union(range)),
            }
        }
    }
    reversed.reverse();
    reversed
}

/// Evenly spaced positions between two cursor samples so a fast drag paints
/// a continuous stroke. Steps are a quarter of the brush size along the
/// dominant axis, with brushes below one unit treated as one unit. The starting sample is excluded when more than one
/// position is produced, since it was already painted.
pub fn interpolate_coordinates(
    previous: Option<&[f64]>,
    current: &[f64],
    brush_size: f64,
) -> Vec<Vec<f64>> {
    let previous = previous.unwrap_or(current);
    let largest_delta = previous
        .iter()
        .zip(current)
        .map(|(from, to)| (to - from).abs())
        .fold(0.0_f64, f64::max);
    let steps = (largest_delta / brush_size.max(1.0) * 4.0).ceil() as usize;

    let mut coords = (0..=steps)
        .map(|step| {
            let fraction = if steps == 0 {
                1.0
            } else {
                step as f64 / steps as f64
            };
            previous
                .iter()
                .zip(current)
                .map(|(from, to)| from + (to - from) * fraction)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    if coords.len() > 1 {
        coords.remove(0);
    }
    coords
}

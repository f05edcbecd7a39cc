use super::Rgba;

const GOLDEN: f64 = 0.618_033_988_749_894_9;
const MARGIN: f64 = 1.0 / 256.0;

/// Spreads consecutive integer labels over `(0, 1)` so neighbouring ids get
/// visibly different colours. Different seeds shuffle the assignment.
pub fn low_discrepancy(label: u32, seed: f64) -> f64 {
    let value = (seed + f64::from(label) * GOLDEN).rem_euclid(1.0);
    MARGIN + (1.0 - 2.0 * MARGIN) * value
}

/// Integer label to colour mapping. Label 0 is background and transparent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelColormap {
    pub num_colors: usize,
    pub seed: f64,
}

impl Default for LabelColormap {
    fn default() -> Self {
        Self {
            num_colors: 50,
            seed: 0.5,
        }
    }
}

impl LabelColormap {
    pub fn new(num_colors: usize, seed: f64) -> Self {
        Self {
            num_colors: num_colors.max(1),
            seed,
        }
    }

    pub fn color(&self, label: u32) -> Option<Rgba> {
        if label == 0 {
            return None;
        }
        let position = low_discrepancy(label, self.seed);
        let slot = ((position * self.num_colors as f64) as usize).min(self.num_colors - 1);
        Some(palette_entry(slot, self.num_colors))
    }

    /// Like `color` but background maps to transparent black.
    pub fn rgba(&self, label: u32) -> Rgba {
        self.color(label).unwrap_or([0.0; 4])
    }
}

fn palette_entry(slot: usize, num_colors: usize) -> Rgba {
    let hue = slot as f64 / num_colors as f64;
    let value = if slot % 2 == 0 { 1.0 } else { 0.8 };
    let [r, g, b] = hsv_to_rgb(hue, 0.75, value);
    [r as f32, g as f32, b as f32, 1.0]
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> [f64; 3] {
    let sector = (hue * 6.0).rem_euclid(6.0);
    let index = sector.floor() as u8;
    let fraction = sector - sector.floor();
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * fraction);
    let t = value * (1.0 - saturation * (1.0 - fraction));
    match index {
        0 => [value, t, p],
        1 => [q, value, p],
        2 => [p, value, t],
        3 => [p, q, value],
        4 => [t, p, value],
        _ => [value, p, q],
    }
}

mod color;
mod labels;
mod ramp;

#[cfg(test)]
mod tests;

pub(crate) use color::{ColorValue, deserialize_rgba};
pub use color::{Rgba, parse_color, to_hex, to_rgba8};
pub use labels::{LabelColormap, low_discrepancy};
pub use ramp::Colormap;

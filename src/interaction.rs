mod events;
mod interpolate;

#[cfg(test)]
mod tests;

pub use events::{Modifiers, MouseEvent, MouseEventKind};
pub use interpolate::interpolate_coordinates;

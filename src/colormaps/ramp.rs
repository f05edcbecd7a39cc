use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Rgba;
use crate::error::ViewerError;

/// Linear ramps from black to a single hue, used for scalar images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Gray,
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
}

impl Colormap {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Cyan => "cyan",
            Self::Magenta => "magenta",
            Self::Yellow => "yellow",
        }
    }

    const fn tint(self) -> [f32; 3] {
        match self {
            Self::Gray => [1.0, 1.0, 1.0],
            Self::Red => [1.0, 0.0, 0.0],
            Self::Green => [0.0, 1.0, 0.0],
            Self::Blue => [0.0, 0.0, 1.0],
            Self::Cyan => [0.0, 1.0, 1.0],
            Self::Magenta => [1.0, 0.0, 1.0],
            Self::Yellow => [1.0, 1.0, 0.0],
        }
    }

    /// Maps a value in `[0, 1]` (clamped) to an opaque colour.
    pub fn map(self, value: f32) -> Rgba {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let [r, g, b] = self.tint();
        [r * value, g * value, b * value, 1.0]
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "gray" | "grey" => Ok(Self::Gray),
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "cyan" => Ok(Self::Cyan),
            "magenta" => Ok(Self::Magenta),
            "yellow" => Ok(Self::Yellow),
            other => Err(ViewerError::InvalidArgument(format!(
                "unknown colormap `{other}`"
            ))),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;
use crate::layers::Cursor;

/// Interactive editing state of a labels layer. Changed only by explicit
/// assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelsMode {
    #[default]
    PanZoom,
    Picker,
    Paint,
    Fill,
}

impl LabelsMode {
    pub const fn token(self) -> &'static str {
        match self {
            Self::PanZoom => "pan_zoom",
            Self::Picker => "picker",
            Self::Paint => "paint",
            Self::Fill => "fill",
        }
    }

    pub(crate) const fn cursor(self) -> Cursor {
        match self {
            Self::PanZoom => Cursor::Standard,
            Self::Picker | Self::Fill => Cursor::Cross,
            Self::Paint => Cursor::Square,
        }
    }

    /// Whether the canvas keeps pan/zoom while this mode is active.
    pub(crate) const fn interactive(self) -> bool {
        matches!(self, Self::PanZoom)
    }

    pub(crate) const fn help(self) -> &'static str {
        match self {
            Self::PanZoom => "enter paint or fill mode to edit labels",
            Self::Picker => "hold <space> to pan/zoom, click to pick a label",
            Self::Paint => "hold <space> to pan/zoom, drag to paint a label",
            Self::Fill => "hold <space> to pan/zoom, click to fill a label",
        }
    }
}

impl fmt::Display for LabelsMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.token())
    }
}

impl FromStr for LabelsMode {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pan_zoom" => Ok(Self::PanZoom),
            "picker" => Ok(Self::Picker),
            "paint" => Ok(Self::Paint),
            "fill" => Ok(Self::Fill),
            _ => Err(ViewerError::UnknownMode(value.to_string())),
        }
    }
}

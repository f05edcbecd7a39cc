use serde::{Deserialize, Deserializer, de};

use crate::error::{Result, ViewerError};

pub type Rgba = [f32; 4];

const NAMED: &[(&str, Rgba)] = &[
    ("black", [0.0, 0.0, 0.0, 1.0]),
    ("white", [1.0, 1.0, 1.0, 1.0]),
    ("red", [1.0, 0.0, 0.0, 1.0]),
    ("green", [0.0, 1.0, 0.0, 1.0]),
    ("blue", [0.0, 0.0, 1.0, 1.0]),
    ("yellow", [1.0, 1.0, 0.0, 1.0]),
    ("cyan", [0.0, 1.0, 1.0, 1.0]),
    ("magenta", [1.0, 0.0, 1.0, 1.0]),
    ("orange", [1.0, 0.647, 0.0, 1.0]),
    ("gray", [0.5, 0.5, 0.5, 1.0]),
    ("grey", [0.5, 0.5, 0.5, 1.0]),
    ("transparent", [0.0, 0.0, 0.0, 0.0]),
];

/// Parses a colour name or `#rgb`, `#rrggbb`, `#rrggbbaa` hex string.
pub fn parse_color(value: &str) -> Result<Rgba> {
    let trimmed = value.trim().to_ascii_lowercase();
    if let Some((_, rgba)) = NAMED.iter().find(|(name, _)| *name == trimmed) {
        return Ok(*rgba);
    }

    let invalid = || ViewerError::InvalidArgument(format!("unrecognized color `{value}`"));
    let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
    let expanded = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>() + "ff",
        6 => format!("{hex}ff"),
        8 => hex.to_string(),
        _ => return Err(invalid()),
    };

    let mut rgba = [0.0_f32; 4];
    for (channel, slot) in rgba.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&expanded[channel * 2..channel * 2 + 2], 16)
            .map_err(|_| invalid())?;
        *slot = f32::from(byte) / 255.0;
    }
    Ok(rgba)
}

/// `#rrggbb` form used in SVG attributes; alpha is carried separately.
pub fn to_hex(rgba: Rgba) -> String {
    let [r, g, b, _] = to_rgba8(rgba);
    format!("#{r:02x}{g:02x}{b:02x}")
}

pub fn to_rgba8(rgba: Rgba) -> [u8; 4] {
    rgba.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Colour as written in configuration: a name, a hex string or RGBA floats.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ColorValue {
    Text(String),
    Channels(Rgba),
}

impl ColorValue {
    pub(crate) fn resolve(self) -> Result<Rgba> {
        match self {
            Self::Text(text) => parse_color(&text),
            Self::Channels(rgba) => Ok(rgba),
        }
    }
}

pub(crate) fn deserialize_rgba<'de, D>(deserializer: D) -> std::result::Result<Rgba, D::Error>
where
    D: Deserializer<'de>,
{
    ColorValue::deserialize(deserializer)?
        .resolve()
        .map_err(de::Error::custom)
}

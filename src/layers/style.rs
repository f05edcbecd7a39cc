use serde::{Deserialize, Deserializer, Serialize, de};

use crate::colormaps::{ColorValue, Rgba};
use crate::error::{Result, ViewerError};

/// A style given once for every item or once per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerItem<T> {
    All(T),
    Each(Vec<T>),
}

impl<T: Default> Default for PerItem<T> {
    fn default() -> Self {
        Self::All(T::default())
    }
}

impl<T: Clone> PerItem<T> {
    pub fn resolve(&self, count: usize, what: &str) -> Result<Vec<T>> {
        match self {
            Self::All(value) => Ok(vec![value.clone(); count]),
            Self::Each(values) if values.len() == count => Ok(values.clone()),
            Self::Each(values) => Err(ViewerError::ShapeMismatch(format!(
                "{} {what} values given for {count} items",
                values.len()
            ))),
        }
    }
}

impl<T> From<T> for PerItem<T> {
    fn from(value: T) -> Self {
        Self::All(value)
    }
}

/// Per-item colours accepting names and hex strings as well as RGBA floats.
pub(crate) fn deserialize_rgba_items<'de, D>(
    deserializer: D,
) -> std::result::Result<PerItem<Rgba>, D::Error>
where
    D: Deserializer<'de>,
{
    let resolved = match PerItem::<ColorValue>::deserialize(deserializer)? {
        PerItem::All(color) => color.resolve().map(PerItem::All),
        PerItem::Each(colors) => colors
            .into_iter()
            .map(ColorValue::resolve)
            .collect::<Result<Vec<_>>>()
            .map(PerItem::Each),
    };
    resolved.map_err(de::Error::custom)
}

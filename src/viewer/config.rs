use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

fn default_title() -> String {
    "ndview".to_string()
}

fn default_ndisplay() -> usize {
    2
}

/// Initial viewer state; layers are added afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_ndisplay")]
    pub ndisplay: usize,
    /// Starting axis order; its length fixes the starting rank.
    #[serde(default)]
    pub order: Option<Vec<usize>>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            ndisplay: default_ndisplay(),
            order: None,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.ndisplay, 2 | 3) {
            return Err(ViewerError::InvalidNdisplay(self.ndisplay));
        }
        if let Some(order) = &self.order {
            let mut sorted = order.clone();
            sorted.sort_unstable();
            if sorted.iter().enumerate().any(|(index, axis)| index != *axis) {
                return Err(ViewerError::InvalidOrder {
                    order: order.clone(),
                    ndim: order.len(),
                });
            }
        }
        Ok(())
    }

    /// Rank the viewer starts with before any layer is added.
    pub fn ndim(&self) -> usize {
        self.order.as_ref().map_or(self.ndisplay, Vec::len)
    }
}

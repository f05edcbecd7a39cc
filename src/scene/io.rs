use std::fs;
use std::path::Path;

use log::info;

use super::{Result, SceneSpec, build_viewer};
use crate::viewer::ViewerModel;

pub fn load_spec(path: impl AsRef<Path>) -> Result<SceneSpec> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let spec = if matches!(extension.as_str(), "yaml" | "yml") {
        serde_yaml::from_str::<SceneSpec>(&raw)?
    } else {
        serde_json::from_str::<SceneSpec>(&raw)?
    };
    spec.validate()?;
    info!(
        "loaded scene `{}` with {} layers from {}",
        spec.viewer.title,
        spec.layers.len(),
        path.display()
    );
    Ok(spec)
}

/// Reads a scene file and builds the viewer it describes.
pub fn load_scene(path: impl AsRef<Path>) -> Result<ViewerModel> {
    let spec = load_spec(path)?;
    build_viewer(&spec)
}

mod build;
mod error;
mod io;
mod spec;

#[cfg(test)]
mod tests;

pub use build::build_viewer;
pub use error::{Result, SceneError};
pub use io::{load_scene, load_spec};
pub use spec::{
    ArraySpec, ImageSpec, LabelsSpec, LayerSpec, PointsSpec, SceneSpec, ShapesSpec, VectorsSpec,
};

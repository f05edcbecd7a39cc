use thiserror::Error;

use crate::error::ViewerError;

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene specification parse failure: {0}")]
    Parse(String),

    #[error("scene I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene serialization failure: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("scene YAML serialization failure: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("viewer rejected the scene: {0}")]
    Viewer(#[from] ViewerError),
}

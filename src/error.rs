use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

/// Coarse classification callers use to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    ShapeMismatch,
    Export,
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("axis {axis} is out of bounds for {ndim} dimensions")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    #[error("invalid range for axis {axis}: ({min}, {max}, {step}) needs min <= max and step > 0")]
    InvalidRange {
        axis: usize,
        min: f64,
        max: f64,
        step: f64,
    },

    #[error("invalid dimension order {order:?}: expected a permutation of 0..{ndim}")]
    InvalidOrder { order: Vec<usize>, ndim: usize },

    #[error("ndisplay must be 2 or 3, got {0}")]
    InvalidNdisplay(usize),

    #[error("cannot reduce selected label below 0, got {0}")]
    NegativeLabel(i64),

    #[error("mode not recognized: `{0}`")]
    UnknownMode(String),

    #[error("layer index {index} is out of range for {len} layers")]
    LayerIndex { index: usize, len: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("raster encoding failure: {0}")]
    Image(#[from] image::ImageError),
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ShapeMismatch(_) => ErrorKind::ShapeMismatch,
            Self::Image(_) => ErrorKind::Export,
            Self::AxisOutOfBounds { .. }
            | Self::InvalidRange { .. }
            | Self::InvalidOrder { .. }
            | Self::InvalidNdisplay(_)
            | Self::NegativeLabel(_)
            | Self::UnknownMode(_)
            | Self::LayerIndex { .. }
            | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use super::{Result, SceneError};
use crate::layers::{ImageOptions, LabelsOptions, PointsOptions, ShapesOptions, VectorsOptions};
use crate::viewer::ViewerConfig;

/// A viewer plus the layers to load into it, bottom layer first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneSpec {
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayerSpec {
    Image(ImageSpec),
    Labels(LabelsSpec),
    Points(PointsSpec),
    Shapes(ShapesSpec),
    Vectors(VectorsSpec),
}

/// Dense array given by shape and either explicit row-major values, a
/// constant fill or a `0, 1, 2, ...` ramp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArraySpec {
    pub shape: Vec<usize>,
    #[serde(default)]
    pub values: Option<Vec<f64>>,
    #[serde(default)]
    pub fill: f64,
    #[serde(default)]
    pub ramp: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSpec {
    pub data: ArraySpec,
    #[serde(flatten)]
    pub options: ImageOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelsSpec {
    pub data: ArraySpec,
    #[serde(flatten)]
    pub options: LabelsOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointsSpec {
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
    #[serde(flatten)]
    pub options: PointsOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShapesSpec {
    /// Vertex lists, one per shape.
    #[serde(default)]
    pub shapes: Vec<Vec<Vec<f64>>>,
    #[serde(flatten)]
    pub options: ShapesOptions,
}

/// Either `[start, projection]` pairs or an image-like `field` whose
/// trailing axis holds the projection at each grid position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorsSpec {
    #[serde(default)]
    pub vectors: Vec<[Vec<f64>; 2]>,
    #[serde(default)]
    pub field: Option<ArraySpec>,
    #[serde(flatten)]
    pub options: VectorsOptions,
}

impl SceneSpec {
    pub fn validate(&self) -> Result<()> {
        if self.viewer.title.trim().is_empty() {
            return Err(SceneError::Parse("viewer title must not be empty".to_string()));
        }
        self.viewer.validate()?;
        for (index, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|message| SceneError::Parse(format!("layer {index}: {message}")))?;
        }
        Ok(())
    }
}

impl LayerSpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Labels(_) => "labels",
            Self::Points(_) => "points",
            Self::Shapes(_) => "shapes",
            Self::Vectors(_) => "vectors",
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Image(spec) => spec.data.validate(),
            Self::Labels(spec) => {
                spec.data.validate()?;
                let label_like = |value: &f64| {
                    value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(value)
                };
                let values_ok = spec.data.values.iter().flatten().all(label_like);
                if values_ok && label_like(&spec.data.fill) {
                    Ok(())
                } else {
                    Err("label values must be non-negative integers".to_string())
                }
            }
            Self::Points(spec) => uniform_rows(&spec.coordinates, "point").map(|_| ()),
            Self::Shapes(spec) => spec
                .shapes
                .iter()
                .enumerate()
                .try_for_each(|(index, vertices)| {
                    uniform_rows(vertices, &format!("shape {index} vertex")).map(|_| ())
                }),
            Self::Vectors(spec) => match (&spec.field, spec.vectors.is_empty()) {
                (Some(_), false) => {
                    Err("vectors take either `vectors` pairs or a `field`, not both".to_string())
                }
                (Some(field), true) => field.validate(),
                (None, _) => Ok(()),
            },
        }
    }
}

impl ArraySpec {
    fn validate(&self) -> std::result::Result<(), String> {
        let len = self.shape.iter().product::<usize>();
        if self.shape.is_empty() || len == 0 {
            return Err(format!("array shape {:?} holds no elements", self.shape));
        }
        match &self.values {
            Some(_) if self.ramp => {
                Err("array takes either `values` or `ramp`, not both".to_string())
            }
            Some(values) if values.len() != len => Err(format!(
                "{} values given for shape {:?} ({len} elements)",
                values.len(),
                self.shape
            )),
            _ if !self.fill.is_finite() => Err(format!("fill must be finite, got {}", self.fill)),
            _ => Ok(()),
        }
    }

    /// Materializes the array; shape and values were checked by `validate`.
    pub fn to_array(&self) -> Result<ArrayD<f64>> {
        let len = self.shape.iter().product::<usize>();
        let values = match &self.values {
            Some(values) => values.clone(),
            None if self.ramp => (0..len).map(|value| value as f64).collect(),
            None => vec![self.fill; len],
        };
        ArrayD::from_shape_vec(IxDyn(&self.shape), values)
            .map_err(|error| SceneError::Parse(error.to_string()))
    }
}

/// Common row length of a coordinate list, or an error naming the first
/// ragged row.
pub(crate) fn uniform_rows(
    rows: &[Vec<f64>],
    what: &str,
) -> std::result::Result<Option<usize>, String> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    match rows.iter().position(|row| row.len() != first.len()) {
        Some(index) => Err(format!(
            "{what} {index} has {} coordinates, expected {}",
            rows[index].len(),
            first.len()
        )),
        None => Ok(Some(first.len())),
    }
}

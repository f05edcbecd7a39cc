use log::info;
use ndarray::Array2;

use super::spec::{LayerSpec, uniform_rows};
use super::{Result, SceneError, SceneSpec};
use crate::layers::Vectors;
use crate::viewer::ViewerModel;

/// Builds a viewer from its configuration and adds every layer in order.
pub fn build_viewer(spec: &SceneSpec) -> Result<ViewerModel> {
    spec.validate()?;
    let mut viewer = ViewerModel::from_config(&spec.viewer)?;
    for layer in &spec.layers {
        let index = add_layer(&mut viewer, layer)?;
        info!(
            "scene layer {index}: {} `{}`",
            layer.kind_name(),
            viewer.layers().get(index).map(|layer| layer.name()).unwrap_or_default()
        );
    }
    Ok(viewer)
}

fn add_layer(viewer: &mut ViewerModel, spec: &LayerSpec) -> Result<usize> {
    let index = match spec {
        LayerSpec::Image(spec) => {
            let data = spec.data.to_array()?.mapv(|value| value as f32);
            viewer.add_image(data, spec.options.clone())?
        }
        LayerSpec::Labels(spec) => {
            let data = spec.data.to_array()?.mapv(|value| value as u32);
            viewer.add_labels(data, spec.options.clone())?
        }
        LayerSpec::Points(spec) => {
            let ndim = spec.options.ndim.unwrap_or(2);
            let data = rows_to_array(&spec.coordinates, ndim, "point")?;
            viewer.add_points(data, spec.options.clone())?
        }
        LayerSpec::Shapes(spec) => {
            let data = spec
                .shapes
                .iter()
                .enumerate()
                .map(|(index, vertices)| {
                    rows_to_array(vertices, 2, &format!("shape {index} vertex"))
                })
                .collect::<Result<Vec<_>>>()?;
            viewer.add_shapes(data, spec.options.clone())?
        }
        LayerSpec::Vectors(spec) => {
            let layer = match &spec.field {
                Some(field) => Vectors::from_image(field.to_array()?, spec.options.clone())?,
                None => Vectors::from_pairs(&spec.vectors, spec.options.clone())?,
            };
            viewer.add_layer(Box::new(layer))?
        }
    };
    Ok(index)
}

/// Stacks equal-length rows into an `(N, D)` array; `ndim` sets `D` when
/// there are no rows.
fn rows_to_array(rows: &[Vec<f64>], ndim: usize, what: &str) -> Result<Array2<f64>> {
    let ncols = uniform_rows(rows, what)
        .map_err(SceneError::Parse)?
        .unwrap_or(ndim);
    let flat = rows.iter().flatten().copied().collect::<Vec<_>>();
    Array2::from_shape_vec((rows.len(), ncols), flat)
        .map_err(|error| SceneError::Parse(error.to_string()))
}

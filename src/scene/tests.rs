use std::fs;

use tempfile::tempdir;

use super::{
    ArraySpec, ImageSpec, LayerSpec, SceneError, SceneSpec, build_viewer, load_scene, load_spec,
};
use crate::colormaps::Colormap;
use crate::layers::{Image, ImageOptions, Labels, Layer, Points, Shapes, Vectors};
use crate::viewer::ViewerConfig;

const YAML_SCENE: &str = r##"
viewer:
  title: cells
  ndisplay: 2
layers:
  - kind: image
    name: raw
    colormap: green
    data:
      shape: [3, 4, 5]
      ramp: true
  - kind: labels
    data:
      shape: [4, 5]
      fill: 2
  - kind: points
    coordinates: [[1, 1], [2, 3]]
    face_color: red
    size: 2
  - kind: shapes
    shapes:
      - [[0, 0], [2, 3]]
    edge_color: "#00ff00"
  - kind: vectors
    vectors:
      - [[1, 1], [0, 2]]
"##;

#[test]
fn yaml_scene_builds_every_layer_kind() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scene.yaml");
    fs::write(&path, YAML_SCENE).expect("write scene");

    let viewer = load_scene(&path).expect("scene");
    assert_eq!(viewer.title(), "cells");
    assert_eq!(viewer.layers().len(), 5);
    assert_eq!(viewer.dims().ndim(), 3);

    let image = viewer.layer_as::<Image>(0).expect("image");
    assert_eq!(image.name(), "raw");
    assert_eq!(image.colormap(), Colormap::Green);
    assert_eq!(image.data()[[2, 3, 4]], 59.0);

    let labels = viewer.layer_as::<Labels>(1).expect("labels");
    assert!(labels.data().iter().all(|label| *label == 2));

    let points = viewer.layer_as::<Points>(2).expect("points");
    assert_eq!(points.len(), 2);
    assert_eq!(points.face_color(), [1.0, 0.0, 0.0, 1.0]);

    let shapes = viewer.layer_as::<Shapes>(3).expect("shapes");
    assert_eq!(shapes.len(), 1);
    assert!(viewer.layer_as::<Vectors>(4).is_some());
}

#[test]
fn json_scene_is_read_by_extension() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scene.json");
    let scene = serde_json::json!({
        "viewer": {"title": "volume", "ndisplay": 3},
        "layers": [
            {"kind": "image", "data": {"shape": [2, 3, 5], "fill": 1.5}}
        ]
    });
    fs::write(&path, scene.to_string()).expect("write scene");

    let spec = load_spec(&path).expect("spec");
    assert_eq!(spec.viewer.ndisplay, 3);
    let viewer = build_viewer(&spec).expect("viewer");
    assert_eq!(viewer.dims().ndisplay(), 3);
    let image = viewer.layer_as::<Image>(0).expect("image");
    assert_eq!(image.data_view().shape(), &[2, 3, 5]);
}

#[test]
fn mismatched_values_are_rejected_before_building() {
    let spec = SceneSpec {
        viewer: ViewerConfig::default(),
        layers: vec![LayerSpec::Image(ImageSpec {
            data: ArraySpec {
                shape: vec![2, 2],
                values: Some(vec![1.0, 2.0, 3.0]),
                fill: 0.0,
                ramp: false,
            },
            options: ImageOptions::default(),
        })],
    };
    let error = build_viewer(&spec).expect_err("three values for four pixels");
    assert!(matches!(error, SceneError::Parse(message) if message.starts_with("layer 0")));
}

#[test]
fn fractional_labels_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("labels.yml");
    fs::write(
        &path,
        "layers:\n  - kind: labels\n    data: {shape: [2], values: [1.5, 2]}\n",
    )
    .expect("write scene");
    assert!(matches!(load_spec(&path), Err(SceneError::Parse(_))));
}

#[test]
fn bad_viewer_config_surfaces_the_viewer_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scene.yaml");
    fs::write(&path, "viewer:\n  ndisplay: 5\n").expect("write scene");
    assert!(matches!(load_spec(&path), Err(SceneError::Viewer(_))));

    fs::write(&path, "viewer:\n  title: \"  \"\n").expect("write scene");
    assert!(matches!(load_spec(&path), Err(SceneError::Parse(_))));
}

#[test]
fn unknown_layer_kind_is_a_parse_failure() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scene.yaml");
    fs::write(&path, "layers:\n  - kind: surface\n").expect("write scene");
    assert!(matches!(load_spec(&path), Err(SceneError::SerdeYaml(_))));
}

#[test]
fn ragged_points_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scene.yaml");
    fs::write(
        &path,
        "layers:\n  - kind: points\n    coordinates: [[1, 2], [3]]\n",
    )
    .expect("write scene");
    let error = load_spec(&path).expect_err("ragged");
    assert!(error.to_string().contains("point 1 has 1 coordinates"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let error = load_scene(dir.path().join("absent.yaml")).expect_err("missing");
    assert!(matches!(error, SceneError::Io(_)));
}

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array2, ArrayD, IxDyn, array};

use super::reconcile::{layer_point, reconcile_layer};
use super::{ResetView, ViewerConfig, ViewerModel};
use crate::dims::Dims;
use crate::error::{ErrorKind, ViewerError};
use crate::interaction::MouseEvent;
use crate::layers::{
    Cursor, Image, ImageOptions, Labels, LabelsMode, LabelsOptions, Layer, Points, PointsMode,
    PointsOptions, Shapes, ShapesOptions,
};

fn ramp(shape: &[usize]) -> ArrayD<f32> {
    let len = shape.iter().product::<usize>();
    ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|value| value as f32).collect())
        .expect("ramp shape")
}

fn scattered_points() -> Array2<f64> {
    array![
        [1.0, 2.0],
        [3.0, 14.0],
        [9.0, 7.0],
        [4.5, 3.0],
        [2.0, 11.0],
        [8.0, 2.5],
        [6.0, 6.0],
        [7.0, 13.0],
        [5.0, 9.0],
        [1.5, 4.0]
    ]
}

/// Image of shape (6, 10, 15) under ten 2D points.
fn mixed_viewer() -> ViewerModel {
    let mut viewer = ViewerModel::new();
    viewer
        .add_image(ramp(&[6, 10, 15]), ImageOptions::default())
        .expect("image");
    viewer
        .add_points(scattered_points(), PointsOptions::default())
        .expect("points");
    viewer
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn mixed_ranks_share_trailing_axes() {
    let viewer = mixed_viewer();
    let dims = viewer.dims();
    assert_eq!(dims.ndim(), 3);
    let spans = dims
        .range()
        .iter()
        .map(|range| (range.min, range.max))
        .collect::<Vec<_>>();
    assert_eq!(spans, vec![(0.0, 6.0), (0.0, 10.0), (0.0, 15.0)]);

    let points = viewer.layers().get(1).expect("points layer");
    assert_eq!(points.base().dims().order(), &[0, 1]);
    assert_eq!(points.base().dims().displayed(), &[0, 1]);
}

#[test]
fn reconciling_twice_changes_nothing() {
    let mut viewer = mixed_viewer();
    assert_eq!(viewer.update_layers().expect("reconcile"), 0);
    viewer.set_point(0, 3.0).expect("point");
    assert_eq!(viewer.update_layers().expect("reconcile"), 0);
}

#[test]
fn global_order_reaches_every_layer() {
    let mut viewer = mixed_viewer();
    assert!(viewer.set_order(vec![2, 0, 1]).expect("order"));

    let image = viewer.layer_as::<Image>(0).expect("image");
    assert_eq!(image.base().dims().order(), &[2, 0, 1]);
    assert_eq!(image.data_view().shape(), &[6, 10]);

    let points = viewer.layers().get(1).expect("points layer");
    assert_eq!(points.base().dims().order(), &[1, 0]);
}

#[test]
fn point_changes_only_touch_layers_with_that_axis() {
    let mut viewer = mixed_viewer();
    assert!(viewer.set_point(0, 3.0).expect("point"));

    let image = viewer.layer_as::<Image>(0).expect("image");
    assert_eq!(image.base().dims().point(), &[3.0, 0.0, 0.0]);
    assert_eq!(image.data_view()[[2, 4]], image.data()[[3, 2, 4]]);

    // Follows the viewer on its own axes, untouched by axis 0.
    let points = viewer.layers().get(1).expect("points layer");
    assert_eq!(points.base().dims().point(), &[0.0, 0.0]);
    assert!(!viewer.set_point(0, 3.0).expect("point"));
}

#[test]
fn annotation_layers_slice_at_the_viewer_position() {
    let mut viewer = ViewerModel::new();
    viewer
        .add_image(ramp(&[6, 10, 15]), ImageOptions::default())
        .expect("image");
    viewer
        .add_points(array![[3.0, 2.0, 2.0], [4.0, 5.0, 5.0]], PointsOptions::default())
        .expect("points");
    viewer
        .add_shapes(
            vec![array![[2.0, 1.0, 1.0], [2.0, 4.0, 4.0]]],
            ShapesOptions::default(),
        )
        .expect("shapes");
    assert_eq!(viewer.dims().range()[0].max, 6.0);

    let expectations: [(f64, &[usize], &[usize]); 5] = [
        (0.0, &[], &[]),
        (2.0, &[], &[0]),
        (3.0, &[0], &[]),
        (4.0, &[1], &[]),
        (5.0, &[], &[]),
    ];
    for (position, points_visible, shapes_visible) in expectations {
        viewer.set_point(0, position).expect("point");
        let points = viewer.layer_as::<Points>(1).expect("points");
        assert_eq!(points.base().dims().point()[0], position);
        assert_eq!(points.indices_view(), points_visible, "points at z={position}");
        let shapes = viewer.layer_as::<Shapes>(2).expect("shapes");
        assert_eq!(shapes.indices_view(), shapes_visible, "shapes at z={position}");
    }
}

#[test]
fn shallow_raster_shows_its_nearest_plane_past_its_depth() {
    let mut viewer = ViewerModel::new();
    viewer
        .add_image(ramp(&[6, 10, 15]), ImageOptions::default())
        .expect("image");
    let planes = ArrayD::from_shape_fn(IxDyn(&[2, 10, 15]), |index| index[0] as u32 + 1);
    viewer
        .add_labels(planes, LabelsOptions::default())
        .expect("labels");

    viewer.set_point(0, 1.0).expect("point");
    let labels = viewer.layer_as::<Labels>(1).expect("labels");
    assert!(labels.data_labels().iter().all(|label| *label == 2));

    viewer.set_point(0, 4.0).expect("point");
    let labels = viewer.layer_as::<Labels>(1).expect("labels");
    assert_eq!(labels.base().dims().point()[0], 4.0);
    assert_eq!(labels.data_labels().shape(), &[10, 15]);
    assert!(labels.data_labels().iter().all(|label| *label == 2));
    let image = viewer.layer_as::<Image>(0).expect("image");
    assert_eq!(image.data_view()[[0, 0]], image.data()[[4, 0, 0]]);
}

#[test]
fn point_is_clamped_to_the_global_range() {
    let mut viewer = mixed_viewer();
    viewer.set_point(0, 40.0).expect("point");
    assert_eq!(viewer.dims().point()[0], 6.0);
    let image = viewer.layer_as::<Image>(0).expect("image");
    assert_eq!(image.data_view()[[0, 0]], image.data()[[5, 0, 0]]);
}

#[test]
fn switching_to_3d_resets_to_an_arcball() {
    let mut viewer = mixed_viewer();
    let views = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&views);
    viewer
        .events
        .reset_view
        .connect(move |view| sink.borrow_mut().push(view.clone()));

    viewer.set_ndisplay(3).expect("ndisplay");
    let image = viewer.layer_as::<Image>(0).expect("image");
    assert_eq!(image.data_view().shape(), &[6, 10, 15]);
    let points = viewer.layers().get(1).expect("points layer");
    assert_eq!(points.base().dims().ndisplay(), 3);
    assert_eq!(points.base().dims().displayed(), &[0, 1]);

    let views = views.borrow();
    assert_eq!(views.len(), 1);
    match &views[0] {
        ResetView::Arcball {
            center,
            scale_factor,
        } => {
            assert_eq!(center, &vec![3.0, 5.0, 7.5]);
            assert_close(*scale_factor, 15.5);
        }
        other => panic!("expected an arcball, got {other:?}"),
    }
}

#[test]
fn first_layer_frames_a_padded_viewbox() {
    let mut viewer = ViewerModel::new();
    viewer
        .add_image(ramp(&[6, 10, 15]), ImageOptions::default())
        .expect("image");
    match viewer.reset_view() {
        ResetView::Viewbox {
            x,
            y,
            width,
            height,
        } => {
            assert_close(x, -0.75);
            assert_close(y, -0.5);
            assert_close(width, 16.5);
            assert_close(height, 11.0);
        }
        other => panic!("expected a viewbox, got {other:?}"),
    }
}

#[test]
fn layer_point_leaves_extra_leading_axes_alone() {
    let mut global = Dims::new(2);
    global.set_range(0, (0.0, 10.0, 1.0)).expect("range");
    global.set_point(0, 4.0).expect("point");
    assert_eq!(layer_point(&global, 3), vec![None, Some(4.0), Some(0.0)]);
    assert_eq!(layer_point(&global, 1), vec![Some(0.0)]);
}

#[test]
fn layer_with_more_axes_than_viewer_keeps_leading_state() {
    let global = Dims::new(2);
    let mut image = Image::new(ramp(&[4, 5, 6]), ImageOptions::default()).expect("image");
    image
        .sync_dims(vec![0, 1, 2], 2, &[Some(2.0), None, None])
        .expect("sync");

    assert!(!reconcile_layer(&global, &mut image).expect("reconcile"));
    assert_eq!(image.base().dims().order(), &[0, 1, 2]);
    assert_eq!(image.base().dims().point()[0], 2.0);
}

#[test]
fn configured_order_survives_the_first_layer() {
    let config = ViewerConfig {
        order: Some(vec![1, 0, 2, 3]),
        ..ViewerConfig::default()
    };
    let mut viewer = ViewerModel::from_config(&config).expect("viewer");
    viewer
        .add_image(ramp(&[2, 5, 8, 9]), ImageOptions::default())
        .expect("image");
    assert_eq!(viewer.dims().order(), &[1, 0, 2, 3]);
    let image = viewer.layers().get(0).expect("image layer");
    assert_eq!(image.base().dims().order(), &[1, 0, 2, 3]);
}

#[test]
fn invalid_config_is_rejected() {
    let config = ViewerConfig {
        ndisplay: 4,
        ..ViewerConfig::default()
    };
    let error = ViewerModel::from_config(&config).expect_err("ndisplay 4");
    assert!(matches!(error, ViewerError::InvalidNdisplay(4)));

    let config = ViewerConfig {
        order: Some(vec![0, 0, 1]),
        ..ViewerConfig::default()
    };
    let error = ViewerModel::from_config(&config).expect_err("repeated axis");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn removing_a_layer_shrinks_the_dims() {
    let mut viewer = mixed_viewer();
    viewer.set_order(vec![0, 2, 1]).expect("order");
    let removed = viewer.remove_layer(0).expect("remove");
    assert_eq!(removed.name(), "Image");
    assert_eq!(viewer.dims().ndim(), 2);
    assert_eq!(viewer.dims().order(), &[1, 0]);
    let points = viewer.layers().get(0).expect("points layer");
    assert_eq!(points.base().dims().order(), &[1, 0]);
}

#[test]
fn active_layer_follows_a_single_selection() {
    let mut viewer = mixed_viewer();
    let points_id = viewer.layers().get(1).map(|layer| layer.base().id());
    assert_eq!(viewer.active_layer(), points_id);

    viewer.toggle_layer_selection(0).expect("toggle");
    assert_eq!(viewer.active_layer(), None);
    assert_eq!(viewer.status(), "Ready");
    assert_eq!(viewer.cursor(), Cursor::Standard);

    viewer.select_layer(0).expect("select");
    let image_id = viewer.layers().get(0).map(|layer| layer.base().id());
    assert_eq!(viewer.active_layer(), image_id);

    viewer.unselect_all();
    assert_eq!(viewer.active_layer(), None);
    assert_eq!(viewer.help(), "");
}

#[test]
fn painting_through_the_viewer_targets_the_current_plane() {
    let mut viewer = ViewerModel::new();
    let index = viewer
        .add_labels(ArrayD::zeros(IxDyn(&[4, 10, 10])), LabelsOptions::default())
        .expect("labels");
    viewer
        .update_layer_as::<Labels, _>(index, |labels| {
            labels.set_mode(LabelsMode::Paint);
            labels.set_brush_size(1.0)?;
            labels.set_selected_label(3)
        })
        .expect("labels layer")
        .expect("configure");
    assert_eq!(viewer.cursor(), Cursor::Square);
    assert!(!viewer.interactive());

    viewer.set_point(0, 2.0).expect("point");
    let coordinate = viewer.canvas_to_data(&[5.0, 5.0]).expect("coordinate");
    assert_eq!(coordinate, vec![2.0, 5.0, 5.0]);
    viewer
        .on_mouse_press(&MouseEvent::press(coordinate.clone()))
        .expect("press");
    viewer
        .on_mouse_release(&MouseEvent::release(coordinate))
        .expect("release");

    let labels = viewer.layer_as::<Labels>(index).expect("labels");
    assert_eq!(labels.data()[[2, 5, 5]], 3);
    assert_eq!(labels.data()[[0, 5, 5]], 0);
    assert_eq!(labels.data()[[2, 5, 6]], 0);
    assert!(viewer.status().starts_with("Labels [2, 5, 5]"));
}

#[test]
fn adding_a_point_by_mouse_widens_the_dims() {
    let mut viewer = ViewerModel::new();
    let index = viewer
        .add_points(array![[1.0, 1.0], [2.0, 2.0]], PointsOptions::default())
        .expect("points");
    viewer
        .update_layer_as::<Points, _>(index, |points| points.set_mode(PointsMode::Add))
        .expect("points layer");

    viewer
        .on_mouse_press(&MouseEvent::press(vec![8.0, 9.0]))
        .expect("press");
    let points = viewer.layer_as::<Points>(index).expect("points");
    assert_eq!(points.len(), 3);
    assert_eq!(viewer.dims().range()[1].max, 9.0);
}

#[test]
fn short_pointer_coordinates_are_rejected() {
    let mut viewer = mixed_viewer();
    viewer.select_layer(0).expect("select");
    let error = viewer
        .on_mouse_press(&MouseEvent::press(vec![1.0, 1.0]))
        .expect_err("image has three axes");
    assert_eq!(error.kind(), ErrorKind::ShapeMismatch);
}

#[test]
fn wrong_kind_downcast_is_an_error() {
    let mut viewer = mixed_viewer();
    let error = viewer
        .update_layer_as::<Labels, _>(0, |_| ())
        .expect_err("image is not labels");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    assert!(viewer.layer_as::<Labels>(0).is_none());
}

#[test]
fn new_annotation_layers_match_the_viewer() {
    let mut viewer = ViewerModel::new();
    let index = viewer.new_labels().expect("labels");
    let labels = viewer.layer_as::<Labels>(index).expect("labels");
    assert_eq!(labels.data().shape(), &[512, 512]);

    let mut viewer = mixed_viewer();
    let index = viewer.new_labels().expect("labels");
    let labels = viewer.layer_as::<Labels>(index).expect("labels");
    assert_eq!(labels.data().shape(), &[6, 10, 15]);
    let index = viewer.new_points().expect("points");
    assert_eq!(viewer.layers().get(index).map(|layer| layer.ndim()), Some(3));
}

#[test]
fn svg_export_holds_visible_layers() {
    let mut viewer = ViewerModel::new();
    viewer
        .add_image(ramp(&[4, 5]), ImageOptions::default())
        .expect("image");
    viewer
        .add_points(array![[1.0, 2.0], [3.0, 4.0]], PointsOptions::default())
        .expect("points");

    let svg = viewer.to_svg(None).expect("svg");
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains("width=\"5\""));
    assert!(svg.contains("height=\"4\""));
    assert!(svg.contains("<image"));
    assert_eq!(svg.matches("<circle").count(), 2);

    viewer
        .update_layer(1, |layer| layer.base_mut().set_visible(false))
        .expect("hide points");
    let svg = viewer.to_svg(Some([0.0, 0.0, 10.0, 10.0])).expect("svg");
    assert!(svg.contains("viewBox=\"0 0 10 10\""));
    assert!(!svg.contains("<circle"));
}

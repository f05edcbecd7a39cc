use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use ndarray::{Array2, Array3, ArrayD, IxDyn, array};

use super::{
    Blending, Image, ImageOptions, Layer, LayerKind, LayerList, LayerOptions, LayerValue, Labels,
    LabelsOptions, PerItem, PointSize, Points, PointsMode, PointsOptions, Shape, ShapeType,
    Shapes, ShapesOptions, THUMBNAIL_SHAPE, Vectors, VectorsOptions, XmlElement,
};
use crate::error::{ErrorKind, ViewerError};
use crate::interaction::{Modifiers, MouseEvent};

fn ramp(shape: &[usize]) -> ArrayD<f32> {
    let len = shape.iter().product::<usize>();
    ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|value| value as f32).collect())
        .expect("ramp shape")
}

fn points(data: Array2<f64>) -> Points {
    Points::new(data, PointsOptions::default()).expect("points layer")
}

#[test]
fn image_slices_follow_dims_order() {
    let mut image = Image::new(ramp(&[6, 10, 15]), ImageOptions::default()).expect("image");
    assert_eq!(image.ndim(), 3);
    assert_eq!(image.data_view().shape(), &[10, 15]);

    image
        .sync_dims(vec![2, 0, 1], 2, &[Some(0.0), Some(0.0), Some(4.0)])
        .expect("sync");
    assert_eq!(image.base().dims().displayed(), &[0, 1]);
    assert_eq!(image.data_view().shape(), &[6, 10]);
    assert_eq!(image.data_view()[[1, 2]], image.data()[[1, 2, 4]]);

    image
        .sync_dims(vec![0, 2, 1], 2, &[Some(3.0), None, None])
        .expect("sync");
    assert_eq!(image.data_view().shape(), &[15, 10]);
    assert_eq!(image.data_view()[[4, 7]], image.data()[[3, 7, 4]]);
}

#[test]
fn image_range_and_index_clamp() {
    let mut image = Image::new(ramp(&[4, 5, 6]), ImageOptions::default()).expect("image");
    let range = image.range();
    assert_eq!((range[0].min, range[0].max, range[0].step), (0.0, 4.0, 1.0));
    image
        .sync_dims(vec![0, 1, 2], 2, &[Some(4.0), None, None])
        .expect("sync");
    assert_eq!(image.data_view()[[0, 0]], image.data()[[3, 0, 0]]);
}

#[test]
fn volume_display_keeps_three_axes() {
    let mut image = Image::new(ramp(&[4, 5, 6]), ImageOptions::default()).expect("image");
    image.sync_dims(vec![0, 1, 2], 3, &[]).expect("sync");
    assert_eq!(image.data_view().shape(), &[4, 5, 6]);
    assert_eq!(
        image.base().thumbnail().dim(),
        (THUMBNAIL_SHAPE.0, THUMBNAIL_SHAPE.1, 4)
    );
}

#[test]
fn rgb_images_keep_channels_last() {
    let image = Image::new(ramp(&[4, 5, 3]), ImageOptions::default()).expect("image");
    assert!(image.multichannel());
    assert_eq!(image.ndim(), 2);
    assert_eq!(image.data_view().shape(), &[4, 5, 3]);
}

#[test]
fn image_value_under_cursor() {
    let mut image = Image::new(ramp(&[3, 4]), ImageOptions::default()).expect("image");
    image.set_coordinates(&[1.2, 2.8]).expect("cursor");
    assert_eq!(image.get_value(), Some(LayerValue::Scalar(7.0)));
    assert_eq!(image.base().status(), "Image [1, 3], 7.000");
    image.set_coordinates(&[-3.0, 2.0]).expect("cursor");
    assert_eq!(image.get_value(), None);
}

#[test]
fn contrast_limits_are_validated() {
    let mut image = Image::new(ramp(&[3, 4]), ImageOptions::default()).expect("image");
    assert_eq!(image.contrast_limits(), [0.0, 11.0]);
    let error = image.set_contrast_limits([2.0, 2.0]).expect_err("empty limits");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    image.set_contrast_limits([0.0, 20.0]).expect("limits");
    assert_eq!(image.contrast_limits(), [0.0, 20.0]);
}

#[test]
fn image_xml_is_a_png() {
    let image = Image::new(ramp(&[3, 4]), ImageOptions::default()).expect("image");
    let elements = image.to_xml_list().expect("xml");
    assert_eq!(elements[0].get("width"), Some("4"));
    assert_eq!(elements[0].get("height"), Some("3"));
    assert!(
        elements[0]
            .get("xlink:href")
            .is_some_and(|href| href.starts_with("data:image/png;base64,"))
    );
}

#[test]
fn transforms_must_match_rank() {
    let options = ImageOptions {
        layer: LayerOptions {
            scale: Some(vec![1.0, 2.0, 3.0]),
            ..LayerOptions::default()
        },
        ..ImageOptions::default()
    };
    let error = Image::new(ramp(&[3, 4]), options).expect_err("bad scale");
    assert!(matches!(error, ViewerError::ShapeMismatch(_)));

    let mut image = Image::new(ramp(&[3, 4]), ImageOptions::default()).expect("image");
    assert!(image.base_mut().set_translate(vec![1.0]).is_err());
    image.base_mut().set_translate(vec![1.0, 2.0]).expect("translate");
    assert_eq!(image.base().translate(), &[1.0, 2.0]);
}

#[test]
fn opacity_is_bounded_and_rethumbnails() {
    let mut labels = Labels::new(
        ArrayD::zeros(IxDyn(&[4, 4])),
        LabelsOptions::default(),
    )
    .expect("labels");
    let before = labels.base().events.thumbnail.delivered();
    labels.set_opacity(0.25).expect("opacity");
    assert_eq!(labels.base().events.thumbnail.delivered(), before + 1);
    assert!((labels.base().thumbnail()[[16, 16, 3]] - 0.25).abs() < 1e-6);
    assert!(labels.set_opacity(1.5).is_err());
    assert_eq!(labels.base().opacity(), 0.25);
}

#[test]
fn base_setters_notify_on_change_only() {
    let mut image = Image::new(ramp(&[3, 4]), ImageOptions::default()).expect("image");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    image
        .base()
        .events
        .visible
        .connect(move |visible| sink.borrow_mut().push(*visible));
    image.base_mut().set_visible(true);
    image.base_mut().set_visible(false);
    image.base_mut().set_visible(false);
    assert_eq!(*seen.borrow(), vec![false]);

    image.base_mut().set_blending(Blending::Additive);
    assert_eq!(image.base().blending(), Blending::Additive);
    assert!("screen".parse::<Blending>().is_err());
}

#[test]
fn sync_dims_refreshes_only_on_change() {
    let mut image = Image::new(ramp(&[4, 5, 6]), ImageOptions::default()).expect("image");
    let before = image.base().events.set_data.delivered();
    assert!(
        image
            .sync_dims(vec![0, 1, 2], 2, &[Some(1.0), None, None])
            .expect("sync")
    );
    assert!(
        !image
            .sync_dims(vec![0, 1, 2], 2, &[Some(1.0), None, None])
            .expect("sync")
    );
    assert_eq!(image.base().events.set_data.delivered(), before + 1);
}

#[test]
fn points_slice_on_hidden_axes() {
    let data = array![[0.0, 1.0, 1.0], [1.0, 2.0, 2.0], [1.2, 3.0, 3.0]];
    let mut layer = points(data);
    assert_eq!(layer.indices_view(), &[0]);

    layer
        .sync_dims(vec![0, 1, 2], 2, &[Some(1.0), None, None])
        .expect("sync");
    assert_eq!(layer.indices_view(), &[1, 2]);
    assert_eq!(layer.data_view().row(0).to_vec(), vec![2.0, 2.0]);
}

#[test]
fn n_dimensional_points_shrink_away_from_slice() {
    let data = array![[0.0, 1.0, 1.0], [3.0, 2.0, 2.0], [20.0, 3.0, 3.0]];
    let options = PointsOptions {
        size: PointSize::Uniform(10.0),
        n_dimensional: true,
        ..PointsOptions::default()
    };
    let layer = Points::new(data, options).expect("points");
    assert_eq!(layer.indices_view(), &[0, 1]);
    assert_eq!(layer.sizes_view()[0], 10.0);
    assert!((layer.sizes_view()[1] - 4.0).abs() < 1e-9);
}

#[test]
fn two_dimensional_points_show_everything() {
    let layer = points(Array2::from_shape_fn((10, 2), |(row, col)| (row * 2 + col) as f64));
    assert_eq!(layer.indices_view().len(), 10);
    assert_eq!(layer.base().dims().order(), &[0, 1]);
}

#[test]
fn point_sizes_must_broadcast() {
    let options = PointsOptions {
        size: PointSize::PerPoint(vec![1.0, 2.0, 3.0]),
        ..PointsOptions::default()
    };
    let error = Points::new(Array2::zeros((2, 2)), options).expect_err("sizes");
    assert_eq!(error.kind(), ErrorKind::ShapeMismatch);
}

#[test]
fn empty_points_have_unit_range() {
    let layer = points(Array2::zeros((0, 3)));
    assert_eq!(layer.ndim(), 3);
    assert!(layer.range().iter().all(|range| range.min == 0.0 && range.max == 1.0));
}

#[test]
fn points_add_select_and_remove() {
    let mut layer = points(array![[1.0, 1.0]]);
    layer.set_mode(PointsMode::Add);
    layer.handle_mouse(&MouseEvent::press([5.0, 6.0])).expect("add");
    assert_eq!(layer.len(), 2);
    assert_eq!(layer.range()[1].max, 6.0);

    layer.set_mode(PointsMode::Select);
    layer.handle_mouse(&MouseEvent::press([5.0, 6.0])).expect("select");
    assert_eq!(layer.selected(), vec![1]);
    let shift = Modifiers {
        shift: true,
        ..Modifiers::default()
    };
    layer
        .handle_mouse(&MouseEvent::press([1.0, 1.0]).with_modifiers(shift))
        .expect("extend");
    assert_eq!(layer.selected(), vec![0, 1]);

    layer.set_selected(BTreeSet::from([0]));
    assert_eq!(layer.remove_selected(), 1);
    assert_eq!(layer.data(), &array![[5.0, 6.0]]);
    assert!("lasso".parse::<PointsMode>().is_err());
}

#[test]
fn points_xml_uses_last_axes_as_xy() {
    let layer = points(array![[2.0, 7.0]]);
    let elements = layer.to_xml_list().expect("xml");
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].tag, "circle");
    assert_eq!(elements[0].get("cx"), Some("7"));
    assert_eq!(elements[0].get("cy"), Some("2"));
    assert_eq!(elements[0].get("r"), Some("5"));
}

fn rectangle(corner: [f64; 3], size: f64) -> Array2<f64> {
    array![
        [corner[0], corner[1], corner[2]],
        [corner[0], corner[1] + size, corner[2] + size]
    ]
}

#[test]
fn shapes_expand_corners_and_slice() {
    let data = vec![rectangle([0.0, 0.0, 0.0], 4.0), rectangle([2.0, 1.0, 1.0], 2.0)];
    let mut layer = Shapes::new(data, ShapesOptions::default()).expect("shapes");
    assert_eq!(layer.shapes()[0].vertices.nrows(), 4);
    assert_eq!(layer.indices_view(), &[0]);

    layer
        .sync_dims(vec![0, 1, 2], 2, &[Some(2.0), None, None])
        .expect("sync");
    assert_eq!(layer.indices_view(), &[1]);
}

#[test]
fn shapes_render_by_z_index() {
    let data = vec![
        array![[0.0, 0.0], [4.0, 4.0]],
        array![[1.0, 1.0], [2.0, 2.0]],
    ];
    let options = ShapesOptions {
        shape_type: PerItem::Each(vec![ShapeType::Rectangle, ShapeType::Line]),
        z_index: PerItem::Each(vec![3, 1]),
        ..ShapesOptions::default()
    };
    let layer = Shapes::new(data, options).expect("shapes");
    let tags = layer
        .to_xml_list()
        .expect("xml")
        .into_iter()
        .map(|element| element.tag)
        .collect::<Vec<_>>();
    assert_eq!(tags, vec!["line", "polygon"]);
}

#[test]
fn shape_styles_must_match_count() {
    let options = ShapesOptions {
        edge_width: PerItem::Each(vec![1.0]),
        ..ShapesOptions::default()
    };
    let data = vec![array![[0.0, 0.0], [1.0, 1.0]], array![[0.0, 0.0], [2.0, 2.0]]];
    let error = Shapes::new(data, options).expect_err("styles");
    assert_eq!(error.kind(), ErrorKind::ShapeMismatch);
    assert!(Shape::new(ShapeType::Polygon, array![[0.0, 0.0], [1.0, 1.0]]).is_err());
}

#[test]
fn vectors_from_image_field() {
    let field = ArrayD::from_shape_vec(
        IxDyn(&[2, 2, 2]),
        vec![1.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, -1.0],
    )
    .expect("field");
    let layer = Vectors::from_image(field, VectorsOptions::default()).expect("vectors");
    assert_eq!(layer.len(), 4);
    assert_eq!(layer.data()[[3, 0, 0]], 1.0);
    assert_eq!(layer.data()[[3, 0, 1]], 1.0);
    assert_eq!(layer.data()[[3, 1, 1]], -1.0);
    assert_eq!(layer.to_xml_list().expect("xml").len(), 4);
}

#[test]
fn vectors_slice_and_scale() {
    let data = Array3::from_shape_vec(
        (2, 2, 3),
        vec![0.0, 1.0, 1.0, 0.0, 2.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 2.0],
    )
    .expect("vectors");
    let mut layer = Vectors::new(data, VectorsOptions::default()).expect("vectors");
    assert_eq!(layer.indices_view(), &[0]);
    assert_eq!(layer.data_view()[[0, 1, 0]], 3.0);

    layer.set_length(2.0).expect("length");
    assert_eq!(layer.data_view()[[0, 1, 0]], 5.0);
    assert!(layer.set_length(-1.0).is_err());
    assert!(Vectors::new(Array3::zeros((1, 3, 2)), VectorsOptions::default()).is_err());
}

#[test]
fn layer_list_keeps_names_unique() {
    let mut list = LayerList::new();
    for _ in 0..3 {
        list.append(Box::new(points(array![[0.0, 0.0]])));
    }
    let names = list.iter().map(|layer| layer.name().to_string()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Points", "Points [1]", "Points [2]"]);
    assert_eq!(list.rename(2, "Points").expect("rename"), "Points [2]");
    assert_eq!(list.rename(0, "seeds").expect("rename"), "seeds");
    assert_eq!(list.by_name("seeds"), Some(0));
}

#[test]
fn layer_list_moves_and_removes() {
    let mut list = LayerList::new();
    list.append(Box::new(points(array![[0.0, 0.0]])));
    list.append(Box::new(
        Image::new(ramp(&[2, 2]), ImageOptions::default()).expect("image"),
    ));
    let reordered = list.events.reordered.delivered();
    list.move_layer(1, 0).expect("move");
    assert_eq!(list.events.reordered.delivered(), reordered + 1);
    assert_eq!(list.get(0).map(|layer| layer.kind()), Some(LayerKind::Image));
    assert!(matches!(
        list.move_layer(0, 5),
        Err(ViewerError::LayerIndex { index: 5, len: 2 })
    ));

    list.select_only(1).expect("select");
    assert_eq!(list.selected(), vec![1]);
    let removed = list.remove_selected();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kind(), LayerKind::Points);
    assert_eq!(list.len(), 1);
    assert!(list.remove(3).is_err());
}

#[test]
fn xml_escapes_attributes() {
    let element = XmlElement::new("text")
        .attr("label", "a<b & \"c\"")
        .child(XmlElement::new("tspan"));
    let rendered = element.to_string();
    assert!(rendered.contains("label=\"a&lt;b &amp; &quot;c&quot;\""));
    assert!(rendered.contains("<tspan />"));
    assert!(rendered.ends_with("</text>"));
}

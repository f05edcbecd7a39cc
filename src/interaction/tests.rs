use super::{MouseEvent, MouseEventKind, interpolate_coordinates};

#[test]
fn constructors_set_drag_flag() {
    let drag = MouseEvent::drag(vec![1.0, 2.0]);
    assert_eq!(drag.kind, MouseEventKind::Move);
    assert!(drag.is_dragging);
    assert!(!MouseEvent::hover([0.0, 0.0]).is_dragging);
    assert_eq!(MouseEvent::press([3.0, 4.0]).coordinate, vec![3.0, 4.0]);
}

#[test]
fn no_anchor_yields_current_position() {
    let coords = interpolate_coordinates(None, &[4.0, 5.0], 10.0);
    assert_eq!(coords, vec![vec![4.0, 5.0]]);
}

#[test]
fn interpolation_skips_anchor_and_ends_at_cursor() {
    let coords = interpolate_coordinates(Some(&[0.0, 0.0]), &[0.0, 10.0], 5.0);
    assert_eq!(coords.len(), 8);
    assert_eq!(coords.last().expect("end"), &vec![0.0, 10.0]);
    assert!(coords.iter().all(|c| c[1] > 0.0));
    for pair in coords.windows(2) {
        assert!((pair[1][1] - pair[0][1] - 1.25).abs() < 1e-9);
    }
}

#[test]
fn short_moves_produce_single_sample() {
    let coords = interpolate_coordinates(Some(&[1.0, 1.0]), &[1.1, 1.0], 10.0);
    assert_eq!(coords, vec![vec![1.1, 1.0]]);
}

#[test]
fn tiny_brushes_step_by_a_quarter_unit() {
    let coords = interpolate_coordinates(Some(&[0.0, 0.0]), &[0.0, 100.0], 0.01);
    assert_eq!(coords.len(), 400);
    assert!((coords[0][1] - 0.25).abs() < 1e-9);
}

#[test]
fn partial_steps_round_up() {
    let coords = interpolate_coordinates(Some(&[0.0, 0.0]), &[0.0, 3.1], 2.0);
    assert_eq!(coords.len(), 7);
    assert_eq!(coords.last().expect("end"), &vec![0.0, 3.1]);
}

use super::{Colormap, LabelColormap, low_discrepancy, parse_color, to_hex};

#[test]
fn parses_names_and_hex() {
    assert_eq!(parse_color("red").expect("red"), [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(parse_color(" White ").expect("white"), [1.0; 4]);
    assert_eq!(parse_color("#00ff00").expect("hex"), [0.0, 1.0, 0.0, 1.0]);
    assert_eq!(parse_color("#f00").expect("short hex"), [1.0, 0.0, 0.0, 1.0]);
    let translucent = parse_color("#0000ff80").expect("alpha");
    assert!((translucent[3] - 128.0 / 255.0).abs() < 1e-6);
    assert!(parse_color("not-a-color").is_err());
    assert!(parse_color("#12345").is_err());
    assert!(parse_color("#gggggg").is_err());
}

#[test]
fn hex_output_drops_alpha() {
    assert_eq!(to_hex([1.0, 0.5, 0.0, 0.2]), "#ff8000");
}

#[test]
fn ramp_clamps_input() {
    assert_eq!(Colormap::Gray.map(2.0), [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(Colormap::Red.map(-1.0), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(Colormap::Green.map(0.5), [0.0, 0.5, 0.0, 1.0]);
    assert_eq!("grey".parse::<Colormap>().expect("alias"), Colormap::Gray);
    assert!("plasma".parse::<Colormap>().is_err());
}

#[test]
fn background_label_is_transparent() {
    let colormap = LabelColormap::default();
    assert_eq!(colormap.color(0), None);
    assert_eq!(colormap.rgba(0), [0.0; 4]);
    let color = colormap.color(7).expect("foreground");
    assert_eq!(color[3], 1.0);
}

#[test]
fn low_discrepancy_stays_inside_margin() {
    for label in 0..500 {
        let value = low_discrepancy(label, 0.5);
        assert!(value > 0.0 && value < 1.0);
    }
    assert_ne!(low_discrepancy(1, 0.5), low_discrepancy(2, 0.5));
}

#[test]
fn seed_changes_label_colors() {
    let first = LabelColormap::new(50, 0.5);
    let second = LabelColormap::new(50, 0.1);
    let differing = (1..20)
        .filter(|label| first.color(*label) != second.color(*label))
        .count();
    assert!(differing > 0);
}

use serde_json::json;

use super::*;

fn doc(v: serde_json::Value) -> CircuitDocument {
    CircuitDocument::from_value(v).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn board_at_pivot_zoom_keeps_reference_framing() {
    let d = doc(json!([{"type": "pcb_board", "width": 20, "height": 10}]));
    let f = frame_camera(&d, 1.2);
    assert!(approx(f.position[1], 28.0));
    assert!(approx(f.position[0], 15.0));
    assert!(approx(f.position[2], 15.0));
    assert_eq!(f.look_at, [0.0, 0.0, 0.0]);
}

#[test]
fn doubling_zoom_halves_distance() {
    let d = doc(json!([{"type": "pcb_board", "width": 20, "height": 10}]));
    let f = frame_camera(&d, 2.4);
    assert!(approx(f.position[1], 14.0));
    assert!(approx(f.position[0], 7.5));
}

#[test]
fn component_size_has_a_floor() {
    let d = doc(json!([{"type": "pcb_component", "width": 2, "height": 3}]));
    assert!(approx(scene_max_dim(&d), 5.0));

    let d = doc(json!([{"type": "pcb_component", "size": {"width": 8, "height": 3}}]));
    assert!(approx(scene_max_dim(&d), 8.0));
}

#[test]
fn empty_document_uses_default_size() {
    let d = doc(json!([{"type": "source_trace"}]));
    assert!(approx(scene_max_dim(&d), DEFAULT_SCENE_DIM));
    let f = frame_camera(&d, 1.2);
    assert!(approx(f.position[1], 14.0));
}

#[test]
fn zoom_is_normalized() {
    assert!(approx(framing_zoom(f64::NAN), ZOOM_PIVOT));
    assert!(approx(framing_zoom(f64::INFINITY), ZOOM_PIVOT));
    assert!(approx(framing_zoom(0.0), MIN_ZOOM));
    assert!(approx(framing_zoom(-3.0), MIN_ZOOM));

    let d = doc(json!([]));
    let f = frame_camera(&d, 0.0);
    assert!(f.position.iter().all(|v| v.is_finite()));
}

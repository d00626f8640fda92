use serde_json::json;

use super::*;

fn doc(v: Value) -> CircuitDocument {
    CircuitDocument::from_value(v).unwrap()
}

#[test]
fn round_trips_unknown_elements_verbatim() {
    let src = json!([
        {"type": "pcb_board", "width": 20, "height": 10, "center": {"x": 0, "y": 0}},
        {"type": "pcb_trace", "route": [{"x": 1, "y": 2}], "pcb_trace_id": "t1"},
        {"type": "some_future_kind", "anything": [1, "two", null]}
    ]);
    let d = doc(src.clone());
    assert_eq!(d.len(), 3);
    let back: Value = serde_json::from_str(&d.to_json_string().unwrap()).unwrap();
    assert_eq!(back, src);
    assert_eq!(d.elements()[1].type_name(), "pcb_trace");
    assert_eq!(d.elements()[1].kind(), &ElementKind::Other);
}

#[test]
fn rejects_non_array_and_untyped_elements() {
    assert!(matches!(
        CircuitDocument::from_value(json!({"type": "pcb_board"})),
        Err(RenderError::Input(_))
    ));
    assert!(CircuitDocument::from_value(json!([{"width": 1}])).is_err());
    assert!(CircuitDocument::from_json_str("[").is_err());
}

#[test]
fn board_dimensions_require_both_sides() {
    let d = doc(json!([
        {"type": "pcb_board", "width": 20},
        {"type": "pcb_board", "width": 30, "height": 12}
    ]));
    let size = d.board_dimensions().unwrap();
    assert_eq!(size.width, 30.0);
    assert_eq!(size.max_dim(), 30.0);
}

#[test]
fn component_size_falls_back_to_nested_size() {
    let d = doc(json!([
        {"type": "pcb_component", "pcb_component_id": "c0"},
        {"type": "pcb_component", "size": {"width": 3, "height": 4}}
    ]));
    let size = d.first_sized_component().unwrap();
    assert_eq!(size.width, 3.0);
    assert_eq!(size.height, 4.0);
}

#[test]
fn finds_first_simulation_experiment_id() {
    let d = doc(json!([
        {"type": "simulation_experiment"},
        {"type": "simulation_experiment", "simulation_experiment_id": "exp1"},
        {"type": "simulation_experiment", "simulation_experiment_id": "exp2"}
    ]));
    assert_eq!(d.first_simulation_experiment_id(), Some("exp1"));
}

#[test]
fn autorouting_errors_and_warnings_are_not_fatal() {
    let d = doc(json!([
        {"type": "pcb_autorouting_error", "message": "could not route"},
        {"type": "pcb_trace_warning", "message": "close traces"},
        {"type": "pcb_board", "width": 1, "height": 1}
    ]));
    assert!(d.fatal_errors().is_empty());
    assert!(d.ensure_renderable().is_ok());
}

#[test]
fn fatal_errors_block_rendering() {
    let d = doc(json!([
        {"type": "pcb_error", "message": "Missing ports in net NET1: R3, R4"},
        {"type": "source_failed_to_create_component_error"}
    ]));
    let errors = d.fatal_errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[1].message, "source_failed_to_create_component_error");

    let err = d.ensure_renderable().unwrap_err();
    assert!(matches!(err, RenderError::CircuitValidation(_)));
    assert!(err.to_string().contains("Missing ports in net NET1: R3, R4"));
}

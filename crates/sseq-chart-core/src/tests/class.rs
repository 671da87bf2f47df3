use super::chart_with_classes;
use crate::*;
use serde_json::json;

fn update_args(fields: serde_json::Value) -> ChartClassArgs {
    serde_json::from_value(fields).unwrap()
}

#[test]
fn constructor_defaults() {
    let class = ChartClass::new(ChartClassArgs::at_degree([0, 0])).unwrap();
    assert_eq!(class.max_page, INFINITY);
    assert_eq!(class.idx(), None);
    assert!(class.draw_on_page_q(INFINITY));
    assert_eq!(*class.border_width.get(0), 3.0);
    assert_eq!(*class.scale.get(0), 1.0);
    assert_eq!(*class.background_color.get(0), Color::BLACK);
    assert_eq!(class.shape.get(0).0, json!({"ty": "empty"}));
    assert_eq!(class.name.get(0), "");
}

#[test]
fn constructor_checks_the_type_tag() {
    let legacy = ChartClass::from_value(json!({"type": "SseqClass", "degree": [1, 0]})).unwrap();
    assert_eq!(legacy.degree(), &[1, 0]);

    let err = ChartClass::from_value(json!({"type": "ChartDifferential", "degree": [1, 0]}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    let err = ChartClass::from_value(json!({"type": "Glyph", "degree": [1, 0]})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
fn update_assigns_present_fields_including_falsy_ones() {
    let mut class = ChartClass::new(ChartClassArgs::at_degree([0, 0])).unwrap();
    class
        .update(update_args(json!({
            "visible": false,
            "name": {"type": "PageProperty", "values": [[-INFINITY, ""], [5, "\\alpha"]]},
            "x_nudge": 0.5
        })))
        .unwrap();
    assert!(!class.draw_on_page_q(3));
    assert_eq!(class.name.get(4), "");
    assert_eq!(class.name.get(5), "\\alpha");
    assert_eq!(*class.x_nudge.get(100), 0.5);
    // Absent fields are untouched.
    assert_eq!(class.max_page, INFINITY);
}

#[test]
fn update_rejects_identity_changes() {
    let (mut chart, c) = chart_with_classes(&[[0, 0]]);
    let class = chart.class_mut(c[0]).unwrap();

    let err = class.update(update_args(json!({"degree": [0, 1]}))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(
        err.to_string(),
        format!("Inconsistent values for \"degree\" on {}.", c[0])
    );

    let other = uuid::Uuid::new_v4();
    let err = class.update(update_args(json!({"uuid": other}))).unwrap_err();
    assert!(matches!(err, Error::Inconsistent { field: "uuid", .. }));

    let err = class.update(update_args(json!({"idx": 3}))).unwrap_err();
    assert!(matches!(err, Error::Inconsistent { field: "idx", .. }));

    let err = class
        .update(update_args(json!({"type": "ChartExtension"})))
        .unwrap_err();
    assert!(matches!(err, Error::Inconsistent { field: "type", .. }));

    // Restating the current identity is fine.
    class
        .update(update_args(json!({"degree": [0, 0], "idx": 0, "uuid": c[0]})))
        .unwrap();
}

#[test]
fn x_offset_spreads_classes_around_the_degree() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [0, 0], [0, 0]]);
    let offsets: Vec<f64> = c
        .iter()
        .map(|u| chart.class(*u).unwrap().x_offset(&chart, 2))
        .collect();
    assert_eq!(offsets, vec![-45.0, 0.0, 45.0]);

    chart.class_mut(c[2]).unwrap().x_nudge.set_range(5.., 3.0);
    let class = chart.class(c[2]).unwrap();
    assert_eq!(class.x_offset(&chart, 4), 45.0);
    assert_eq!(class.x_offset(&chart, 5), 48.0);
    assert_eq!(class.y_offset(5), 0.0);
}

#[test]
fn serialized_form_has_tag_and_bare_constants() {
    let (chart, c) = chart_with_classes(&[[2, 1]]);
    let value = serde_json::to_value(chart.class(c[0]).unwrap()).unwrap();
    assert_eq!(value["type"], "ChartClass");
    assert_eq!(value["degree"], json!([2, 1]));
    assert_eq!(value["idx"], 0);
    assert_eq!(value["name"], "");
    assert_eq!(value["visible"], true);
    assert_eq!(value["max_page"], INFINITY);
    assert!(value.get("x").is_none());
}

#[test]
fn producer_color_objects_are_accepted() {
    let class = ChartClass::from_value(json!({
        "degree": [0, 0],
        "background_color": {"type": "Color", "color": "#000000ff", "name": "black"},
        "border_color": {"type": "PageProperty", "values": [
            [-65535, {"type": "Color", "color": "#000000ff"}],
            [3, {"type": "Color", "color": "#ff000080"}]
        ]}
    }))
    .unwrap();
    assert_eq!(class.background_color.get(0).rgba, Color::BLACK.rgba);
    assert_eq!(class.background_color.get(0).name.as_deref(), Some("black"));
    assert_eq!(class.border_color.get(2), &Color::BLACK);
    assert_eq!(class.border_color.get(3).to_hex(), "#ff000080");

    let value = serde_json::to_value(&class).unwrap();
    assert_eq!(value["background_color"]["name"], "black");
    let back = ChartClass::from_value(value).unwrap();
    assert_eq!(back, class);
}

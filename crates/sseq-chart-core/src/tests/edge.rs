use super::chart_with_classes;
use crate::*;
use serde_json::json;

fn edge_args(fields: serde_json::Value) -> EdgeArgs {
    serde_json::from_value(fields).unwrap()
}

#[test]
fn structline_follows_its_visibility_and_endpoints() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 0], [2, 0]]);
    let mut visible = PageProperty::new(true);
    visible.set_range(4.., false);
    let s = chart
        .add_structline(EdgeArgs {
            visible: Some(visible),
            ..EdgeArgs::between(c[0], c[1])
        })
        .unwrap();
    let t = chart.add_structline(EdgeArgs::between(c[1], c[2])).unwrap();
    chart.class_mut(c[2]).unwrap().max_page = 2;

    let s = chart.edge(s).unwrap();
    assert!(s.draw_on_page_q(&chart, [3, 3]));
    assert!(!s.draw_on_page_q(&chart, [4, 4]));
    assert!(!s.edge_style(5).visible);

    let t = chart.edge(t).unwrap();
    assert!(t.draw_on_page_q(&chart, [2, 2]));
    assert!(!t.draw_on_page_q(&chart, [3, 3]));
}

#[test]
fn extension_shows_only_on_the_infinity_range() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [0, 1]]);
    let e = chart.add_extension(EdgeArgs::between(c[0], c[1])).unwrap();
    let e = chart.edge(e).unwrap();
    assert!(e.draw_on_page_q(&chart, [INFINITY, INFINITY]));
    assert!(!e.draw_on_page_q(&chart, [2, INFINITY]));
    assert_eq!(e.target_type(), TargetType::ChartExtension);
}

#[test]
fn constructors_require_endpoints_and_page() {
    let a = uuid::Uuid::new_v4();
    let err = ChartEdge::structline(EdgeArgs {
        source_uuid: Some(a),
        ..EdgeArgs::default()
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert_eq!(
        err.to_string(),
        "Mandatory argument \"target_uuid\" is missing in constructor for ChartStructline."
    );

    let err = ChartEdge::differential(EdgeArgs::between(a, a)).unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "page", .. }));
}

#[test]
fn update_keeps_endpoints_and_page_fixed() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 1]]);
    let d = chart
        .add_differential(EdgeArgs::between(c[0], c[1]).on_page(2))
        .unwrap();
    let msg = |fields| Message::new(Command::Update {
        target_type: TargetType::ChartDifferential,
        target_uuid: d,
        fields,
    });

    let err = chart
        .handle_message(&msg(json!({"source_uuid": c[1]})))
        .unwrap_err();
    assert!(matches!(err, Error::Inconsistent { field: "source_uuid", .. }));
    let err = chart.handle_message(&msg(json!({"page": 3}))).unwrap_err();
    assert!(matches!(err, Error::Inconsistent { field: "page", .. }));

    chart
        .handle_message(&msg(json!({"color": [1.0, 0.0, 0.0, 1.0], "line_width": 0})))
        .unwrap();
    let style = chart.edge(d).unwrap().edge_style(7);
    assert_eq!(style.color, Color::rgba(1.0, 0.0, 0.0, 1.0));
    assert_eq!(style.line_width, 0.0);

    let err = chart
        .handle_message(&msg(json!({
            "color": {"type": "PageProperty", "values": [[-INFINITY, [0, 0, 0, 1]], [3, [1, 0, 0, 1]]]}
        })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
}

#[test]
fn rejected_update_leaves_the_edge_untouched() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 1]]);
    let d = chart
        .add_differential(EdgeArgs::between(c[0], c[1]).on_page(2))
        .unwrap();
    let x = chart
        .add_extension(EdgeArgs::between(c[0], c[1]))
        .unwrap();
    for (target_type, uuid) in [
        (TargetType::ChartDifferential, d),
        (TargetType::ChartExtension, x),
    ] {
        let before = chart.edge(uuid).unwrap().clone();
        let err = chart
            .handle_message(&Message::new(Command::Update {
                target_type,
                target_uuid: uuid,
                fields: json!({
                    "user_data": {"k": 1},
                    "color": [1, 0, 0, 1],
                    "line_width": {"type": "PageProperty", "values": [[-INFINITY, 1], [3, 2]]}
                }),
            }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(chart.edge(uuid).unwrap(), &before);
    }
}

#[test]
fn structline_style_varies_by_page() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 0]]);
    let s = chart
        .add_structline(edge_args(json!({
            "source_uuid": c[0],
            "target_uuid": c[1],
            "end_tip": {"type": "ArrowTip", "tip": "vee"},
            "bend": {"type": "PageProperty", "values": [[-INFINITY, 0], [4, 30]]}
        })))
        .unwrap();
    let edge = chart.edge(s).unwrap();
    assert_eq!(edge.edge_style(3).bend, 0.0);
    assert_eq!(edge.edge_style(4).bend, 30.0);
    assert_eq!(edge.edge_style(4).end_tip.tip, "vee");
    assert!(edge.edge_style(4).start_tip.is_none());
}

#[test]
fn serialized_edges_carry_type_and_style() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 1]]);
    let d = chart
        .add_differential(EdgeArgs::between(c[0], c[1]).on_page(2))
        .unwrap();
    let value = serde_json::to_value(chart.edge(d).unwrap()).unwrap();
    assert_eq!(value["type"], "ChartDifferential");
    assert_eq!(value["page"], 2);
    assert_eq!(value["source_uuid"], json!(c[0]));
    assert_eq!(value["start_tip"], serde_json::Value::Null);
    assert_eq!(value["line_width"], 3.0);

    let back = ChartEdge::from_value(TargetType::ChartDifferential, value.clone()).unwrap();
    assert_eq!(&back, chart.edge(d).unwrap());

    let err = ChartEdge::from_value(TargetType::ChartStructline, value).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

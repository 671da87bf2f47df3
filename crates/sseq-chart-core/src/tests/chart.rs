use super::chart_with_classes;
use crate::*;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

#[test]
fn differential_shows_on_sentinel_and_containing_ranges() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 1]]);
    let d = chart
        .add_differential(EdgeArgs::between(c[0], c[1]).on_page(2))
        .unwrap();
    let edge = chart.edge(d).unwrap();
    assert!(edge.draw_on_page_q(&chart, [0, INFINITY]));
    assert!(!edge.draw_on_page_q(&chart, [3, 5]));
    assert!(edge.draw_on_page_q(&chart, [2, 2]));
}

#[test]
fn idx_counts_classes_already_in_the_degree() {
    let (chart, c) = chart_with_classes(&[[0, 0], [1, 0], [0, 0], [0, 0]]);
    let idx: Vec<_> = c.iter().map(|u| chart.class(*u).unwrap().idx()).collect();
    assert_eq!(idx, vec![Some(0), Some(0), Some(1), Some(2)]);

    assert_eq!(chart.classes_in_degree(&[0, 0]).unwrap(), &[c[0], c[2], c[3]]);
    assert_eq!(chart.class_by_index(&[0, 0], 2).unwrap().uuid(), c[3]);
    assert!(chart.classes_in_degree(&[5, 5]).unwrap().is_empty());

    let err = chart.class_by_index(&[0, 0], 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
    let err = chart.classes_in_degree(&[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
}

#[test]
fn positions_are_projections_of_the_degree() {
    let mut chart = SseqChart::new("test", 3);
    chart
        .update_settings(&json!({"x_projection": [1, 0, 1], "y_projection": [0, 1, 1]}))
        .unwrap();
    let u = chart.add_class(ChartClassArgs::at_degree([2, 3, 4])).unwrap();
    let class = chart.class(u).unwrap();
    assert_eq!((class.x(), class.y()), (6, 7));
    assert!(class.in_range_q(0.0, 6.0, 7.0, 10.0));
    assert!(!class.in_range_q(0.0, 5.0, 0.0, 10.0));
}

#[test]
fn commit_rejects_bad_degrees_without_side_effects() {
    let mut chart = SseqChart::new("test", 2);
    let err = chart.add_class(ChartClassArgs::at_degree([1, 2, 3])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert!(err.to_string().contains("Wrong number of gradings"));

    let err = chart.add_class(ChartClassArgs::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingField {
            field: "degree",
            ..
        }
    ));
    assert_eq!(chart.classes().len(), 0);
}

#[test]
fn deleting_a_class_cascades_to_its_edges() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 0], [2, 0]]);
    let s = chart.add_structline(EdgeArgs::between(c[0], c[1])).unwrap();
    let d = chart
        .add_differential(EdgeArgs::between(c[1], c[2]).on_page(2))
        .unwrap();
    let e = chart.add_extension(EdgeArgs::between(c[0], c[2])).unwrap();

    chart.delete_class(c[1]).unwrap();

    assert!(!chart.contains(c[1]));
    assert!(chart.edge(s).is_none());
    assert!(chart.edge(d).is_none());
    assert_eq!(chart.edges().map(|e| e.uuid()).collect::<Vec<_>>(), vec![e]);
    assert_eq!(chart.edges_of_class(c[0]).count(), 1);
    assert_eq!(chart.edges_of_class(c[2]).count(), 1);

    // The degree index keeps the slot of the deleted class.
    assert_eq!(chart.classes_in_degree(&[1, 0]).unwrap(), &[c[1]]);
    let err = chart.class_by_index(&[1, 0], 0).unwrap_err();
    assert!(matches!(err, Error::UnknownClass { uuid } if uuid == c[1]));
}

#[test]
fn deleted_uuids_are_not_reused() {
    let (mut chart, c) = chart_with_classes(&[[0, 0]]);
    chart.delete_class(c[0]).unwrap();
    let args = ChartClassArgs {
        uuid: Some(c[0]),
        ..ChartClassArgs::at_degree([0, 0])
    };
    let err = chart.add_class(args).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);

    let err = chart.delete_class(c[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
}

#[test]
fn edges_and_classes_share_one_namespace() {
    let (mut chart, c) = chart_with_classes(&[[0, 0]]);
    let args = EdgeArgs {
        uuid: Some(c[0]),
        ..EdgeArgs::between(c[0], c[0])
    };
    let err = chart.add_structline(args).unwrap_err();
    assert!(matches!(err, Error::DuplicateObject { .. }));
}

#[test]
fn edge_commit_requires_both_endpoints() {
    let (mut chart, c) = chart_with_classes(&[[0, 0]]);
    let missing = Uuid::new_v4();
    let err = chart
        .add_structline(EdgeArgs::between(c[0], missing))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
    assert_eq!(err.to_string(), format!("No class with uuid {missing}"));
    assert_eq!(chart.edges().len(), 0);
    assert_eq!(chart.edges_of_class(c[0]).count(), 0);
}

#[test]
fn page_ranges_insert_before_first_larger_start() {
    let mut chart = SseqChart::new("test", 2);
    assert_eq!(chart.add_page_range([3, 3]), Some(1));
    assert_eq!(chart.add_page_range([3, 3]), None);
    assert_eq!(chart.add_page_range([1, 1]), Some(0));
    assert_eq!(
        chart.page_list(),
        &[[1, 1], [2, INFINITY], [3, 3], [INFINITY, INFINITY]]
    );
}

#[test]
fn auto_differential_caps_endpoints_and_records_its_page() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 1]]);
    chart
        .add_differential_auto(EdgeArgs::between(c[0], c[1]).on_page(3))
        .unwrap();
    for u in &c {
        let class = chart.class(*u).unwrap();
        assert_eq!(class.max_page, 3);
        assert!(class.draw_on_page_q(3));
        assert!(!class.draw_on_page_q(4));
    }
    assert!(chart.page_list().contains(&[3, 3]));
}

#[test]
fn draw_set_pulls_in_out_of_view_endpoints() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [5, 0], [20, 0], [1, 1]]);
    chart.class_mut(c[3]).unwrap().visible = PageProperty::new(false);
    let s = chart.add_structline(EdgeArgs::between(c[1], c[2])).unwrap();
    chart.add_structline(EdgeArgs::between(c[0], c[3])).unwrap();

    let draw = chart.elements_to_draw([2, INFINITY], 0.0, 10.0, 0.0, 10.0);
    assert_eq!(draw.classes, vec![c[0], c[1], c[2]]);
    assert_eq!(draw.edges, vec![s]);
}

#[test]
fn observers_see_each_mutation_then_update() {
    let mut chart = SseqChart::new("test", 2);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = chart.on_event(move |chart, event| {
        sink.borrow_mut().push((event.clone(), chart.classes().len()));
    });

    let a = chart.add_class(ChartClassArgs::at_degree([0, 0])).unwrap();
    let s = chart.add_structline(EdgeArgs::between(a, a)).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![
            (ChartEvent::ClassAdded(a), 1),
            (ChartEvent::Update, 1),
            (ChartEvent::StructlineAdded(s), 1),
            (ChartEvent::EdgeAdded(s), 1),
            (ChartEvent::Update, 1),
        ]
    );

    assert!(chart.off_event(id));
    assert!(!chart.off_event(id));
    chart.clear();
    assert_eq!(seen.borrow().len(), 5);
}

#[test]
fn each_edge_kind_announces_itself() {
    let (mut chart, c) = chart_with_classes(&[[0, 0], [1, 1]]);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    chart.on_event(move |_, event| sink.borrow_mut().push(event.clone()));

    let x = chart.add_extension(EdgeArgs::between(c[0], c[1])).unwrap();
    let d = chart
        .add_differential(EdgeArgs::between(c[0], c[1]).on_page(2))
        .unwrap();
    let e = ChartEdge::extension(EdgeArgs::between(c[1], c[0])).unwrap();
    let e_uuid = e.uuid();
    chart
        .handle_message(&Message::new(Command::Create(ChartEntity::Edge(e))))
        .unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            ChartEvent::ExtensionAdded(x),
            ChartEvent::EdgeAdded(x),
            ChartEvent::Update,
            ChartEvent::DifferentialAdded(d),
            ChartEvent::EdgeAdded(d),
            ChartEvent::Update,
            ChartEvent::ExtensionAdded(e_uuid),
            ChartEvent::EdgeAdded(e_uuid),
            ChartEvent::Update,
        ]
    );
}

#[test]
fn clear_restores_initial_settings_and_frees_uuids() {
    let (mut chart, c) = chart_with_classes(&[[0, 0]]);
    chart.update_settings(&json!({"x_range": [0, 40]})).unwrap();
    chart.delete_class(c[0]).unwrap();
    chart.clear();

    assert_eq!(chart.classes().len(), 0);
    assert_eq!(chart.settings().x_range, [0, 10]);
    let args = ChartClassArgs {
        uuid: Some(c[0]),
        ..ChartClassArgs::at_degree([0, 0])
    };
    chart.add_class(args).unwrap();
    assert_eq!(chart.class(c[0]).unwrap().idx(), Some(0));
}

#[test]
fn num_gradings_is_fixed() {
    let mut chart = SseqChart::new("test", 2);
    let err = chart
        .update_settings(&json!({"num_gradings": 3}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    let err = chart
        .update_settings(&json!({"y_projection": [0, 1, 0]}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert_eq!(chart.settings(), &ChartSettings::new("test", 2));
}

#[test]
fn tooltip_prefixes_the_name_when_present() {
    let mut chart = SseqChart::new("test", 2);
    let named = chart
        .add_class(ChartClassArgs {
            name: Some(PageProperty::new("h_0".to_string())),
            ..ChartClassArgs::at_degree([1, 2])
        })
        .unwrap();
    let plain = chart.add_class(ChartClassArgs::at_degree([3, 4])).unwrap();

    assert_eq!(
        chart.class_tooltip(named, 2).unwrap(),
        "\\(\\large h_0\\)&nbsp;&mdash;&nbsp;(1, 2)"
    );
    assert_eq!(chart.class_tooltip(plain, 2).unwrap(), "(3, 4)");
    assert_eq!(
        chart.class_tooltip(Uuid::new_v4(), 2).unwrap_err().kind(),
        ErrorKind::Reference
    );
}

mod chart;
mod class;
mod edge;

use crate::*;
use uuid::Uuid;

/// A two-grading chart with one class per degree, in order.
pub(crate) fn chart_with_classes(degrees: &[[i32; 2]]) -> (SseqChart, Vec<Uuid>) {
    let mut chart = SseqChart::new("test", 2);
    let uuids = degrees
        .iter()
        .map(|d| chart.add_class(ChartClassArgs::at_degree(*d)).unwrap())
        .collect();
    (chart, uuids)
}

#![forbid(unsafe_code)]

//! `sseq-chart` is a headless model of spectral sequence charts.
//!
//! It re-exports `sseq-chart-core` and adds [`router::ChartRouter`], which keeps several charts
//! side by side and routes protocol messages to them by `chart_id`.

pub use sseq_chart_core::*;

pub mod router;

pub use router::ChartRouter;

#![forbid(unsafe_code)]

//! Spectral sequence chart model (headless).
//!
//! A chart holds classes placed on an integer grid and edges between them. Display attributes
//! vary with the page, and a producer keeps a client-side chart in sync through a stream of
//! create/update/delete messages.
//!
//! Design goals:
//! - every invariant checked at commit time, errors returned rather than logged
//! - deterministic, insertion-ordered JSON output
//! - undo by replaying the message history from an empty chart

pub mod chart;
pub mod chart_class;
pub mod chart_edge;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod message;
pub mod page_property;
pub mod stringifying_map;
pub mod style;

pub use chart::{DrawSet, ObjectRef, SseqChart};
pub use chart_class::{ChartClass, ChartClassArgs};
pub use chart_edge::{ChartEdge, EdgeArgs, EdgeKind, StructlineStyle};
pub use codec::{ChartObject, decode_chart, encode_chart, from_json_str, to_json_string};
pub use config::{ChartConfig, ChartSettings};
pub use error::{Error, ErrorKind, Result};
pub use events::{ChartEvent, ObserverId};
pub use history::ChartSession;
pub use message::{
    ChartEntity, Command, Message, TargetType, decode_message_log, encode_message_log,
};
pub use page_property::{INFINITY, Page, PageProperty, PageRange};
pub use stringifying_map::{StringifyingKey, StringifyingMap};
pub use style::{ArrowTip, Color, DashPattern, EdgeStyle, Shape};

#[cfg(test)]
mod tests;

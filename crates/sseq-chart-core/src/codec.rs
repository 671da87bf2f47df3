//! JSON codec for charts and chart objects.
//!
//! Every serialized object carries a `type` tag. Decoding matches on the tag over a closed set
//! of variants.

use crate::chart::SseqChart;
use crate::chart_class::ChartClass;
use crate::chart_edge::ChartEdge;
use crate::config::ChartSettings;
use crate::message::TargetType;
use crate::{Error, Result};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug)]
pub enum ChartObject {
    Chart(Box<SseqChart>),
    Class(ChartClass),
    Edge(ChartEdge),
}

impl ChartObject {
    pub fn from_value(value: Value) -> Result<Self> {
        let target_type = type_tag(&value)?;
        Ok(match target_type {
            TargetType::SseqChart => ChartObject::Chart(Box::new(decode_chart(value)?)),
            TargetType::ChartClass => ChartObject::Class(ChartClass::from_value(value)?),
            TargetType::ChartStructline
            | TargetType::ChartDifferential
            | TargetType::ChartExtension => {
                ChartObject::Edge(ChartEdge::from_value(target_type, value)?)
            }
        })
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            ChartObject::Chart(_) => TargetType::SseqChart,
            ChartObject::Class(_) => TargetType::ChartClass,
            ChartObject::Edge(e) => e.target_type(),
        }
    }
}

fn type_tag(value: &Value) -> Result<TargetType> {
    match value.get("type").and_then(Value::as_str) {
        Some(tag) => TargetType::parse(tag),
        None => Err(Error::MissingPayload {
            command: "decode",
            field: "type",
        }),
    }
}

impl Serialize for SseqChart {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let settings = self.settings();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", TargetType::SseqChart.as_str())?;
        map.serialize_entry("name", &settings.name)?;
        map.serialize_entry("initial_x_range", &settings.initial_x_range)?;
        map.serialize_entry("initial_y_range", &settings.initial_y_range)?;
        map.serialize_entry("x_range", &settings.x_range)?;
        map.serialize_entry("y_range", &settings.y_range)?;
        map.serialize_entry("page_list", &settings.page_list)?;
        map.serialize_entry("num_gradings", &settings.num_gradings)?;
        map.serialize_entry("x_projection", &settings.x_projection)?;
        map.serialize_entry("y_projection", &settings.y_projection)?;
        map.serialize_entry("offset_size", &settings.offset_size)?;
        map.serialize_entry("classes", &self.classes().collect::<Vec<_>>())?;
        map.serialize_entry("edges", &self.edges().collect::<Vec<_>>())?;
        map.serialize_entry("uuid", &self.uuid())?;
        map.end()
    }
}

pub fn encode_chart(chart: &SseqChart) -> Result<Value> {
    Ok(serde_json::to_value(chart)?)
}

/// Rebuilds a chart from its serialized form. Classes are committed before edges.
pub fn decode_chart(value: Value) -> Result<SseqChart> {
    let Value::Object(mut fields) = value else {
        return Err(serde_json::Error::custom("a serialized chart must be a JSON object").into());
    };
    if let Some(tag) = fields.get("type").and_then(Value::as_str) {
        let actual = TargetType::parse(tag)?;
        if actual != TargetType::SseqChart {
            return Err(Error::TypeMismatch {
                command: "decode",
                claimed: TargetType::SseqChart,
                actual,
            });
        }
    }
    let classes = take_array(&mut fields, "classes");
    let edges = take_array(&mut fields, "edges");
    let uuid = match fields.remove("uuid") {
        Some(uuid) => serde_json::from_value(uuid)?,
        None => Uuid::new_v4(),
    };
    let num_gradings = match fields.get("num_gradings") {
        Some(n) => serde_json::from_value(n.clone())?,
        None => 2,
    };
    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let settings = ChartSettings::new(name, num_gradings).overlay(&fields)?;

    let mut chart = SseqChart::from_settings(settings)?.with_uuid(uuid);
    for class in classes {
        chart.commit_class(ChartClass::from_value(class)?)?;
    }
    for edge in edges {
        let target_type = type_tag(&edge)?;
        chart.commit_edge(ChartEdge::from_value(target_type, edge)?)?;
    }
    Ok(chart)
}

fn take_array(fields: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match fields.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

pub fn to_json_string(chart: &SseqChart, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(chart)?
    } else {
        serde_json::to_string(chart)?
    })
}

pub fn from_json_str(text: &str) -> Result<SseqChart> {
    decode_chart(serde_json::from_str(text)?)
}

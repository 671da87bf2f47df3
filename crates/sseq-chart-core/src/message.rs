//! The create/update/delete message protocol.
//!
//! Producers send JSON envelopes:
//!
//! ```json
//! {"chart_id": "...", "command": "create", "target_type": "ChartClass", "target": {...}}
//! {"chart_id": "...", "command": "update", "target_type": "ChartClass", "target_uuid": "...", "update_fields": {...}}
//! {"chart_id": "...", "command": "update", "target_type": "SseqChart", "target_fields": {...}}
//! {"chart_id": "...", "command": "delete", "target_type": "ChartStructline", "target_uuid": "..."}
//! ```
//!
//! Envelopes are decoded into [`Message`] before they reach a chart, so command and type
//! errors surface once, at the boundary.

use crate::chart_class::ChartClass;
use crate::chart_edge::ChartEdge;
use crate::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Runtime type of a chart object, as carried in `type` and `target_type` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    ChartClass,
    ChartStructline,
    ChartDifferential,
    ChartExtension,
    SseqChart,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::ChartClass => "ChartClass",
            TargetType::ChartStructline => "ChartStructline",
            TargetType::ChartDifferential => "ChartDifferential",
            TargetType::ChartExtension => "ChartExtension",
            TargetType::SseqChart => "SseqChart",
        }
    }

    pub fn parse(tag: &str) -> Result<Self> {
        Ok(match tag {
            // `SseqClass` is what older producers call a class.
            "ChartClass" | "SseqClass" => TargetType::ChartClass,
            "ChartStructline" => TargetType::ChartStructline,
            "ChartDifferential" => TargetType::ChartDifferential,
            "ChartExtension" => TargetType::ChartExtension,
            "SseqChart" => TargetType::SseqChart,
            other => {
                return Err(Error::UnknownType {
                    target_type: other.to_string(),
                });
            }
        })
    }

    pub fn is_edge(self) -> bool {
        matches!(
            self,
            TargetType::ChartStructline | TargetType::ChartDifferential | TargetType::ChartExtension
        )
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TargetType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A class or an edge carried by a `create` message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEntity {
    Class(ChartClass),
    Edge(ChartEdge),
}

impl ChartEntity {
    pub fn uuid(&self) -> Uuid {
        match self {
            ChartEntity::Class(c) => c.uuid(),
            ChartEntity::Edge(e) => e.uuid(),
        }
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            ChartEntity::Class(_) => TargetType::ChartClass,
            ChartEntity::Edge(e) => e.target_type(),
        }
    }

    /// Decodes `value` as an object of type `target_type`.
    pub fn from_value(target_type: TargetType, value: Value) -> Result<Self> {
        match target_type {
            TargetType::ChartClass => ChartClass::from_value(value).map(ChartEntity::Class),
            TargetType::ChartStructline
            | TargetType::ChartDifferential
            | TargetType::ChartExtension => {
                ChartEdge::from_value(target_type, value).map(ChartEntity::Edge)
            }
            TargetType::SseqChart => Err(Error::UnsupportedCommand {
                command: "create",
                target_type,
            }),
        }
    }
}

impl Serialize for ChartEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ChartEntity::Class(c) => c.serialize(serializer),
            ChartEntity::Edge(e) => e.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(ChartEntity),
    Update {
        target_type: TargetType,
        target_uuid: Uuid,
        fields: Value,
    },
    /// Shallow assignment of global fields onto the chart itself.
    UpdateChart(Value),
    Delete {
        target_type: TargetType,
        target_uuid: Uuid,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::Update { .. } | Command::UpdateChart(_) => "update",
            Command::Delete { .. } => "delete",
        }
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            Command::Create(entity) => entity.target_type(),
            Command::Update { target_type, .. } | Command::Delete { target_type, .. } => {
                *target_type
            }
            Command::UpdateChart(_) => TargetType::SseqChart,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub chart_id: Option<String>,
    pub command: Command,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chart_id: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update_fields: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_fields: Option<Value>,
}

impl Message {
    pub fn new(command: Command) -> Self {
        Self {
            chart_id: None,
            command,
        }
    }

    pub fn with_chart_id(mut self, chart_id: impl Into<String>) -> Self {
        self.chart_id = Some(chart_id.into());
        self
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let envelope: Envelope = serde_json::from_value(value)?;
        let Some(command) = envelope.command.as_deref() else {
            return Err(Error::MissingPayload {
                command: "message",
                field: "command",
            });
        };
        let command: &'static str = match command {
            "create" => "create",
            "update" => "update",
            "delete" => "delete",
            other => {
                return Err(Error::UnknownCommand {
                    command: other.to_string(),
                });
            }
        };
        let target_type = envelope
            .target_type
            .as_deref()
            .ok_or(Error::MissingPayload {
                command,
                field: "target_type",
            })
            .and_then(TargetType::parse)?;

        let command = match (command, target_type) {
            ("create", _) => {
                let target = envelope.target.ok_or(Error::MissingPayload {
                    command,
                    field: "target",
                })?;
                Command::Create(ChartEntity::from_value(target_type, target)?)
            }
            ("update", TargetType::SseqChart) => {
                let fields = envelope.target_fields.ok_or(Error::MissingPayload {
                    command,
                    field: "target_fields",
                })?;
                Command::UpdateChart(fields)
            }
            ("update", _) => {
                let fields = envelope.update_fields.unwrap_or(Value::Null);
                let target_uuid = match envelope.target_uuid {
                    Some(uuid) => uuid,
                    None => match fields.get("uuid") {
                        Some(uuid) => serde_json::from_value(uuid.clone())?,
                        None => {
                            return Err(Error::MissingPayload {
                                command,
                                field: "target_uuid",
                            });
                        }
                    },
                };
                Command::Update {
                    target_type,
                    target_uuid,
                    fields,
                }
            }
            (_, TargetType::SseqChart) => {
                return Err(Error::UnsupportedCommand {
                    command,
                    target_type,
                });
            }
            _ => Command::Delete {
                target_type,
                target_uuid: envelope.target_uuid.ok_or(Error::MissingPayload {
                    command,
                    field: "target_uuid",
                })?,
            },
        };
        Ok(Self {
            chart_id: envelope.chart_id,
            command,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        let mut envelope = Envelope {
            chart_id: self.chart_id.clone(),
            command: Some(self.command.name().to_string()),
            target_type: Some(self.command.target_type().as_str().to_string()),
            ..Envelope::default()
        };
        match &self.command {
            Command::Create(entity) => envelope.target = Some(serde_json::to_value(entity)?),
            Command::Update {
                target_uuid,
                fields,
                ..
            } => {
                envelope.target_uuid = Some(*target_uuid);
                envelope.update_fields = Some(fields.clone());
            }
            Command::UpdateChart(fields) => envelope.target_fields = Some(fields.clone()),
            Command::Delete { target_uuid, .. } => envelope.target_uuid = Some(*target_uuid),
        }
        Ok(serde_json::to_value(envelope)?)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Decodes a message log: either one JSON array of envelopes or one envelope per line.
pub fn decode_message_log(text: &str) -> Result<Vec<Message>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return values.into_iter().map(Message::from_value).collect();
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Message::from_json_str)
        .collect()
}

/// Encodes messages as newline-delimited JSON.
pub fn encode_message_log(messages: &[Message]) -> Result<String> {
    let mut out = String::new();
    for message in messages {
        out.push_str(&serde_json::to_string(&message.to_value()?)?);
        out.push('\n');
    }
    Ok(out)
}

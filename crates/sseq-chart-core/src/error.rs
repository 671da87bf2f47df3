use crate::message::TargetType;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure category, mirroring how the producer side classifies protocol failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A mandatory field is missing or malformed while constructing an entity.
    Construction,
    /// A message asserts a value for an identity-bearing field that disagrees with the chart.
    Consistency,
    /// A message or call names an object that is not in the chart.
    Reference,
    /// The message itself is not understood.
    Protocol,
    /// The JSON payload could not be deserialized.
    Codec,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Mandatory argument \"{field}\" is missing in constructor for {target}.")]
    MissingField {
        target: &'static str,
        field: &'static str,
    },

    #[error(
        "Wrong number of gradings: degree {degree:?} has length {} but num_gradings is {num_gradings}",
        .degree.len()
    )]
    DegreeArity { degree: Vec<i32>, num_gradings: usize },

    #[error("Projection \"{axis}\" has length {found} but num_gradings is {num_gradings}")]
    ProjectionArity {
        axis: &'static str,
        found: usize,
        num_gradings: usize,
    },

    #[error("Invalid value for setting \"{key}\": {message}")]
    InvalidSetting { key: &'static str, message: String },

    #[error("Invalid page property: {message}")]
    InvalidPageProperty { message: String },

    #[error("Inconsistent values for \"{field}\" on {uuid}.")]
    Inconsistent { uuid: Uuid, field: &'static str },

    #[error("Target of {command} has type \"{actual}\" but message claims it has type \"{claimed}\"")]
    TypeMismatch {
        command: &'static str,
        claimed: TargetType,
        actual: TargetType,
    },

    #[error("An object with uuid {uuid} already exists or has been deleted")]
    DuplicateObject { uuid: Uuid },

    #[error("No class with uuid {uuid}")]
    UnknownClass { uuid: Uuid },

    #[error("Asked to {command} unknown object {uuid}")]
    UnknownObject { command: &'static str, uuid: Uuid },

    #[error("Class index {idx} is out of range: fewer classes exist in degree {degree:?}.")]
    IndexOutOfRange { degree: Vec<i32>, idx: usize },

    #[error("History has {len} messages; index {idx} is out of range")]
    HistoryIndex { idx: usize, len: usize },

    #[error("No chart with id \"{chart_id}\"")]
    UnknownChart { chart_id: String },

    #[error("Unknown command \"{command}\"")]
    UnknownCommand { command: String },

    #[error("Cannot handle object of unknown type \"{target_type}\"")]
    UnknownType { target_type: String },

    #[error("Cannot {command} an object of type \"{target_type}\"")]
    UnsupportedCommand {
        command: &'static str,
        target_type: TargetType,
    },

    #[error("Message for command \"{command}\" is missing \"{field}\"")]
    MissingPayload {
        command: &'static str,
        field: &'static str,
    },

    #[error("Nothing to {action}")]
    EmptyHistory { action: &'static str },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField { .. }
            | Error::DegreeArity { .. }
            | Error::ProjectionArity { .. }
            | Error::InvalidSetting { .. }
            | Error::InvalidPageProperty { .. } => ErrorKind::Construction,
            Error::Inconsistent { .. }
            | Error::TypeMismatch { .. }
            | Error::DuplicateObject { .. } => ErrorKind::Consistency,
            Error::UnknownClass { .. }
            | Error::UnknownObject { .. }
            | Error::IndexOutOfRange { .. }
            | Error::HistoryIndex { .. }
            | Error::UnknownChart { .. } => ErrorKind::Reference,
            Error::UnknownCommand { .. }
            | Error::UnknownType { .. }
            | Error::UnsupportedCommand { .. }
            | Error::MissingPayload { .. }
            | Error::EmptyHistory { .. } => ErrorKind::Protocol,
            Error::Json(_) => ErrorKind::Codec,
        }
    }
}

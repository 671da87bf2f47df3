//! Several charts addressed by id.
//!
//! A producer may drive more than one chart over the same connection. Each envelope names its
//! chart through `chart_id`, and the router hands the message to that chart's session.

use indexmap::IndexMap;
use sseq_chart_core::{ChartSession, Error, Message, Result, SseqChart};

#[derive(Debug, Default)]
pub struct ChartRouter {
    sessions: IndexMap<String, ChartSession>,
}

impl ChartRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `chart` under `chart_id` with an empty history. Returns the session it
    /// replaces, if any.
    pub fn insert(&mut self, chart_id: impl Into<String>, chart: SseqChart) -> Option<ChartSession> {
        self.insert_session(chart_id, ChartSession::new(chart))
    }

    pub fn insert_session(
        &mut self,
        chart_id: impl Into<String>,
        session: ChartSession,
    ) -> Option<ChartSession> {
        let chart_id = chart_id.into();
        tracing::debug!(chart_id = chart_id.as_str(), "registered chart");
        self.sessions.insert(chart_id, session)
    }

    pub fn get(&self, chart_id: &str) -> Option<&ChartSession> {
        self.sessions.get(chart_id)
    }

    pub fn get_mut(&mut self, chart_id: &str) -> Option<&mut ChartSession> {
        self.sessions.get_mut(chart_id)
    }

    pub fn remove(&mut self, chart_id: &str) -> Option<ChartSession> {
        self.sessions.shift_remove(chart_id)
    }

    pub fn contains(&self, chart_id: &str) -> bool {
        self.sessions.contains_key(chart_id)
    }

    /// Registered chart ids, in registration order.
    pub fn chart_ids(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Applies `message` to the chart named by its `chart_id` and records it in that chart's
    /// history.
    pub fn route(&mut self, message: Message) -> Result<()> {
        let session = self.session_for(&message)?;
        session.apply(message)
    }

    /// Routes messages in order, stopping at the first error. Returns how many were applied.
    pub fn route_all(&mut self, messages: impl IntoIterator<Item = Message>) -> Result<usize> {
        let mut routed = 0;
        for message in messages {
            self.route(message)?;
            routed += 1;
        }
        Ok(routed)
    }

    fn session_for(&mut self, message: &Message) -> Result<&mut ChartSession> {
        let Some(chart_id) = message.chart_id.as_deref() else {
            return Err(Error::MissingPayload {
                command: message.command.name(),
                field: "chart_id",
            });
        };
        self.sessions
            .get_mut(chart_id)
            .ok_or_else(|| Error::UnknownChart {
                chart_id: chart_id.to_string(),
            })
    }
}

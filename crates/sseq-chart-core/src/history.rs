//! Message history with replay-based undo.
//!
//! Undo does not compute inverses. It clears the chart and replays every message still in
//! the history, in order.

use crate::chart::SseqChart;
use crate::message::{ChartEntity, Command, Message};
use crate::{Error, Result};

#[derive(Debug)]
pub struct ChartSession {
    chart: SseqChart,
    history: Vec<Message>,
    redo_stack: Vec<Message>,
}

impl ChartSession {
    pub fn new(chart: SseqChart) -> Self {
        Self {
            chart,
            history: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Starts a session from a loaded chart.
    ///
    /// The chart's classes and edges become `create` messages at the start of the history, so
    /// undo can rebuild them. Its current settings become the settings a replay starts from.
    pub fn from_snapshot(chart: SseqChart) -> Result<Self> {
        let mut history: Vec<Message> = chart
            .classes()
            .map(|c| Message::new(Command::Create(ChartEntity::Class(c.clone()))))
            .collect();
        history.extend(
            chart
                .edges()
                .map(|e| Message::new(Command::Create(ChartEntity::Edge(e.clone())))),
        );
        let settings = chart.settings().clone();
        let mut session = Self {
            chart: SseqChart::from_settings(settings)?.with_uuid(chart.uuid()),
            history,
            redo_stack: Vec::new(),
        };
        session.replay()?;
        Ok(session)
    }

    pub fn chart(&self) -> &SseqChart {
        &self.chart
    }

    /// Mutable access for observer registration and direct edits. Direct edits are not
    /// recorded and are lost on the next replay.
    pub fn chart_mut(&mut self) -> &mut SseqChart {
        &mut self.chart
    }

    pub fn into_chart(self) -> SseqChart {
        self.chart
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn redo_stack(&self) -> &[Message] {
        &self.redo_stack
    }

    /// Applies `message` and records it. A new message discards anything that could be redone.
    ///
    /// Failed messages are not recorded.
    pub fn apply(&mut self, message: Message) -> Result<()> {
        self.chart.handle_message(&message)?;
        self.history.push(message);
        self.redo_stack.clear();
        Ok(())
    }

    /// Applies messages in order, stopping at the first error. Earlier messages stay applied.
    pub fn apply_all(&mut self, messages: impl IntoIterator<Item = Message>) -> Result<usize> {
        let mut applied = 0;
        for message in messages {
            self.apply(message)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Moves the last message to the redo stack and rebuilds the chart without it.
    pub fn undo(&mut self) -> Result<()> {
        let Some(message) = self.history.pop() else {
            return Err(Error::EmptyHistory { action: "undo" });
        };
        self.redo_stack.push(message);
        self.replay()
    }

    /// Re-applies the most recently undone message.
    ///
    /// A message that fails to apply stays on the redo stack.
    pub fn redo(&mut self) -> Result<()> {
        let Some(message) = self.redo_stack.last() else {
            return Err(Error::EmptyHistory { action: "redo" });
        };
        self.chart.handle_message(message)?;
        if let Some(message) = self.redo_stack.pop() {
            self.history.push(message);
        }
        Ok(())
    }

    /// Drops the message at `idx` from the history and rebuilds the chart from the rest.
    ///
    /// The redo stack is discarded, since its messages were recorded against the old history.
    pub fn remove_history_item(&mut self, idx: usize) -> Result<Message> {
        if idx >= self.history.len() {
            return Err(Error::HistoryIndex {
                idx,
                len: self.history.len(),
            });
        }
        let removed = self.history.remove(idx);
        self.redo_stack.clear();
        self.replay()?;
        Ok(removed)
    }

    /// Clears the chart and re-applies the whole history.
    ///
    /// On error the messages before the failing one stay applied, and the history is left
    /// untouched so the caller can inspect or edit it.
    pub fn replay(&mut self) -> Result<()> {
        tracing::info!(messages = self.history.len(), "replaying chart history");
        self.chart.clear();
        for message in &self.history {
            self.chart.handle_message(message)?;
        }
        Ok(())
    }
}

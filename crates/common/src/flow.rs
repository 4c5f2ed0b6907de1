//! Per-execution flow state

use serde::{Deserialize, Serialize};

use crate::types::{Answers, NodeId};

/// Where a scenario execution is, what it has answered, and where it has been.
///
/// Created per execution and discarded at the end; carried into reports for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    pub current: NodeId,
    pub answers: Answers,
    pub history: Vec<NodeId>,
}

impl FlowState {
    pub fn start(entry: NodeId) -> Self {
        Self {
            history: vec![entry.clone()],
            current: entry,
            answers: Answers::new(),
        }
    }

    /// Move to `next` and record it in the history
    pub fn advance(&mut self, next: NodeId) {
        self.history.push(next.clone());
        self.current = next;
    }

    /// Append answers given on the current node.
    ///
    /// Earlier answers are never overwritten; a slot answered twice keeps
    /// its first value.
    pub fn record(&mut self, answers: &Answers) {
        for (slot, value) in answers.iter() {
            self.answers
                .0
                .entry(slot.clone())
                .or_insert_with(|| value.to_string());
        }
    }

    pub fn has_visited(&self, id: &NodeId) -> bool {
        self.history.contains(id)
    }
}

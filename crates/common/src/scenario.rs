//! Literal end-to-end paths through a wizard

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::graph::NavigationGraph;
use crate::types::{Answers, NodeId};

/// One hop: answers given on `node`, and the node they must lead to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub node: NodeId,
    #[serde(default)]
    pub answers: Answers,
    pub expect_next: NodeId,
}

impl ScenarioStep {
    pub fn new(node: &str, answers: Answers, expect_next: &str) -> Self {
        Self {
            node: NodeId::new(node),
            answers,
            expect_next: NodeId::new(expect_next),
        }
    }
}

/// Whether a scenario is runnable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScenarioStatus {
    #[default]
    Ready,
    /// Declared but not built; reported as a known gap
    NotImplemented { note: String },
}

/// Which nodes get their negative cases exercised
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NegativePolicy {
    #[default]
    Skip,
    AllNodes,
    Nodes { nodes: Vec<NodeId> },
}

impl NegativePolicy {
    pub fn includes(&self, node: &NodeId) -> bool {
        match self {
            NegativePolicy::Skip => false,
            NegativePolicy::AllNodes => true,
            NegativePolicy::Nodes { nodes } => nodes.contains(node),
        }
    }
}

/// A complete test scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub status: ScenarioStatus,

    #[serde(default)]
    pub negative: NegativePolicy,

    /// Run each exercised node's negative cases a second time and compare verdicts
    #[serde(default)]
    pub verify_idempotence: bool,

    #[serde(default)]
    pub steps: Vec<ScenarioStep>,

    /// Extra text the terminal page body must contain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_text: Option<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            status: ScenarioStatus::Ready,
            negative: NegativePolicy::Skip,
            verify_idempotence: false,
            steps: Vec::new(),
            result_text: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn step(mut self, node: &str, answers: Answers, expect_next: &str) -> Self {
        self.steps.push(ScenarioStep::new(node, answers, expect_next));
        self
    }

    pub fn negative(mut self, policy: NegativePolicy) -> Self {
        self.negative = policy;
        self
    }

    pub fn idempotent(mut self) -> Self {
        self.verify_idempotence = true;
        self
    }

    pub fn result_text(mut self, text: impl Into<String>) -> Self {
        self.result_text = Some(text.into());
        self
    }

    pub fn not_implemented(mut self, note: impl Into<String>) -> Self {
        self.status = ScenarioStatus::NotImplemented { note: note.into() };
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == ScenarioStatus::Ready
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Declared node sequence: entry, each step's target, ending at the terminal node
    pub fn expected_path(&self) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.steps.iter().map(|s| s.node.clone()).collect();
        if let Some(last) = self.steps.last() {
            path.push(last.expect_next.clone());
        }
        path
    }

    /// Check the scenario against the graph it will run on.
    ///
    /// Not-implemented scenarios are only checked for known node names.
    pub fn validate(&self, graph: &NavigationGraph) -> crate::Result<()> {
        let invalid = |reason: String| ModelError::InvalidScenario {
            scenario: self.name.clone(),
            reason,
        };

        for step in &self.steps {
            for id in [&step.node, &step.expect_next] {
                if graph.node(id).is_none() {
                    return Err(invalid(format!("unknown node {}", id)));
                }
            }
        }

        if !self.is_ready() {
            return Ok(());
        }

        let first = self
            .steps
            .first()
            .ok_or_else(|| invalid("scenario has no steps".to_string()))?;
        if first.node != graph.entry().id {
            return Err(invalid(format!(
                "first step is on {}, expected entry node {}",
                first.node,
                graph.entry().id
            )));
        }

        for pair in self.steps.windows(2) {
            if pair[0].expect_next != pair[1].node {
                return Err(invalid(format!(
                    "step on {} expects {} but the next step is on {}",
                    pair[0].node, pair[0].expect_next, pair[1].node
                )));
            }
        }

        if let Some(last) = self.steps.last() {
            let terminal = graph
                .node(&last.expect_next)
                .map(|n| n.is_terminal())
                .unwrap_or(false);
            if !terminal {
                return Err(invalid(format!(
                    "last step leads to {}, which is not a terminal node",
                    last.expect_next
                )));
            }
        }

        if let NegativePolicy::Nodes { nodes } = &self.negative {
            let path = self.expected_path();
            if let Some(missing) = nodes.iter().find(|n| !path.contains(n)) {
                return Err(invalid(format!(
                    "negative cases requested on {}, which is not on the path",
                    missing
                )));
            }
        }

        Ok(())
    }
}

//! Error types for the wizard-flow model

use thiserror::Error;

use crate::types::NodeId;

/// Result type alias using the model error
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while loading or validating a wizard model.
///
/// These are harness-definition defects: they say the model is malformed or
/// out of date, never that the system under test regressed.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Duplicate field name '{field}' (declared on {first} and {second})")]
    DuplicateField {
        field: String,
        first: NodeId,
        second: NodeId,
    },

    #[error("Unknown node '{id}' referenced by {context}")]
    UnknownNode { id: NodeId, context: String },

    #[error("Entry node '{0}' is not declared")]
    MissingEntry(NodeId),

    #[error("Terminal node {0} must not declare {1}")]
    TerminalViolation(NodeId, &'static str),

    #[error("Node {0} is unreachable from the entry node")]
    Unreachable(NodeId),

    #[error("Invalid URL pattern '{pattern}': {reason}")]
    InvalidUrlPattern { pattern: String, reason: String },

    #[error("Invalid negative case '{case}' on {node}: {reason}")]
    InvalidNegativeCase {
        node: NodeId,
        case: String,
        reason: String,
    },

    #[error("Invalid scenario '{scenario}': {reason}")]
    InvalidScenario { scenario: String, reason: String },

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
}

/// Errors raised while resolving transitions in a navigation graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Graph incomplete: no edge from {node} matches answers {answers}")]
    Incomplete { node: NodeId, answers: String },
}

//! Navigation graph: page nodes plus the answer-driven transitions between them

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use tracing::debug;

use crate::error::{GraphError, ModelError};
use crate::types::{
    Answers, Destination, Edge, FieldKind, NodeId, Next, PageNode, Slot,
};

/// A defect found by the completeness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDefect {
    pub node: NodeId,
    /// The answer that fails to resolve, rendered for humans
    pub answer: String,
    pub reason: String,
}

impl fmt::Display for GraphDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.node, self.answer, self.reason)
    }
}

/// Immutable set of nodes and edges, validated on construction
#[derive(Debug, Clone)]
pub struct NavigationGraph {
    entry: NodeId,
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, PageNode>,
    edges: Vec<Edge>,
}

impl NavigationGraph {
    /// Build and validate a graph.
    ///
    /// Rejects duplicate node ids, duplicate field names, dangling edges,
    /// terminal nodes with outgoing edges or fields, malformed negative
    /// cases and nodes unreachable from `entry`.
    pub fn new(entry: NodeId, nodes: Vec<PageNode>, edges: Vec<Edge>) -> crate::Result<Self> {
        let mut order = Vec::with_capacity(nodes.len());
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut field_owner: HashMap<String, NodeId> = HashMap::new();

        for node in nodes {
            if by_id.contains_key(&node.id) {
                return Err(ModelError::DuplicateNode(node.id));
            }
            for field in &node.fields {
                if let Some(first) = field_owner.insert(field.name.clone(), node.id.clone()) {
                    return Err(ModelError::DuplicateField {
                        field: field.name.clone(),
                        first,
                        second: node.id.clone(),
                    });
                }
            }
            validate_negative_cases(&node)?;
            order.push(node.id.clone());
            by_id.insert(node.id.clone(), node);
        }

        if !by_id.contains_key(&entry) {
            return Err(ModelError::MissingEntry(entry));
        }

        for edge in &edges {
            let from = by_id.get(&edge.from).ok_or_else(|| ModelError::UnknownNode {
                id: edge.from.clone(),
                context: format!("edge {} -> {}", edge.from, edge.to),
            })?;
            if from.is_terminal() {
                return Err(ModelError::TerminalViolation(from.id.clone(), "outgoing edges"));
            }
            if let Destination::Node(to) = &edge.to {
                if !by_id.contains_key(to) {
                    return Err(ModelError::UnknownNode {
                        id: to.clone(),
                        context: format!("edge {} -> {}", edge.from, to),
                    });
                }
            }
        }

        for node in by_id.values() {
            if node.is_terminal() && !node.fields.is_empty() {
                return Err(ModelError::TerminalViolation(node.id.clone(), "input fields"));
            }
        }

        let graph = Self {
            entry,
            order,
            nodes: by_id,
            edges,
        };
        graph.check_reachability()?;
        Ok(graph)
    }

    fn check_reachability(&self) -> crate::Result<()> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([self.entry.clone()]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            for edge in self.edges_from(&id) {
                if let Destination::Node(to) = &edge.to {
                    queue.push_back(to.clone());
                }
            }
        }
        match self.order.iter().find(|id| !seen.contains(*id)) {
            Some(id) => Err(ModelError::Unreachable(id.clone())),
            None => Ok(()),
        }
    }

    pub fn entry(&self) -> &PageNode {
        &self.nodes[&self.entry]
    }

    pub fn node(&self, id: &NodeId) -> Option<&PageNode> {
        self.nodes.get(id)
    }

    /// Nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &PageNode> {
        self.order.iter().map(move |id| &self.nodes[id])
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_from<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.from == id)
    }

    /// Resolve the next step for `answers` given on `node`.
    ///
    /// The first matching edge wins. A terminal node resolves to
    /// [`Next::Terminal`]; a non-terminal node with no matching edge is a
    /// completeness defect of the model.
    pub fn resolve_next(&self, node: &NodeId, answers: &Answers) -> Result<Next, GraphError> {
        let current = self
            .nodes
            .get(node)
            .ok_or_else(|| GraphError::UnknownNode(node.clone()))?;

        if current.is_terminal() {
            return Ok(Next::Terminal);
        }

        let edge = self
            .edges_from(node)
            .find(|edge| edge.when.matches(answers))
            .ok_or_else(|| GraphError::Incomplete {
                node: node.clone(),
                answers: answers.to_string(),
            })?;

        debug!(from = %node, when = %edge.when, to = %edge.to, "Resolved edge");

        Ok(match &edge.to {
            Destination::Node(id) => Next::Node { id: id.clone() },
            Destination::Unmodelled { unmodelled } => Next::Unmodelled {
                note: unmodelled.clone(),
            },
        })
    }

    /// Every supported answer of every non-terminal node must resolve.
    ///
    /// Nodes with a choice field are probed with each option of their first
    /// choice field; other nodes with an answer that names none of the
    /// node's choice values.
    pub fn completeness_defects(&self) -> Vec<GraphDefect> {
        let mut defects = Vec::new();
        for node in self.nodes() {
            if node.is_terminal() {
                continue;
            }
            match node.deciding_field() {
                Some(field) => {
                    for option in &field.options {
                        let answers = Answers::new().choice(&field.name, &option.value);
                        if let Err(e) = self.resolve_next(&node.id, &answers) {
                            defects.push(GraphDefect {
                                node: node.id.clone(),
                                answer: format!("{}={}", field.name, option.value),
                                reason: e.to_string(),
                            });
                        }
                    }
                    if field.options.is_empty() {
                        defects.push(GraphDefect {
                            node: node.id.clone(),
                            answer: field.name.clone(),
                            reason: "choice field declares no options".to_string(),
                        });
                    }
                }
                None => {
                    let answers = sample_answers(node);
                    if let Err(e) = self.resolve_next(&node.id, &answers) {
                        defects.push(GraphDefect {
                            node: node.id.clone(),
                            answer: answers.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
        defects
    }

    /// Best guess of which node a live page is, for divergence diagnostics.
    ///
    /// Picks the most specific URL pattern among nodes whose title matches
    /// the observed heading, falling back to URL alone.
    pub fn identify(&self, url: &str, heading: &str) -> Option<&PageNode> {
        let heading = crate::types::normalize_text(heading);
        let by_url = || self.nodes().filter(|n| n.url_pattern.matches(url));

        by_url()
            .filter(|n| !heading.is_empty() && heading.contains(&crate::types::normalize_text(&n.title)))
            .max_by_key(|n| n.url_pattern.specificity())
            .or_else(|| by_url().max_by_key(|n| n.url_pattern.specificity()))
    }

    /// `{node: url pattern}` rows in declaration order
    pub fn url_contract(&self) -> Vec<(NodeId, String)> {
        self.nodes()
            .map(|n| (n.id.clone(), n.url_pattern.to_string()))
            .collect()
    }
}

fn sample_answers(node: &PageNode) -> Answers {
    node.fields
        .iter()
        .flat_map(|f| f.slots())
        .fold(Answers::new(), |acc, slot| acc.slot(slot, "1"))
}

fn validate_negative_cases(node: &PageNode) -> crate::Result<()> {
    let slots: Vec<Slot> = node.slots();
    for case in &node.negative_cases {
        let invalid = |reason: String| ModelError::InvalidNegativeCase {
            node: node.id.clone(),
            case: case.name.clone(),
            reason,
        };
        if node.fields.is_empty() {
            return Err(invalid("node has no input fields".to_string()));
        }
        if case.expected_error_text.trim().is_empty() {
            return Err(invalid("expected error text is empty".to_string()));
        }
        for (slot, _) in case.inputs.iter() {
            if !slots.contains(slot) {
                return Err(invalid(format!("slot {} is not a field of this node", slot)));
            }
            let kind = node.field(&slot.field).map(|f| f.kind);
            if kind == Some(FieldKind::Choice) {
                return Err(invalid(format!(
                    "choice slot {} cannot be restored after a negative case",
                    slot
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChoiceOption, Field, NegativeCase, NodeKind, UrlPattern};

    fn node(id: &str, kind: NodeKind, url: &str, fields: Vec<Field>) -> PageNode {
        PageNode {
            id: NodeId::new(id),
            kind,
            url_pattern: UrlPattern::new(url).unwrap(),
            title: format!("{} title", id),
            body: Default::default(),
            action_label: Some("Continue".to_string()),
            fields,
            positive_checks: vec![],
            negative_cases: vec![],
        }
    }

    fn yes_no() -> Field {
        Field::choice(
            "answer",
            vec![ChoiceOption::new("yes", "Yes"), ChoiceOption::new("no", "No")],
        )
    }

    fn branching_graph() -> NavigationGraph {
        NavigationGraph::new(
            NodeId::new("start"),
            vec![
                node("start", NodeKind::SingleChoice, "/w", vec![yes_no()]),
                node("left", NodeKind::Numeric, "/w/left", vec![Field::numeric("n")]),
                node("done", NodeKind::Result, "/w/", vec![]),
            ],
            vec![
                Edge::when("start", "answer", "yes", Destination::Node(NodeId::new("left"))),
                Edge::when("start", "answer", "no", Destination::unmodelled("right branch")),
                Edge::always("left", "done"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_next_first_match_wins() {
        let graph = branching_graph();
        let next = graph
            .resolve_next(&NodeId::new("start"), &Answers::new().choice("answer", "yes"))
            .unwrap();
        assert_eq!(next, Next::Node { id: NodeId::new("left") });

        let next = graph
            .resolve_next(&NodeId::new("start"), &Answers::new().choice("answer", "no"))
            .unwrap();
        assert!(matches!(next, Next::Unmodelled { .. }));
    }

    #[test]
    fn test_terminal_resolves_to_marker() {
        let graph = branching_graph();
        let next = graph.resolve_next(&NodeId::new("done"), &Answers::new()).unwrap();
        assert_eq!(next, Next::Terminal);
    }

    #[test]
    fn test_unmatched_answer_is_incomplete() {
        let graph = branching_graph();
        let err = graph
            .resolve_next(&NodeId::new("start"), &Answers::new().choice("answer", "maybe"))
            .unwrap_err();
        assert!(matches!(err, GraphError::Incomplete { .. }));
    }

    #[test]
    fn test_completeness_reports_missing_option() {
        let graph = NavigationGraph::new(
            NodeId::new("start"),
            vec![
                node("start", NodeKind::SingleChoice, "/w", vec![yes_no()]),
                node("done", NodeKind::Result, "/w/", vec![]),
            ],
            vec![Edge::when("start", "answer", "yes", Destination::Node(NodeId::new("done")))],
        )
        .unwrap();
        let defects = graph.completeness_defects();
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].answer, "answer=no");
        assert!(branching_graph().completeness_defects().is_empty());
    }

    #[test]
    fn test_rejects_terminal_with_edges() {
        let err = NavigationGraph::new(
            NodeId::new("done"),
            vec![
                node("done", NodeKind::Result, "/w/", vec![]),
                node("x", NodeKind::Landing, "/x", vec![]),
            ],
            vec![Edge::always("done", "x")],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::TerminalViolation(_, _)));
    }

    #[test]
    fn test_rejects_unreachable_node() {
        let err = NavigationGraph::new(
            NodeId::new("start"),
            vec![
                node("start", NodeKind::Landing, "/w", vec![]),
                node("done", NodeKind::Result, "/w/", vec![]),
                node("orphan", NodeKind::Result, "/o", vec![]),
            ],
            vec![Edge::always("start", "done")],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Unreachable(id) if id.as_str() == "orphan"));
    }

    #[test]
    fn test_rejects_duplicate_field_names() {
        let err = NavigationGraph::new(
            NodeId::new("a"),
            vec![
                node("a", NodeKind::Numeric, "/a", vec![Field::numeric("n")]),
                node("b", NodeKind::Numeric, "/b", vec![Field::numeric("n")]),
            ],
            vec![Edge::always("a", "b")],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateField { .. }));
    }

    #[test]
    fn test_rejects_choice_inputs_in_negative_case() {
        let mut start = node("start", NodeKind::SingleChoice, "/w", vec![yes_no()]);
        start.negative_cases.push(NegativeCase::new(
            "picked",
            Answers::new().choice("answer", "yes"),
            "Please answer this question",
        ));
        let err = NavigationGraph::new(NodeId::new("start"), vec![start], vec![]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidNegativeCase { .. }));
    }

    #[test]
    fn test_identify_prefers_title_then_specificity() {
        let graph = branching_graph();
        let found = graph.identify("https://example.test/w/left", "left title").unwrap();
        assert_eq!(found.id.as_str(), "left");
        let fallback = graph.identify("https://example.test/w/left", "something else").unwrap();
        assert_eq!(fallback.id.as_str(), "left");
        assert!(graph.identify("https://example.test/elsewhere", "").is_none());
    }
}

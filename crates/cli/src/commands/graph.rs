//! Graph Commands
//!
//! Inspect the navigation graph: nodes with their URL contract, edges, and
//! answers that resolve nowhere.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use wizcheck_common::{Edge, GraphDefect, NavigationGraph, PageNode};

use super::{load_wizard, EXIT_FAILED, EXIT_OK};
use crate::output::{print_list, print_success, print_value, print_warning, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct GraphArgs {
    /// Wizard model YAML (defaults to the built-in holiday entitlement model)
    #[arg(long)]
    pub model: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct NodeRow {
    pub id: String,
    pub kind: String,
    pub url_pattern: String,
    pub title: String,
    pub fields: Vec<String>,
    pub negative_cases: usize,
}

impl From<&PageNode> for NodeRow {
    fn from(node: &PageNode) -> Self {
        Self {
            id: node.id.to_string(),
            kind: node.kind.to_string(),
            url_pattern: node.url_pattern.to_string(),
            title: node.title.clone(),
            fields: node.fields.iter().map(|f| f.name.clone()).collect(),
            negative_cases: node.negative_cases.len(),
        }
    }
}

impl TableDisplay for NodeRow {
    fn headers() -> Vec<&'static str> {
        vec!["Node", "Kind", "URL Pattern", "Title", "Fields", "Negative Cases"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.kind.clone(),
            self.url_pattern.clone(),
            self.title.clone(),
            self.fields.join(", "),
            self.negative_cases.to_string(),
        ]
    }
}

#[derive(Serialize)]
pub struct EdgeRow {
    pub from: String,
    pub when: String,
    pub to: String,
}

impl From<&Edge> for EdgeRow {
    fn from(edge: &Edge) -> Self {
        Self {
            from: edge.from.to_string(),
            when: edge.when.to_string(),
            to: edge.to.to_string(),
        }
    }
}

impl TableDisplay for EdgeRow {
    fn headers() -> Vec<&'static str> {
        vec!["From", "When", "To"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.from.clone(), self.when.clone(), self.to.clone()]
    }
}

impl TableDisplay for GraphDefect {
    fn headers() -> Vec<&'static str> {
        vec!["Node", "Answer", "Reason"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.node.to_string(), self.answer.clone(), self.reason.clone()]
    }
}

/// Everything `graph` prints, for structured output
#[derive(Serialize)]
pub struct GraphView {
    pub entry: String,
    pub nodes: Vec<NodeRow>,
    pub edges: Vec<EdgeRow>,
    pub defects: Vec<GraphDefect>,
}

impl From<&NavigationGraph> for GraphView {
    fn from(graph: &NavigationGraph) -> Self {
        Self {
            entry: graph.entry().id.to_string(),
            nodes: graph.nodes().map(NodeRow::from).collect(),
            edges: graph.edges().iter().map(EdgeRow::from).collect(),
            defects: graph.completeness_defects(),
        }
    }
}

pub async fn execute(args: GraphArgs, format: OutputFormat) -> Result<u8> {
    let wizard = load_wizard(args.model.as_deref())?;
    let view = GraphView::from(wizard.graph());

    if format.is_structured() {
        print_value(&view, format)?;
    } else {
        println!("Wizard {} (entry: {})", wizard.name(), view.entry);
        print_list(&view.nodes, format);
        print_list(&view.edges, format);
        if view.defects.is_empty() {
            print_success("Every supported answer resolves");
        } else {
            print_warning(&format!("{} unresolved answer(s)", view.defects.len()));
            print_list(&view.defects, format);
        }
    }

    Ok(if view.defects.is_empty() {
        EXIT_OK
    } else {
        EXIT_FAILED
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_graph_view_has_no_defects() {
        let wizard = load_wizard(None).unwrap();
        let view = GraphView::from(wizard.graph());
        assert_eq!(view.entry, "start");
        assert_eq!(view.nodes.len(), 8);
        assert!(view.defects.is_empty());
    }

    #[test]
    fn test_edge_rows_render_predicates() {
        let wizard = load_wizard(None).unwrap();
        let view = GraphView::from(wizard.graph());
        let row = view
            .edges
            .iter()
            .find(|e| e.from == "irregular_hours" && e.to == "leave_year_start")
            .unwrap();
        assert_eq!(row.when, "irregular_hours=yes");
    }
}

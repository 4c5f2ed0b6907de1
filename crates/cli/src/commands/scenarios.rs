//! Scenario Commands

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use wizcheck_common::{NegativePolicy, Scenario, ScenarioStatus};

use super::{load_wizard, EXIT_OK};
use crate::output::{print_list, print_value, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ScenariosArgs {
    /// Wizard model YAML (defaults to the built-in holiday entitlement model)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,
}

/// Scenario listing row
#[derive(Serialize)]
pub struct ScenarioRow {
    pub name: String,
    pub status: String,
    pub tags: Vec<String>,
    pub negatives: String,
    pub steps: usize,
    pub description: String,
}

impl From<&Scenario> for ScenarioRow {
    fn from(scenario: &Scenario) -> Self {
        let status = match &scenario.status {
            ScenarioStatus::Ready => "ready".to_string(),
            ScenarioStatus::NotImplemented { note } => format!("not implemented ({})", note),
        };
        let mut negatives = match &scenario.negative {
            NegativePolicy::Skip => "-".to_string(),
            NegativePolicy::AllNodes => "all nodes".to_string(),
            NegativePolicy::Nodes { nodes } => nodes
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };
        if scenario.verify_idempotence {
            negatives.push_str(" (x2)");
        }
        Self {
            name: scenario.name.clone(),
            status,
            tags: scenario.tags.clone(),
            negatives,
            steps: scenario.steps.len(),
            description: scenario.description.clone(),
        }
    }
}

impl TableDisplay for ScenarioRow {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Status", "Tags", "Negative Cases", "Steps", "Description"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.status.clone(),
            self.tags.join(", "),
            self.negatives.clone(),
            self.steps.to_string(),
            self.description.clone(),
        ]
    }
}

pub async fn execute(args: ScenariosArgs, format: OutputFormat) -> Result<u8> {
    let wizard = load_wizard(args.model.as_deref())?;
    let rows: Vec<ScenarioRow> = wizard
        .scenarios()
        .iter()
        .filter(|s| args.tag.as_deref().map_or(true, |t| s.has_tag(t)))
        .map(ScenarioRow::from)
        .collect();

    if format.is_structured() {
        print_value(&rows, format)?;
    } else {
        print_list(&rows, format);
    }
    Ok(EXIT_OK)
}

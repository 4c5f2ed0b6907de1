//! Negative Commands
//!
//! Walk to one node along a scenario path and exercise its negative cases
//! in isolation.

use anyhow::{anyhow, bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use wizcheck_common::{NodeId, Scenario, Wizard};
use wizcheck_e2e::{CaseVerdict, ElementAccessor, Oracle, Outcome, ScenarioRunner, Violation, WaitPolicy};

use super::{load_config, load_wizard, session_factory, EXIT_FAILED, EXIT_HARNESS, EXIT_OK};
use crate::output::{outcome_label, print_error, print_list, print_success, print_value, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct NegativeArgs {
    /// Node whose negative cases to run
    pub node: String,

    /// Scenario whose path leads to the node (defaults to the first that does)
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Drive the in-memory simulated site instead of Chrome
    #[arg(long)]
    pub simulated: bool,

    /// Run the cases twice and compare verdicts
    #[arg(long)]
    pub twice: bool,

    /// Wizard model YAML (defaults to the built-in holiday entitlement model)
    #[arg(long)]
    pub model: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct VerdictRow {
    pub case: String,
    pub run: usize,
    pub passed: bool,
    pub detail: String,
}

impl VerdictRow {
    fn rows(run: usize, verdicts: &[CaseVerdict]) -> impl Iterator<Item = VerdictRow> + '_ {
        verdicts.iter().map(move |v| VerdictRow {
            case: v.case.clone(),
            run,
            passed: v.passed(),
            detail: v.violation.as_ref().map(|v| v.to_string()).unwrap_or_default(),
        })
    }
}

impl TableDisplay for VerdictRow {
    fn headers() -> Vec<&'static str> {
        vec!["Case", "Run", "Verdict", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        let verdict = if self.passed {
            Outcome::Passed
        } else {
            Outcome::Failed
        };
        vec![
            self.case.clone(),
            self.run.to_string(),
            outcome_label(verdict),
            self.detail.clone(),
        ]
    }
}

/// Verdicts of one `negative` invocation
#[derive(Serialize)]
pub struct NegativeReport {
    pub node: NodeId,
    pub scenario: String,
    pub verdicts: Vec<VerdictRow>,
    pub inconsistencies: Vec<Violation>,
}

impl NegativeReport {
    fn passed(&self) -> bool {
        self.inconsistencies.is_empty() && self.verdicts.iter().all(|v| v.passed)
    }
}

/// The named scenario, or the first ready one whose path visits `node`
pub fn route<'w>(wizard: &'w Wizard, node: &NodeId, name: Option<&str>) -> Result<&'w Scenario> {
    if let Some(name) = name {
        let scenario = wizard.scenario(name)?;
        if !scenario.expected_path().contains(node) {
            bail!("Scenario {} does not visit {}", name, node);
        }
        return Ok(scenario);
    }
    wizard
        .scenarios()
        .iter()
        .find(|s| s.is_ready() && s.expected_path().contains(node))
        .ok_or_else(|| anyhow!("No scenario visits {}", node))
}

pub async fn execute(args: NegativeArgs, config_path: &Path, format: OutputFormat) -> Result<u8> {
    let config = load_config(config_path)?;
    let wizard = load_wizard(args.model.as_deref())?;
    let node_id = NodeId::new(args.node.as_str());
    let node = wizard
        .graph()
        .node(&node_id)
        .ok_or_else(|| anyhow!("Unknown node {}", node_id))?;
    if node.negative_cases.is_empty() {
        bail!("{} declares no negative cases", node_id);
    }
    let scenario = route(&wizard, &node_id, args.scenario.as_deref())?.clone();

    let factory = session_factory(&config, args.simulated)?;
    let runner = ScenarioRunner::from_config(wizard.clone(), &config);
    let session = factory.open().await?;

    let outcome = exercise(&runner, &config.wait_policy(), session.as_ref(), &scenario, &args).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close session");
    }

    let report = match outcome {
        Ok(report) => report,
        Err(code) => return Ok(code),
    };

    if format.is_structured() {
        print_value(&report, format)?;
    } else {
        print_list(&report.verdicts, format);
        for violation in &report.inconsistencies {
            print_error(&violation.to_string());
        }
        if report.passed() {
            print_success(&format!("{} rejects every invalid input", report.node));
        }
    }

    Ok(if report.passed() { EXIT_OK } else { EXIT_FAILED })
}

async fn exercise(
    runner: &ScenarioRunner,
    wait: &WaitPolicy,
    session: &dyn ElementAccessor,
    scenario: &Scenario,
    args: &NegativeArgs,
) -> std::result::Result<NegativeReport, u8> {
    let node_id = NodeId::new(args.node.as_str());
    if let Err(report) = runner.reach(scenario, &node_id, session).await {
        print_error(&format!("Could not reach {}: {}", node_id, report.summary()));
        return Err(match report.outcome {
            Outcome::Failed => EXIT_FAILED,
            _ => EXIT_HARNESS,
        });
    }

    let Some(node) = runner.wizard().graph().node(&node_id) else {
        return Err(EXIT_HARNESS);
    };
    let oracle = Oracle::new(session, *wait);
    let result = if args.twice {
        oracle.verify_idempotence(node).await.map(|r| {
            let mut verdicts: Vec<VerdictRow> = VerdictRow::rows(1, &r.first).collect();
            verdicts.extend(VerdictRow::rows(2, &r.second));
            (verdicts, r.violations)
        })
    } else {
        oracle
            .run_negative_cases(node)
            .await
            .map(|v| (VerdictRow::rows(1, &v).collect(), Vec::new()))
    };

    match result {
        Ok((verdicts, inconsistencies)) => Ok(NegativeReport {
            node: node_id,
            scenario: scenario.name.clone(),
            verdicts,
            inconsistencies,
        }),
        Err(e) => {
            print_error(&format!("Negative cases on {} could not run: {}", node_id, e));
            Err(EXIT_FAILED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_picks_first_visiting_scenario() {
        let wizard = load_wizard(None).unwrap();
        let days = NodeId::new("days_per_week");
        assert_eq!(route(&wizard, &days, None).unwrap().name, "regular-days-full-year");

        let leave = NodeId::new("leave_year_start");
        assert!(route(&wizard, &leave, Some("regular-days-full-year")).is_err());
        assert_eq!(
            route(&wizard, &leave, Some("leave-year-start-validation")).unwrap().name,
            "leave-year-start-validation"
        );
    }

    #[tokio::test]
    async fn test_simulated_negative_cases_twice() {
        let dir = tempfile::tempdir().unwrap();
        let args = NegativeArgs {
            node: "days_per_week".to_string(),
            scenario: None,
            simulated: true,
            twice: true,
            model: None,
        };

        let code = execute(args, &dir.path().join("wizcheck.toml"), OutputFormat::Json)
            .await
            .unwrap();

        assert_eq!(code, EXIT_OK);
    }

    #[tokio::test]
    async fn test_node_without_cases_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = NegativeArgs {
            node: "start".to_string(),
            scenario: None,
            simulated: true,
            twice: false,
            model: None,
        };

        let err = execute(args, &dir.path().join("wizcheck.toml"), OutputFormat::Table)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no negative cases"));
    }
}

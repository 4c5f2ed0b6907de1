//! Scenario and suite reports

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use wizcheck_common::{Answers, NodeId};

use crate::error::E2eResult;
use crate::oracle::{CaseVerdict, Violation};
use crate::runner::{AbortReason, RunState};

/// How a scenario counts in the suite totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// The system under test broke a contract or diverged from the model
    Failed,
    /// Declared but not built, or reached an unmodelled branch
    KnownGap,
    /// The model or the browser session is at fault, not the system under test
    HarnessDefect,
}

impl Outcome {
    pub fn from_reason(reason: Option<&AbortReason>) -> Self {
        match reason {
            None => Outcome::Passed,
            Some(AbortReason::Violations { .. }) | Some(AbortReason::FlowDivergence { .. }) => {
                Outcome::Failed
            }
            Some(AbortReason::NotImplemented { .. }) => Outcome::KnownGap,
            Some(AbortReason::GraphIncomplete { .. }) | Some(AbortReason::Accessor { .. }) => {
                Outcome::HarnessDefect
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::KnownGap => "known gap",
            Outcome::HarnessDefect => "harness defect",
        }
    }
}

/// Negative cases exercised on one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeNegatives {
    pub node: NodeId,
    pub verdicts: Vec<CaseVerdict>,
    /// Second pass, when idempotence was verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Vec<CaseVerdict>>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub outcome: Outcome,
    pub state: RunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<AbortReason>,
    /// Visited node ids, in order
    pub history: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<NodeId>,
    pub violations: Vec<Violation>,
    pub negatives: Vec<NodeNegatives>,
    pub answers: Answers,
    pub duration_ms: u64,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    /// One line describing why the scenario did not pass
    pub fn summary(&self) -> String {
        match &self.reason {
            None => "completed".to_string(),
            Some(reason) => match self.violations.first() {
                Some(first) if self.violations.len() > 1 => {
                    format!("{}; {} (+{} more)", reason, first, self.violations.len() - 1)
                }
                Some(first) => format!("{}; {}", reason, first),
                None => reason.to_string(),
            },
        }
    }
}

/// Result of running many scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub known_gaps: usize,
    pub harness_defects: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn from_results(results: Vec<ScenarioReport>, duration_ms: u64) -> Self {
        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            known_gaps: count(Outcome::KnownGap),
            harness_defects: count(Outcome::HarnessDefect),
            duration_ms,
            results,
        }
    }

    /// Known gaps do not fail a suite
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.harness_defects == 0
    }

    pub fn result(&self, scenario: &str) -> Option<&ScenarioReport> {
        self.results.iter().find(|r| r.scenario == scenario)
    }

    /// Write the report as `test-results.json` under `output_dir`
    pub fn write_results(&self, output_dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, reason: Option<AbortReason>) -> ScenarioReport {
        ScenarioReport {
            scenario: name.to_string(),
            outcome: Outcome::from_reason(reason.as_ref()),
            state: if reason.is_some() {
                RunState::Aborted
            } else {
                RunState::Completed
            },
            reason,
            history: vec![],
            failed_at: None,
            violations: vec![],
            negatives: vec![],
            answers: Answers::new(),
            duration_ms: 0,
        }
    }

    #[test]
    fn test_known_gaps_do_not_fail_the_suite() {
        let suite = SuiteReport::from_results(
            vec![
                report("a", None),
                report(
                    "b",
                    Some(AbortReason::NotImplemented {
                        note: "later".to_string(),
                    }),
                ),
            ],
            10,
        );
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.known_gaps, 1);
        assert!(suite.is_success());
    }

    #[test]
    fn test_harness_defects_fail_the_suite() {
        let suite = SuiteReport::from_results(
            vec![report(
                "a",
                Some(AbortReason::Accessor {
                    message: "launch failed".to_string(),
                }),
            )],
            0,
        );
        assert_eq!(suite.harness_defects, 1);
        assert!(!suite.is_success());
    }

    #[test]
    fn test_write_results_creates_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let suite = SuiteReport::from_results(vec![report("a", None)], 3);
        let path = suite.write_results(&dir.path().join("out")).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["passed"], 1);
        assert_eq!(written["results"][0]["outcome"], "passed");
    }
}

//! Scenario Runner: walks a scenario through a live session, node by node
//!
//! ```text
//! NotStarted -> AtNode(entry) -> Submitting(n) -> AtNode(n') -> ... -> Completed
//!                     \                \                \
//!                      `----------------`----------------`--> Aborted
//! ```
//!
//! At every node the positive contract is checked, then the node's negative
//! cases when the scenario asks for them, then the step's answers are
//! submitted. The model predicts the next node and the live page must agree.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use wizcheck_common::{
    Expect, FlowState, Next, NodeId, PageNode, Role, Scenario, ScenarioStatus, Target, Wizard,
};

use crate::accessor::{bounded, ElementAccessor, SessionFactory};
use crate::config::HarnessConfig;
use crate::error::E2eError;
use crate::oracle::{Oracle, Violation, ViolationKind};
use crate::page::NodeDriver;
use crate::report::{NodeNegatives, Outcome, ScenarioReport, SuiteReport};
use crate::wait::WaitPolicy;

/// Where an execution is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    AtNode { node: NodeId },
    Submitting { node: NodeId },
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => write!(f, "not started"),
            RunState::AtNode { node } => write!(f, "at {}", node),
            RunState::Submitting { node } => write!(f, "submitting {}", node),
            RunState::Completed => write!(f, "completed"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Why an execution stopped before completing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// Contract violations collected on `node`
    Violations { node: NodeId, count: usize },
    /// The live page or the model went somewhere the scenario did not declare
    FlowDivergence {
        from: NodeId,
        expected: NodeId,
        /// Best guess at the node actually shown
        #[serde(default, skip_serializing_if = "Option::is_none")]
        observed: Option<NodeId>,
        url: String,
        heading: String,
        detail: String,
    },
    /// No edge matched the answers given
    GraphIncomplete { detail: String },
    /// Declared but unbuilt, or an unmodelled branch
    NotImplemented { note: String },
    /// The browser session failed
    Accessor { message: String },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Violations { node, count } => {
                write!(f, "{} violation(s) on {}", count, node)
            }
            AbortReason::FlowDivergence {
                from,
                expected,
                observed,
                url,
                detail,
                ..
            } => {
                write!(f, "flow diverged after {}: expected {}", from, expected)?;
                if let Some(observed) = observed {
                    write!(f, ", page looks like {}", observed)?;
                }
                write!(f, " at {} ({})", url, detail)
            }
            AbortReason::GraphIncomplete { detail } => write!(f, "graph incomplete: {}", detail),
            AbortReason::NotImplemented { note } => write!(f, "not implemented: {}", note),
            AbortReason::Accessor { message } => write!(f, "browser session failed: {}", message),
        }
    }
}

/// Mutable state of one scenario execution
struct Execution<'s> {
    scenario: &'s Scenario,
    started: Instant,
    state: RunState,
    flow: Option<FlowState>,
    reason: Option<AbortReason>,
    failed_at: Option<NodeId>,
    violations: Vec<Violation>,
    negatives: Vec<NodeNegatives>,
}

impl<'s> Execution<'s> {
    fn new(scenario: &'s Scenario) -> Self {
        Self {
            scenario,
            started: Instant::now(),
            state: RunState::NotStarted,
            flow: None,
            reason: None,
            failed_at: None,
            violations: Vec::new(),
            negatives: Vec::new(),
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!(scenario = %self.scenario.name, from = %self.state, to = %next, "Transition");
        self.state = next;
    }

    fn abort(&mut self, at: Option<&NodeId>, reason: AbortReason) {
        match &reason {
            AbortReason::NotImplemented { note } => {
                info!(scenario = %self.scenario.name, note, "Known gap")
            }
            other => error!(scenario = %self.scenario.name, reason = %other, "Scenario aborted"),
        }
        self.failed_at = at.cloned();
        self.reason = Some(reason);
        self.transition(RunState::Aborted);
    }

    fn interaction_failure(&mut self, node: &PageNode, e: E2eError) {
        match e {
            E2eError::Timeout { .. }
            | E2eError::ElementNotFound(_)
            | E2eError::NotInteractable { .. } => {
                let violation = Violation {
                    node: node.id.clone(),
                    kind: ViolationKind::Interaction,
                    case: None,
                    check: "inputs and primary action are usable".to_string(),
                    expected: "usable".to_string(),
                    actual: e.to_string(),
                };
                warn!(node = %node.id, %violation, "Interaction failed");
                self.violations.push(violation);
                self.abort(
                    Some(&node.id),
                    AbortReason::Violations {
                        node: node.id.clone(),
                        count: 1,
                    },
                );
            }
            other => self.abort(
                Some(&node.id),
                AbortReason::Accessor {
                    message: other.to_string(),
                },
            ),
        }
    }

    fn finish(self) -> ScenarioReport {
        let (history, answers) = match self.flow {
            Some(flow) => (flow.history, flow.answers),
            None => (Vec::new(), Default::default()),
        };
        ScenarioReport {
            scenario: self.scenario.name.clone(),
            outcome: Outcome::from_reason(self.reason.as_ref()),
            state: self.state,
            reason: self.reason,
            history,
            failed_at: self.failed_at,
            violations: self.violations,
            negatives: self.negatives,
            answers,
            duration_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

/// Runs scenarios of one wizard against accessor sessions
pub struct ScenarioRunner {
    wizard: Arc<Wizard>,
    entry_url: String,
    wait: WaitPolicy,
}

impl ScenarioRunner {
    pub fn new(wizard: Arc<Wizard>, entry_url: impl Into<String>, wait: WaitPolicy) -> Self {
        Self {
            wizard,
            entry_url: entry_url.into(),
            wait,
        }
    }

    pub fn from_config(wizard: Arc<Wizard>, config: &HarnessConfig) -> Self {
        let entry_url = config.entry_url(wizard.entry_path());
        Self::new(wizard, entry_url, config.wait_policy())
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    /// Run one scenario on an already open session
    pub async fn run(&self, scenario: &Scenario, accessor: &dyn ElementAccessor) -> ScenarioReport {
        info!(scenario = %scenario.name, "Running scenario");
        let mut exec = Execution::new(scenario);
        self.drive(&mut exec, accessor, None).await;
        if exec.reason.is_none() {
            exec.transition(RunState::Completed);
        }
        let report = exec.finish();
        info!(
            scenario = %report.scenario,
            outcome = report.outcome.as_str(),
            duration_ms = report.duration_ms,
            "Scenario finished"
        );
        report
    }

    /// Run one scenario in a fresh session from `factory`.
    ///
    /// Not-implemented scenarios are reported without opening a session.
    pub async fn run_in_session(
        &self,
        factory: &dyn SessionFactory,
        scenario: &Scenario,
    ) -> ScenarioReport {
        if !scenario.is_ready() {
            return self.run_without_session(scenario);
        }

        let session = match factory.open().await {
            Ok(session) => session,
            Err(e) => {
                let mut exec = Execution::new(scenario);
                exec.abort(
                    None,
                    AbortReason::Accessor {
                        message: format!("could not open {}: {}", factory.describe(), e),
                    },
                );
                return exec.finish();
            }
        };

        let report = self.run(scenario, session.as_ref()).await;
        if let Err(e) = session.close().await {
            warn!(scenario = %scenario.name, error = %e, "Failed to close session");
        }
        report
    }

    fn run_without_session(&self, scenario: &Scenario) -> ScenarioReport {
        let mut exec = Execution::new(scenario);
        if let ScenarioStatus::NotImplemented { note } = &scenario.status {
            exec.abort(None, AbortReason::NotImplemented { note: note.clone() });
        }
        exec.finish()
    }

    /// Run many scenarios, each in its own session, at most `concurrency` at a time.
    ///
    /// Results keep the order of `scenarios`.
    pub async fn run_suite(
        &self,
        factory: &dyn SessionFactory,
        scenarios: &[Scenario],
        concurrency: usize,
    ) -> SuiteReport {
        let start = Instant::now();
        info!(
            count = scenarios.len(),
            concurrency,
            sessions = %factory.describe(),
            "Running {} scenario(s)",
            scenarios.len()
        );

        let mut indexed: Vec<(usize, ScenarioReport)> = stream::iter(scenarios.iter().enumerate())
            .map(|(i, scenario)| async move { (i, self.run_in_session(factory, scenario).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
        indexed.sort_by_key(|(i, _)| *i);

        let suite = SuiteReport::from_results(
            indexed.into_iter().map(|(_, report)| report).collect(),
            start.elapsed().as_millis() as u64,
        );
        info!(
            "Results: {} passed, {} failed, {} known gap(s), {} harness defect(s) ({} ms)",
            suite.passed, suite.failed, suite.known_gaps, suite.harness_defects, suite.duration_ms
        );
        suite
    }

    /// Follow `scenario` until `target` is shown and its positive contract holds.
    ///
    /// Returns the flow state at `target`, or the report of the execution
    /// that failed to get there.
    pub async fn reach(
        &self,
        scenario: &Scenario,
        target: &NodeId,
        accessor: &dyn ElementAccessor,
    ) -> Result<FlowState, ScenarioReport> {
        let mut exec = Execution::new(scenario);
        self.drive(&mut exec, accessor, Some(target)).await;

        let arrived = exec.reason.is_none()
            && exec.state == RunState::AtNode {
                node: target.clone(),
            };
        match exec.flow.take() {
            Some(flow) if arrived => Ok(flow),
            flow => {
                exec.flow = flow;
                if exec.reason.is_none() {
                    exec.abort(
                        None,
                        AbortReason::GraphIncomplete {
                            detail: format!("{} is not on the path of {}", target, scenario.name),
                        },
                    );
                }
                Err(exec.finish())
            }
        }
    }

    async fn drive(
        &self,
        exec: &mut Execution<'_>,
        accessor: &dyn ElementAccessor,
        stop_at: Option<&NodeId>,
    ) {
        let scenario = exec.scenario;
        if let ScenarioStatus::NotImplemented { note } = &scenario.status {
            exec.abort(None, AbortReason::NotImplemented { note: note.clone() });
            return;
        }

        let graph = self.wizard.graph();
        let oracle = Oracle::new(accessor, self.wait);
        let timeout = self.wait.timeout();

        let opened = async {
            bounded("navigate to entry", timeout, accessor.navigate(&self.entry_url)).await?;
            bounded("accept consent", timeout, accessor.bootstrap()).await
        };
        if let Err(e) = opened.await {
            exec.abort(
                None,
                AbortReason::Accessor {
                    message: e.to_string(),
                },
            );
            return;
        }

        let entry = graph.entry();
        exec.flow = Some(FlowState::start(entry.id.clone()));
        exec.transition(RunState::AtNode {
            node: entry.id.clone(),
        });

        for step in &scenario.steps {
            let current = exec.flow.as_ref().map(|f| f.current.clone());
            if current.as_ref() != Some(&step.node) {
                let detail = format!(
                    "step on {} but the flow is at {}",
                    step.node,
                    current.as_ref().map(|c| c.to_string()).unwrap_or_default()
                );
                exec.abort(current.as_ref(), AbortReason::GraphIncomplete { detail });
                return;
            }
            let node = match graph.node(&step.node) {
                Some(node) => node,
                None => {
                    exec.abort(
                        None,
                        AbortReason::GraphIncomplete {
                            detail: format!("unknown node {}", step.node),
                        },
                    );
                    return;
                }
            };

            if !self.check_node(exec, &oracle, node).await {
                return;
            }
            if stop_at == Some(&node.id) {
                return;
            }
            if !self.exercise_negatives(exec, &oracle, node).await {
                return;
            }

            exec.transition(RunState::Submitting {
                node: node.id.clone(),
            });
            let answers = match exec.flow.as_mut() {
                Some(flow) => {
                    flow.record(&step.answers);
                    flow.answers.clone()
                }
                None => return,
            };
            let driver = NodeDriver::new(accessor, node, self.wait);
            if let Err(e) = driver.submit(&step.answers).await {
                exec.interaction_failure(node, e);
                return;
            }

            let next_id = match graph.resolve_next(&node.id, &answers) {
                Ok(Next::Node { id }) => id,
                Ok(Next::Unmodelled { note }) => {
                    exec.abort(Some(&node.id), AbortReason::NotImplemented { note });
                    return;
                }
                Ok(Next::Terminal) => {
                    let detail = format!("model ends at {}", node.id);
                    self.diverge(exec, accessor, node, &step.expect_next, detail).await;
                    return;
                }
                Err(e) => {
                    exec.abort(
                        Some(&node.id),
                        AbortReason::GraphIncomplete {
                            detail: e.to_string(),
                        },
                    );
                    return;
                }
            };

            if next_id != step.expect_next {
                let detail = format!("model resolves {} -> {}", node.id, next_id);
                self.diverge(exec, accessor, node, &step.expect_next, detail).await;
                return;
            }
            if exec.flow.as_ref().map(|f| f.has_visited(&next_id)).unwrap_or(false) {
                let detail = format!("{} was already visited", next_id);
                self.diverge(exec, accessor, node, &next_id, detail).await;
                return;
            }

            let next = match graph.node(&next_id) {
                Some(next) => next,
                None => {
                    exec.abort(
                        Some(&node.id),
                        AbortReason::GraphIncomplete {
                            detail: format!("unknown node {}", next_id),
                        },
                    );
                    return;
                }
            };
            if let Err(mismatch) = NodeDriver::new(accessor, next, self.wait).arrived().await {
                self.diverge(exec, accessor, node, &next_id, mismatch.to_string())
                    .await;
                return;
            }

            if let Some(flow) = exec.flow.as_mut() {
                flow.advance(next_id.clone());
            }
            exec.transition(RunState::AtNode { node: next_id });
        }

        let current = match exec.flow.as_ref() {
            Some(flow) => flow.current.clone(),
            None => return,
        };
        let Some(last) = graph.node(&current) else {
            return;
        };
        if !self.check_node(exec, &oracle, last).await {
            return;
        }
        if let Some(text) = &scenario.result_text {
            let check = oracle
                .check_element(last, Target::role(Role::Body), Expect::contains(text.clone()))
                .await;
            if let Some(violation) = check {
                warn!(node = %last.id, %violation, "Result text missing");
                exec.violations.push(violation);
                exec.abort(
                    Some(&last.id),
                    AbortReason::Violations {
                        node: last.id.clone(),
                        count: 1,
                    },
                );
            }
        }
    }

    /// Positive contract of `node`; aborts the execution on any violation
    async fn check_node(&self, exec: &mut Execution<'_>, oracle: &Oracle<'_>, node: &PageNode) -> bool {
        let violations = oracle.check_positive(node).await;
        if violations.is_empty() {
            return true;
        }
        let count = violations.len();
        exec.violations.extend(violations);
        exec.abort(
            Some(&node.id),
            AbortReason::Violations {
                node: node.id.clone(),
                count,
            },
        );
        false
    }

    async fn exercise_negatives(
        &self,
        exec: &mut Execution<'_>,
        oracle: &Oracle<'_>,
        node: &PageNode,
    ) -> bool {
        let scenario = exec.scenario;
        if !scenario.negative.includes(&node.id) || node.negative_cases.is_empty() {
            return true;
        }

        let outcome = if scenario.verify_idempotence {
            oracle
                .verify_idempotence(node)
                .await
                .map(|r| (r.first, Some(r.second), r.violations))
        } else {
            oracle
                .run_negative_cases(node)
                .await
                .map(|verdicts| (verdicts, None, Vec::new()))
        };

        let (verdicts, repeat, inconsistent) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                exec.interaction_failure(node, e);
                return false;
            }
        };

        let mut violations: Vec<Violation> = verdicts
            .iter()
            .filter_map(|v| v.violation.clone())
            .collect();
        violations.extend(inconsistent);
        exec.negatives.push(NodeNegatives {
            node: node.id.clone(),
            verdicts,
            repeat,
        });

        if violations.is_empty() {
            return true;
        }
        let count = violations.len();
        exec.violations.extend(violations);
        exec.abort(
            Some(&node.id),
            AbortReason::Violations {
                node: node.id.clone(),
                count,
            },
        );
        false
    }

    async fn diverge(
        &self,
        exec: &mut Execution<'_>,
        accessor: &dyn ElementAccessor,
        from: &PageNode,
        expected: &NodeId,
        detail: String,
    ) {
        let url = bounded("read url", self.wait.timeout(), accessor.current_url())
            .await
            .unwrap_or_default();
        let heading = NodeDriver::new(accessor, from, self.wait)
            .observed_heading()
            .await;
        let observed = self
            .wizard
            .graph()
            .identify(&url, &heading)
            .map(|n| n.id.clone());
        warn!(from = %from.id, %expected, ?observed, %url, "Flow divergence");
        exec.abort(
            Some(&from.id),
            AbortReason::FlowDivergence {
                from: from.id.clone(),
                expected: expected.clone(),
                observed,
                url,
                heading,
                detail,
            },
        );
    }
}

//! Validation Oracle: positive layout contracts and negative input contracts

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use wizcheck_common::{normalize_text, Expect, NegativeCase, NodeId, PageNode, Role, Target};

use crate::accessor::{bounded, ElementAccessor};
use crate::error::E2eResult;
use crate::page::{Assertion, Mismatch, NodeContract, NodeDriver};
use crate::wait::{wait_for, WaitOutcome, WaitPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A positive layout or content assertion failed
    Layout,
    /// Invalid input was not rejected the way the case requires
    NegativeCase,
    /// Fields did not return to empty after a negative case
    Restoration,
    /// Two runs of the same negative cases disagreed
    Idempotence,
    /// An element required for an action never became usable
    Interaction,
}

/// A contract the live page broke, with literal expected and actual values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub node: NodeId,
    pub kind: ViolationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    pub check: String,
    pub expected: String,
    pub actual: String,
}

impl Violation {
    pub fn layout(mismatch: Mismatch) -> Self {
        Self {
            node: mismatch.node,
            kind: ViolationKind::Layout,
            case: None,
            check: mismatch.assertion,
            expected: mismatch.expected,
            actual: mismatch.actual,
        }
    }

    fn in_case(kind: ViolationKind, case: &NegativeCase, mismatch: Mismatch) -> Self {
        Self {
            node: mismatch.node,
            kind,
            case: Some(case.name.clone()),
            check: mismatch.assertion,
            expected: mismatch.expected,
            actual: mismatch.actual,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)?;
        if let Some(case) = &self.case {
            write!(f, " [{}]", case)?;
        }
        write!(
            f,
            ": {} (expected {}, got {})",
            self.check, self.expected, self.actual
        )
    }
}

/// Outcome of one negative case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
}

impl CaseVerdict {
    pub fn passed(&self) -> bool {
        self.violation.is_none()
    }
}

/// Two consecutive runs of a node's negative cases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotenceReport {
    pub first: Vec<CaseVerdict>,
    pub second: Vec<CaseVerdict>,
    pub violations: Vec<Violation>,
}

impl IdempotenceReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Evaluates node contracts against one accessor session
pub struct Oracle<'a> {
    accessor: &'a dyn ElementAccessor,
    wait: WaitPolicy,
}

impl<'a> Oracle<'a> {
    pub fn new(accessor: &'a dyn ElementAccessor, wait: WaitPolicy) -> Self {
        Self { accessor, wait }
    }

    fn driver(&self, node: &'a PageNode) -> NodeDriver<'a> {
        NodeDriver::new(self.accessor, node, self.wait)
    }

    /// Every assertion of the node, without short-circuiting
    pub async fn check_positive(&self, node: &'a PageNode) -> Vec<Violation> {
        let driver = self.driver(node);
        let mut violations = Vec::new();
        for assertion in node.assertions() {
            if let Err(mismatch) = driver.check(&assertion).await {
                warn!(node = %node.id, %mismatch, "Layout violation");
                violations.push(Violation::layout(mismatch));
            }
        }
        violations
    }

    /// One extra element check, reported as a layout violation
    pub async fn check_element(
        &self,
        node: &'a PageNode,
        target: Target,
        expect: Expect,
    ) -> Option<Violation> {
        let assertion = Assertion::element(target, expect);
        self.driver(node)
            .check(&assertion)
            .await
            .err()
            .map(Violation::layout)
    }

    /// Drive one invalid input and confirm the page rejects it in place.
    ///
    /// Fields are cleared first so each case starts from empty input. After
    /// a rejection they are cleared again and checked empty, so later cases
    /// and steps are unaffected.
    pub async fn check_negative(
        &self,
        node: &'a PageNode,
        case: &NegativeCase,
    ) -> E2eResult<Option<Violation>> {
        let driver = self.driver(node);
        debug!(node = %node.id, case = %case.name, "Negative case");

        driver.clear_fields().await?;
        driver.fill(&case.inputs).await?;
        driver.press_primary().await?;

        let violation = match self.rejected(&driver, case).await {
            Some(v) => {
                // Best effort: the page may already have left the node
                if let Err(e) = driver.clear_fields().await {
                    debug!(node = %node.id, case = %case.name, error = %e, "Fields not cleared after failed case");
                }
                Some(v)
            }
            None => {
                driver.clear_fields().await?;
                self.restored(&driver, case).await
            }
        };
        if let Some(v) = &violation {
            warn!(node = %node.id, case = %case.name, violation = %v, "Negative case failed");
        }
        Ok(violation)
    }

    /// Whether the page still shows `node` after a failed case
    async fn still_on(&self, node: &'a PageNode) -> bool {
        let driver = self.driver(node);
        let heading = Assertion::element(
            Target::role(Role::Heading),
            Expect::contains(node.title.clone()),
        );
        let url = Assertion::Url {
            pattern: node.url_pattern.clone(),
        };
        driver.check(&url).await.is_ok() && driver.check(&heading).await.is_ok()
    }

    async fn rejected(&self, driver: &NodeDriver<'_>, case: &NegativeCase) -> Option<Violation> {
        let text = Expect::contains(case.expected_error_text.clone());
        let mut checks = vec![
            Assertion::element(Target::role(Role::ErrorSummary), text.clone()),
            Assertion::element(Target::role(Role::ErrorHint), text),
        ];
        if case.expect_url_unchanged {
            checks.push(Assertion::Url {
                pattern: driver.node().url_pattern.clone(),
            });
        }

        for assertion in &checks {
            if let Err(mismatch) = driver.check(assertion).await {
                return Some(Violation::in_case(ViolationKind::NegativeCase, case, mismatch));
            }
        }
        self.same_message(driver, case).await
    }

    /// The inline hint carries the summary's message, not just the expected fragment
    async fn same_message(&self, driver: &NodeDriver<'_>, case: &NegativeCase) -> Option<Violation> {
        let summary = self.text_of(Role::ErrorSummary).await;
        let hint = self.text_of(Role::ErrorHint).await;
        let (summary, hint) = match (summary, hint) {
            (Ok(summary), Ok(hint)) => (summary, hint),
            (Err(e), _) | (_, Err(e)) => {
                return Some(self.message_mismatch(driver, case, e.to_string()));
            }
        };

        let message = hint
            .strip_prefix("Error:")
            .map(str::trim_start)
            .unwrap_or(&hint);
        if message.is_empty() || !summary.contains(message) {
            return Some(self.message_mismatch(
                driver,
                case,
                format!("summary {:?}, hint {:?}", summary, hint),
            ));
        }
        None
    }

    async fn text_of(&self, role: Role) -> E2eResult<String> {
        let target = Target::role(role);
        let state = bounded(
            format!("read {}", target),
            self.wait.timeout(),
            self.accessor.probe(&target),
        )
        .await?;
        Ok(normalize_text(&state.text))
    }

    fn message_mismatch(
        &self,
        driver: &NodeDriver<'_>,
        case: &NegativeCase,
        actual: String,
    ) -> Violation {
        Violation::in_case(
            ViolationKind::NegativeCase,
            case,
            Mismatch {
                node: driver.node().id.clone(),
                assertion: "error summary and inline hint carry the same message".to_string(),
                expected: case.expected_error_text.clone(),
                actual,
            },
        )
    }

    async fn restored(&self, driver: &NodeDriver<'_>, case: &NegativeCase) -> Option<Violation> {
        let accessor = self.accessor;
        for slot in driver.node().slots() {
            let kind = driver.node().field(&slot.field).map(|f| f.kind);
            if kind == Some(wizcheck_common::FieldKind::Choice) {
                continue;
            }
            let target = Target::slot(slot);
            let probe = &target;
            let outcome = wait_for(
                &self.wait,
                move || accessor.probe(probe),
                |s| s.value.as_deref().unwrap_or("").is_empty(),
            )
            .await;
            if let WaitOutcome::TimedOut { last, last_error } = outcome {
                return Some(Violation::in_case(
                    ViolationKind::Restoration,
                    case,
                    Mismatch {
                        node: driver.node().id.clone(),
                        assertion: format!("{} is empty", target),
                        expected: "empty value".to_string(),
                        actual: last
                            .map(|s| s.describe())
                            .or(last_error)
                            .unwrap_or_else(|| "unread".to_string()),
                    },
                ));
            }
        }
        None
    }

    /// Every negative case of the node, in declaration order.
    ///
    /// Stops early when a failed case took the page away from the node.
    pub async fn run_negative_cases(&self, node: &'a PageNode) -> E2eResult<Vec<CaseVerdict>> {
        let mut verdicts = Vec::with_capacity(node.negative_cases.len());
        for case in &node.negative_cases {
            let violation = self.check_negative(node, case).await?;
            let left = violation.is_some() && !self.still_on(node).await;
            verdicts.push(CaseVerdict {
                case: case.name.clone(),
                violation,
            });
            if left {
                warn!(node = %node.id, case = %case.name, "Page left the node, remaining cases skipped");
                break;
            }
        }
        Ok(verdicts)
    }

    /// Run the node's negative cases twice and compare pass/fail per case.
    ///
    /// No second run happens when the first one could not finish on the node.
    pub async fn verify_idempotence(&self, node: &'a PageNode) -> E2eResult<IdempotenceReport> {
        let first = self.run_negative_cases(node).await?;
        if first.len() < node.negative_cases.len() {
            return Ok(IdempotenceReport {
                first,
                second: Vec::new(),
                violations: Vec::new(),
            });
        }
        let second = self.run_negative_cases(node).await?;

        let violations = first
            .iter()
            .zip(&second)
            .filter(|(a, b)| a.passed() != b.passed())
            .map(|(a, b)| Violation {
                node: node.id.clone(),
                kind: ViolationKind::Idempotence,
                case: Some(a.case.clone()),
                check: "same verdict on repeat".to_string(),
                expected: verdict_label(a).to_string(),
                actual: verdict_label(b).to_string(),
            })
            .collect();

        Ok(IdempotenceReport {
            first,
            second,
            violations,
        })
    }
}

fn verdict_label(verdict: &CaseVerdict) -> &'static str {
    if verdict.passed() {
        "pass"
    } else {
        "fail"
    }
}

//! Page Node contracts and the driver that holds a live page to them

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use wizcheck_common::{
    Answers, BodyExpectation, Expect, FieldKind, NodeId, PageNode, Role, Target, UrlPattern,
};

use crate::accessor::{bounded, ElementAccessor};
use crate::error::{E2eError, E2eResult};
use crate::wait::{wait_for, WaitOutcome, WaitPolicy};

/// One evaluable clause of a node's contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "snake_case")]
pub enum Assertion {
    Url { pattern: UrlPattern },
    Element { target: Target, expect: Expect },
}

impl Assertion {
    pub fn element(target: Target, expect: Expect) -> Self {
        Assertion::Element { target, expect }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Url { pattern } => write!(f, "url matches {}", pattern),
            Assertion::Element { target, expect } => write!(f, "{} is {}", target, expect),
        }
    }
}

/// The full ordered contract of a node
pub trait NodeContract {
    /// URL pattern, heading, body, per-field visibility, then the declared positive checks
    fn assertions(&self) -> Vec<Assertion>;

    /// URL pattern and heading only
    fn arrival_assertions(&self) -> Vec<Assertion>;
}

impl NodeContract for PageNode {
    fn assertions(&self) -> Vec<Assertion> {
        let mut out = self.arrival_assertions();

        match &self.body {
            BodyExpectation::Contains { text } => out.push(Assertion::element(
                Target::role(Role::Body),
                Expect::contains(text.clone()),
            )),
            BodyExpectation::Absent => {
                out.push(Assertion::element(Target::role(Role::Body), Expect::Absent))
            }
            BodyExpectation::Unspecified => {}
        }

        for field in &self.fields {
            match field.kind {
                FieldKind::Choice => {
                    for option in &field.options {
                        out.push(Assertion::element(
                            Target::choice(&field.name, option),
                            Expect::Visible,
                        ));
                    }
                }
                _ => {
                    for slot in field.slots() {
                        out.push(Assertion::element(Target::slot(slot), Expect::Visible));
                    }
                }
            }
        }

        out.extend(
            self.positive_checks
                .iter()
                .map(|check| Assertion::element(check.target.clone(), check.expect.clone())),
        );
        out
    }

    fn arrival_assertions(&self) -> Vec<Assertion> {
        vec![
            Assertion::Url {
                pattern: self.url_pattern.clone(),
            },
            Assertion::element(Target::role(Role::Heading), Expect::contains(self.title.clone())),
        ]
    }
}

/// An assertion that did not hold within the wait policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub node: NodeId,
    pub assertion: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (expected {}, got {})",
            self.node, self.assertion, self.expected, self.actual
        )
    }
}

/// Drives one node of a live page through an accessor
pub struct NodeDriver<'a> {
    accessor: &'a dyn ElementAccessor,
    node: &'a PageNode,
    wait: WaitPolicy,
}

impl<'a> NodeDriver<'a> {
    pub fn new(accessor: &'a dyn ElementAccessor, node: &'a PageNode, wait: WaitPolicy) -> Self {
        Self { accessor, node, wait }
    }

    pub fn node(&self) -> &PageNode {
        self.node
    }

    /// Wait for one assertion to hold
    pub async fn check(&self, assertion: &Assertion) -> Result<(), Mismatch> {
        let accessor = self.accessor;
        match assertion {
            Assertion::Url { pattern } => {
                let outcome =
                    wait_for(&self.wait, move || accessor.current_url(), |url| pattern.matches(url))
                        .await;
                match outcome {
                    WaitOutcome::Satisfied(_) => Ok(()),
                    WaitOutcome::TimedOut { last, last_error } => Err(self.mismatch(
                        assertion,
                        format!("url containing {}", pattern),
                        last.or(last_error.map(|e| format!("error: {}", e)))
                            .unwrap_or_else(|| "no url".to_string()),
                    )),
                }
            }
            Assertion::Element { target, expect } => {
                let outcome =
                    wait_for(&self.wait, move || accessor.probe(target), |s| expect.holds(s)).await;
                match outcome {
                    WaitOutcome::Satisfied(_) => Ok(()),
                    WaitOutcome::TimedOut { last, last_error } => Err(self.mismatch(
                        assertion,
                        expect.to_string(),
                        match (last, last_error) {
                            (_, Some(e)) => format!("error: {}", e),
                            (Some(state), None) => state.describe(),
                            (None, None) => "unread".to_string(),
                        },
                    )),
                }
            }
        }
    }

    fn mismatch(&self, assertion: &Assertion, expected: String, actual: String) -> Mismatch {
        Mismatch {
            node: self.node.id.clone(),
            assertion: assertion.to_string(),
            expected,
            actual,
        }
    }

    /// Evaluate the node's contract, stopping at the first mismatch. Read-only.
    pub async fn render_contract(&self) -> Result<(), Mismatch> {
        for assertion in self.node.assertions() {
            self.check(&assertion).await?;
        }
        Ok(())
    }

    /// URL pattern and heading both hold
    pub async fn arrived(&self) -> Result<(), Mismatch> {
        for assertion in self.node.arrival_assertions() {
            self.check(&assertion).await?;
        }
        Ok(())
    }

    /// Fill `answers` and press the primary action. May navigate.
    pub async fn submit(&self, answers: &Answers) -> E2eResult<()> {
        self.fill(answers).await?;
        self.press_primary().await
    }

    /// Fill the node's slots named in `answers`; unnamed slots are left as they are
    pub async fn fill(&self, answers: &Answers) -> E2eResult<()> {
        for (slot, value) in answers.iter() {
            let field = self.node.field(&slot.field).ok_or_else(|| {
                E2eError::ElementNotFound(format!("{} is not a field of {}", slot, self.node.id))
            })?;

            match field.kind {
                FieldKind::Choice => {
                    let option = field.option(value).ok_or_else(|| {
                        E2eError::ElementNotFound(format!(
                            "option {} of {} on {}",
                            value, field.name, self.node.id
                        ))
                    })?;
                    let target = Target::choice(&field.name, option);
                    self.ready(&target).await?;
                    debug!(node = %self.node.id, %target, "Select option");
                    self.act(&target, "click", self.accessor.click(&target)).await?;
                }
                _ => {
                    let target = Target::slot(slot.clone());
                    self.ready(&target).await?;
                    debug!(node = %self.node.id, %target, value, "Type");
                    self.act(&target, "clear", self.accessor.clear(&target)).await?;
                    self.act(&target, "type", self.accessor.type_text(&target, value))
                        .await?;
                }
            }
        }
        Ok(())
    }

    pub async fn press_primary(&self) -> E2eResult<()> {
        let target = Target::role(Role::PrimaryAction);
        self.ready(&target).await?;
        debug!(node = %self.node.id, "Press primary action");
        self.act(&target, "click", self.accessor.click(&target)).await
    }

    /// Empty every text-like slot of the node
    pub async fn clear_fields(&self) -> E2eResult<()> {
        for field in self.node.fields.iter().filter(|f| f.kind != FieldKind::Choice) {
            for slot in field.slots() {
                let target = Target::slot(slot);
                self.ready(&target).await?;
                self.act(&target, "clear", self.accessor.clear(&target)).await?;
            }
        }
        Ok(())
    }

    /// Current heading text, for diagnostics
    pub async fn observed_heading(&self) -> String {
        let target = Target::role(Role::Heading);
        bounded("read heading", self.wait.timeout(), self.accessor.probe(&target))
            .await
            .map(|state| state.text)
            .unwrap_or_default()
    }

    async fn ready(&self, target: &Target) -> E2eResult<()> {
        let accessor = self.accessor;
        let outcome =
            wait_for(&self.wait, move || accessor.probe(target), |s| s.present && s.visible).await;
        match outcome {
            WaitOutcome::Satisfied(_) => Ok(()),
            WaitOutcome::TimedOut { .. } => Err(E2eError::Timeout {
                what: format!("{} on {} to become visible", target, self.node.id),
                timeout_ms: self.wait.timeout_ms,
            }),
        }
    }

    async fn act<F>(&self, target: &Target, verb: &str, fut: F) -> E2eResult<()>
    where
        F: std::future::Future<Output = E2eResult<()>>,
    {
        bounded(format!("{} {}", verb, target), self.wait.timeout(), fut).await
    }
}

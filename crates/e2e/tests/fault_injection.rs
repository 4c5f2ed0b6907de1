//! Contract breaches injected into the simulated site must surface as the
//! matching violations or divergences

use async_trait::async_trait;
use std::sync::Arc;

use wizcheck_common::catalog::{
    self, DAYS_PER_WEEK, ENTITLEMENT_BASIS, IRREGULAR_HOURS, LEAVE_YEAR_START, START,
};
use wizcheck_common::{AnswerPredicate, Answers, NodeId, Role, Scenario, Wizard};
use wizcheck_e2e::{
    AbortReason, E2eError, E2eResult, ElementAccessor, Fault, Outcome, PageKey, ScenarioReport,
    ScenarioRunner, SessionFactory, SimulatedFactory, SimulatedSite, ViolationKind, WaitPolicy,
};

const BASE: &str = "https://www.gov.uk";

fn wizard() -> Arc<Wizard> {
    Arc::new(catalog::holiday_entitlement().compile().unwrap())
}

fn runner_for(wizard: Arc<Wizard>) -> ScenarioRunner {
    let entry = format!("{}{}", BASE, wizard.entry_path());
    ScenarioRunner::new(
        wizard,
        entry,
        WaitPolicy {
            timeout_ms: 50,
            poll_interval_ms: 1,
        },
    )
}

async fn run_with(name: &str, faults: Vec<Fault>) -> ScenarioReport {
    let runner = runner_for(wizard());
    let scenario = runner.wizard().scenario(name).unwrap().clone();
    let site = SimulatedSite::with_faults(BASE, faults);
    runner.run(&scenario, &site).await
}

fn kinds(report: &ScenarioReport) -> Vec<ViolationKind> {
    report.violations.iter().map(|v| v.kind).collect()
}

#[tokio::test]
async fn wrong_heading_after_submit_is_a_divergence() {
    let report = run_with(
        "irregular-hours-pay-period",
        vec![Fault::WrongHeading {
            page: PageKey::LeaveYearStart,
            heading: "When does the tax year start?".to_string(),
        }],
    )
    .await;

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(report.failed_at, Some(NodeId::new(IRREGULAR_HOURS)));
    match report.reason {
        Some(AbortReason::FlowDivergence {
            expected, heading, ..
        }) => {
            assert_eq!(expected, NodeId::new(LEAVE_YEAR_START));
            assert_eq!(heading, "When does the tax year start?");
        }
        other => panic!("expected a flow divergence, got {:?}", other),
    }
    assert_eq!(
        report.history,
        vec![NodeId::new(START), NodeId::new(IRREGULAR_HOURS)]
    );
}

#[tokio::test]
async fn wrong_redirect_names_the_page_actually_shown() {
    let report = run_with(
        "irregular-hours-pay-period",
        vec![Fault::WrongRedirect {
            from: PageKey::IrregularHours,
            to: PageKey::EntitlementBasis,
        }],
    )
    .await;

    assert_eq!(report.outcome, Outcome::Failed);
    match report.reason {
        Some(AbortReason::FlowDivergence {
            expected,
            observed,
            url,
            ..
        }) => {
            assert_eq!(expected, NodeId::new(LEAVE_YEAR_START));
            assert_eq!(observed, Some(NodeId::new(ENTITLEMENT_BASIS)));
            assert!(url.ends_with("/calculate-your-holiday-entitlement/y/regular"), "{}", url);
        }
        other => panic!("expected a flow divergence, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_error_hint_fails_every_case() {
    let report = run_with(
        "days-per-week-validation",
        vec![Fault::MissingErrorHint {
            page: PageKey::DaysPerWeek,
        }],
    )
    .await;

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(report.failed_at, Some(NodeId::new(DAYS_PER_WEEK)));
    assert_eq!(kinds(&report), vec![ViolationKind::NegativeCase; 3]);
    assert!(report.violations[0].check.contains("error_hint"));
    // Failing the same way twice is still consistent
    let negatives = &report.negatives[0];
    assert_eq!(negatives.repeat.as_ref().map(Vec::len), Some(3));
}

#[tokio::test]
async fn sticky_fields_break_restoration_and_idempotence() {
    let report = run_with("leave-year-start-validation", vec![Fault::StickyFields]).await;

    assert_eq!(report.outcome, Outcome::Failed);
    let kinds = kinds(&report);
    assert!(kinds.contains(&ViolationKind::Restoration), "{:?}", kinds);
    assert!(kinds.contains(&ViolationKind::Idempotence), "{:?}", kinds);

    let first_case = &report.negatives[0].verdicts[0];
    assert_eq!(first_case.case, "no data entered");
    assert!(first_case.passed());
}

#[tokio::test]
async fn accepted_invalid_input_stops_remaining_cases() {
    let report = run_with(
        "days-per-week-validation",
        vec![Fault::AcceptsInvalidInput {
            page: PageKey::DaysPerWeek,
        }],
    )
    .await;

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(kinds(&report), vec![ViolationKind::NegativeCase]);
    let negatives = &report.negatives[0];
    assert_eq!(negatives.verdicts.len(), 1);
    assert_eq!(negatives.verdicts[0].case, "no value entered");
    assert_eq!(negatives.repeat.as_ref().map(Vec::len), Some(0));
}

#[tokio::test]
async fn hidden_feedback_prompt_is_a_layout_violation() {
    let report = run_with(
        "regular-days-full-year",
        vec![Fault::HiddenElement {
            page: PageKey::Start,
            role: Role::FeedbackPrompt,
        }],
    )
    .await;

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(
        report.reason,
        Some(AbortReason::Violations {
            node: NodeId::new(START),
            count: 1,
        })
    );
    assert_eq!(report.violations[0].kind, ViolationKind::Layout);
    assert!(report.violations[0].check.contains("feedback_prompt"));
}

#[tokio::test]
async fn hidden_primary_action_fails_before_submit() {
    let report = run_with(
        "regular-days-full-year",
        vec![Fault::HiddenElement {
            page: PageKey::HolidayPeriod,
            role: Role::PrimaryAction,
        }],
    )
    .await;

    assert_eq!(report.outcome, Outcome::Failed);
    // The layout check on the button fails before any submit is attempted
    assert_eq!(report.failed_at, Some(NodeId::new("holiday_period")));
    assert!(kinds(&report).contains(&ViolationKind::Layout));
}

#[tokio::test]
async fn model_disagreeing_with_scenario_is_a_divergence() {
    let runner = runner_for(wizard());
    let scenario = Scenario::new("mislabelled")
        .step(START, Answers::new(), IRREGULAR_HOURS)
        .step(
            IRREGULAR_HOURS,
            Answers::new().choice(IRREGULAR_HOURS, "yes"),
            ENTITLEMENT_BASIS,
        );
    let site = SimulatedSite::new(BASE);

    let report = runner.run(&scenario, &site).await;

    assert_eq!(report.outcome, Outcome::Failed);
    match report.reason {
        Some(AbortReason::FlowDivergence { detail, observed, .. }) => {
            assert!(detail.contains("leave_year_start"), "{}", detail);
            assert_eq!(observed, Some(NodeId::new(LEAVE_YEAR_START)));
        }
        other => panic!("expected a flow divergence, got {:?}", other),
    }
}

#[tokio::test]
async fn unmatched_answer_is_a_harness_defect() {
    let mut model = catalog::holiday_entitlement();
    for edge in model.edges.iter_mut() {
        if edge.from.as_str() == IRREGULAR_HOURS
            && edge.when == AnswerPredicate::equals(IRREGULAR_HOURS, "yes")
        {
            edge.when = AnswerPredicate::equals(IRREGULAR_HOURS, "oui");
        }
    }
    let runner = runner_for(Arc::new(model.compile().unwrap()));
    let scenario = runner.wizard().scenario("irregular-hours-pay-period").unwrap().clone();
    let site = SimulatedSite::new(BASE);

    let report = runner.run(&scenario, &site).await;

    assert_eq!(report.outcome, Outcome::HarnessDefect);
    assert!(matches!(report.reason, Some(AbortReason::GraphIncomplete { .. })));
}

#[tokio::test]
async fn unmodelled_branch_is_a_known_gap() {
    let runner = runner_for(wizard());
    let scenario = Scenario::new("hours-per-week")
        .step(START, Answers::new(), IRREGULAR_HOURS)
        .step(
            IRREGULAR_HOURS,
            Answers::new().choice(IRREGULAR_HOURS, "no"),
            ENTITLEMENT_BASIS,
        )
        .step(
            ENTITLEMENT_BASIS,
            Answers::new().choice(ENTITLEMENT_BASIS, "hours-worked-per-week"),
            "holiday_period",
        );
    let site = SimulatedSite::new(BASE);

    let report = runner.run(&scenario, &site).await;

    assert_eq!(report.outcome, Outcome::KnownGap);
    assert_eq!(report.failed_at, Some(NodeId::new(ENTITLEMENT_BASIS)));
    assert!(matches!(
        report.reason,
        Some(AbortReason::NotImplemented { ref note }) if note.contains("hours worked per week")
    ));
}

struct Unlaunchable;

#[async_trait]
impl SessionFactory for Unlaunchable {
    async fn open(&self) -> E2eResult<Box<dyn ElementAccessor>> {
        Err(E2eError::BrowserUnavailable)
    }

    fn describe(&self) -> String {
        "unlaunchable".to_string()
    }
}

#[tokio::test]
async fn session_failures_fail_the_suite_as_harness_defects() {
    let runner = runner_for(wizard());
    let scenarios = runner.wizard().scenarios().to_vec();

    let suite = runner.run_suite(&Unlaunchable, &scenarios, 2).await;

    assert_eq!(suite.harness_defects, 5);
    // Not-implemented scenarios never open a session
    assert_eq!(suite.known_gaps, 2);
    assert!(!suite.is_success());
}

#[tokio::test]
async fn faulty_sessions_fail_only_affected_scenarios() {
    let runner = runner_for(wizard());
    let factory = SimulatedFactory::new(BASE).with_fault(Fault::MissingErrorHint {
        page: PageKey::LeaveYearStart,
    });
    let scenarios = runner.wizard().scenarios().to_vec();

    let suite = runner.run_suite(&factory, &scenarios, 4).await;

    assert_eq!(suite.failed, 1);
    assert_eq!(
        suite.result("leave-year-start-validation").map(|r| r.outcome),
        Some(Outcome::Failed)
    );
    assert_eq!(
        suite.result("irregular-hours-pay-period").map(|r| r.outcome),
        Some(Outcome::Passed)
    );
}

#[tokio::test]
async fn stalled_layout_reads_fail_within_the_step_timeout() {
    let report = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run_with(
            "irregular-hours-pay-period",
            vec![Fault::StalledPage {
                page: PageKey::Start,
            }],
        ),
    )
    .await
    .expect("a stalled page must not hang the scenario");

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(report.failed_at, Some(NodeId::new(START)));
    assert!(kinds(&report).iter().all(|k| *k == ViolationKind::Layout));
    assert!(report
        .violations
        .iter()
        .any(|v| v.actual.contains("timed out")));
}

#[tokio::test]
async fn stalled_error_reads_fail_the_negative_case() {
    let report = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run_with(
            "leave-year-start-validation",
            vec![Fault::StalledErrors {
                page: PageKey::LeaveYearStart,
            }],
        ),
    )
    .await
    .expect("stalled error reads must not hang the scenario");

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(report.failed_at, Some(NodeId::new(LEAVE_YEAR_START)));
    assert!(kinds(&report).contains(&ViolationKind::NegativeCase));
    assert!(report
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::NegativeCase)
        .all(|v| v.actual.contains("timed out")));
}

#[tokio::test]
async fn step_off_the_current_node_is_a_harness_defect() {
    let runner = runner_for(wizard());
    let scenario = Scenario::new("skips-a-page")
        .step(START, Answers::new(), IRREGULAR_HOURS)
        .step(
            LEAVE_YEAR_START,
            Answers::new().date(LEAVE_YEAR_START, "11", "11", "2025"),
            "hours_in_pay_period",
        );
    let site = SimulatedSite::new(BASE);

    let report = runner.run(&scenario, &site).await;

    assert_eq!(report.outcome, Outcome::HarnessDefect);
    assert_eq!(report.failed_at, Some(NodeId::new(IRREGULAR_HOURS)));
    assert!(matches!(
        report.reason,
        Some(AbortReason::GraphIncomplete { ref detail }) if detail.contains("flow is at irregular_hours")
    ));
}

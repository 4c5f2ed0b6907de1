//! Built-in holiday entitlement scenarios against the simulated site

use std::sync::Arc;

use wizcheck_common::catalog::{self, DAYS_PER_WEEK, LEAVE_YEAR_START, START};
use wizcheck_common::{NodeId, Target, Wizard};
use wizcheck_e2e::config::TimeoutConfig;
use wizcheck_e2e::{
    AbortReason, ElementAccessor, Fault, HarnessConfig, NodeDriver, Oracle, Outcome, PageKey,
    RunState, ScenarioRunner, SimulatedFactory, SimulatedSite,
};

fn config() -> HarnessConfig {
    HarnessConfig {
        timeouts: TimeoutConfig {
            step_timeout_ms: 100,
            poll_interval_ms: 1,
        },
        ..Default::default()
    }
}

fn wizard() -> Arc<Wizard> {
    Arc::new(catalog::holiday_entitlement().compile().unwrap())
}

fn runner() -> ScenarioRunner {
    ScenarioRunner::from_config(wizard(), &config())
}

fn ids(names: &[&str]) -> Vec<NodeId> {
    names.iter().map(|n| NodeId::new(*n)).collect()
}

async fn run(name: &str) -> wizcheck_e2e::ScenarioReport {
    let runner = runner();
    let scenario = runner.wizard().scenario(name).unwrap().clone();
    let site = SimulatedSite::new(config().base_url);
    runner.run(&scenario, &site).await
}

#[tokio::test]
async fn irregular_hours_path_reaches_pay_period_result() {
    let report = run("irregular-hours-pay-period").await;

    assert_eq!(report.outcome, Outcome::Passed, "{}", report.summary());
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(
        report.history,
        ids(&[
            "start",
            "irregular_hours",
            "leave_year_start",
            "hours_in_pay_period",
            "result"
        ])
    );
    assert_eq!(report.answers.field("hours_in_pay_period"), Some("160"));
}

#[tokio::test]
async fn regular_days_path_renders_result_without_errors() {
    let report = run("regular-days-full-year").await;

    assert_eq!(report.outcome, Outcome::Passed, "{}", report.summary());
    assert_eq!(
        report.history,
        ids(&[
            "start",
            "irregular_hours",
            "entitlement_basis",
            "holiday_period",
            "days_per_week",
            "result"
        ])
    );
    assert!(report.violations.is_empty());
}

#[tokio::test]
async fn leave_year_start_rejects_incomplete_dates_twice_alike() {
    let report = run("leave-year-start-validation").await;

    assert_eq!(report.outcome, Outcome::Passed, "{}", report.summary());
    let negatives = &report.negatives[0];
    assert_eq!(negatives.node, NodeId::new(LEAVE_YEAR_START));
    assert_eq!(negatives.verdicts.len(), 4);
    assert!(negatives.verdicts.iter().all(|v| v.passed()));
    assert_eq!(negatives.repeat.as_ref(), Some(&negatives.verdicts));
}

#[tokio::test]
async fn days_per_week_rejects_text_and_symbols() {
    let report = run("days-per-week-validation").await;

    assert_eq!(report.outcome, Outcome::Passed, "{}", report.summary());
    let negatives = &report.negatives[0];
    assert_eq!(negatives.node, NodeId::new(DAYS_PER_WEEK));
    let cases: Vec<&str> = negatives.verdicts.iter().map(|v| v.case.as_str()).collect();
    assert_eq!(
        cases,
        vec!["no value entered", "text entered", "special characters entered"]
    );
}

#[tokio::test]
async fn full_validation_exercises_every_node_on_the_path() {
    let report = run("full-validation").await;

    assert_eq!(report.outcome, Outcome::Passed, "{}", report.summary());
    let nodes: Vec<&str> = report.negatives.iter().map(|n| n.node.as_str()).collect();
    assert_eq!(
        nodes,
        vec!["irregular_hours", "entitlement_basis", "holiday_period", "days_per_week"]
    );
}

#[tokio::test]
async fn unbuilt_scenario_is_a_known_gap() {
    let report = run("regular-days-starting-part-way").await;

    assert_eq!(report.outcome, Outcome::KnownGap);
    assert_eq!(report.state, RunState::Aborted);
    assert!(matches!(
        report.reason,
        Some(AbortReason::NotImplemented { ref note }) if note.contains("starting part way")
    ));
    assert!(report.history.is_empty());
}

#[tokio::test]
async fn suite_runs_concurrently_and_keeps_declaration_order() {
    let runner = runner();
    let factory = SimulatedFactory::new(config().base_url);
    let scenarios = runner.wizard().scenarios().to_vec();

    let suite = runner.run_suite(&factory, &scenarios, 3).await;

    assert_eq!(suite.total, scenarios.len());
    assert_eq!(suite.passed, 5);
    assert_eq!(suite.known_gaps, 2);
    assert!(suite.is_success());
    let names: Vec<&str> = suite.results.iter().map(|r| r.scenario.as_str()).collect();
    let declared: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, declared);
}

#[tokio::test]
async fn reach_stops_at_node_for_standalone_negative_cases() {
    let runner = runner();
    let scenario = runner.wizard().scenario("regular-days-full-year").unwrap().clone();
    let site = SimulatedSite::new(config().base_url);
    let target = NodeId::new(DAYS_PER_WEEK);

    let flow = runner.reach(&scenario, &target, &site).await.unwrap();
    assert_eq!(flow.current, target);

    let node = runner.wizard().graph().node(&target).unwrap();
    let oracle = Oracle::new(&site, config().wait_policy());
    let verdicts = oracle.run_negative_cases(node).await.unwrap();
    assert_eq!(verdicts.len(), 3);
    assert!(verdicts.iter().all(|v| v.passed()));
    assert!(site.current_url().await.unwrap().ends_with("/days-worked-per-week/full-year"));
}

#[tokio::test]
async fn reach_reports_node_off_the_path() {
    let runner = runner();
    let scenario = runner.wizard().scenario("regular-days-full-year").unwrap().clone();
    let site = SimulatedSite::new(config().base_url);

    let report = runner
        .reach(&scenario, &NodeId::new(LEAVE_YEAR_START), &site)
        .await
        .unwrap_err();
    assert!(matches!(report.reason, Some(AbortReason::GraphIncomplete { .. })));
}

#[tokio::test]
async fn landing_page_renders_its_contract() {
    let wizard = wizard();
    let start = wizard.graph().node(&NodeId::new(START)).unwrap();
    let config = config();
    let entry = config.entry_url(wizard.entry_path());

    let site = SimulatedSite::new(config.base_url.clone());
    site.navigate(&entry).await.unwrap();
    site.bootstrap().await.unwrap();
    NodeDriver::new(&site, start, config.wait_policy())
        .render_contract()
        .await
        .unwrap();

    let broken = SimulatedSite::with_faults(
        config.base_url.clone(),
        vec![Fault::WrongHeading {
            page: PageKey::Start,
            heading: "Calculate holiday pay".to_string(),
        }],
    );
    broken.navigate(&entry).await.unwrap();
    broken.bootstrap().await.unwrap();
    let mismatch = NodeDriver::new(&broken, start, config.wait_policy())
        .render_contract()
        .await
        .unwrap_err();
    assert_eq!(mismatch.node, NodeId::new(START));
    assert!(mismatch.assertion.starts_with("heading"));
    assert!(mismatch.actual.contains("Calculate holiday pay"));
}

#[tokio::test]
async fn hint_with_a_different_message_fails_every_case() {
    let runner = runner();
    let scenario = runner.wizard().scenario("regular-days-full-year").unwrap().clone();
    let site = SimulatedSite::with_faults(
        config().base_url,
        vec![Fault::DivergentHint {
            page: PageKey::DaysPerWeek,
            hint: format!("Error: {} Ask your employer.", catalog::SEVEN_DAYS),
        }],
    );
    let target = NodeId::new(DAYS_PER_WEEK);
    runner.reach(&scenario, &target, &site).await.unwrap();

    let node = runner.wizard().graph().node(&target).unwrap();
    let oracle = Oracle::new(&site, config().wait_policy());
    let verdicts = oracle.run_negative_cases(node).await.unwrap();

    assert_eq!(verdicts.len(), 3);
    for verdict in &verdicts {
        let violation = verdict.violation.as_ref().unwrap();
        assert_eq!(
            violation.check,
            "error summary and inline hint carry the same message"
        );
        assert!(violation.actual.contains("Ask your employer."));
    }
}

#[tokio::test]
async fn failed_cases_still_leave_fields_empty() {
    let runner = runner();
    let scenario = runner.wizard().scenario("regular-days-full-year").unwrap().clone();
    let site = SimulatedSite::with_faults(
        config().base_url,
        vec![Fault::MissingErrorHint {
            page: PageKey::DaysPerWeek,
        }],
    );
    let target = NodeId::new(DAYS_PER_WEEK);
    runner.reach(&scenario, &target, &site).await.unwrap();

    let node = runner.wizard().graph().node(&target).unwrap();
    let oracle = Oracle::new(&site, config().wait_policy());
    let verdicts = oracle.run_negative_cases(node).await.unwrap();
    assert!(verdicts.iter().all(|v| !v.passed()));

    for slot in node.slots() {
        let state = site.probe(&Target::slot(slot)).await.unwrap();
        assert_eq!(state.value.as_deref().unwrap_or(""), "");
    }
}

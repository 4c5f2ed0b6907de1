//! Run Commands

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use wizcheck_common::{Scenario, Wizard};
use wizcheck_e2e::{HarnessConfig, ScenarioReport, ScenarioRunner, SuiteReport};

use super::{load_config, load_wizard, session_factory, EXIT_FAILED, EXIT_HARNESS, EXIT_OK};
use crate::output::{outcome_label, print_info, print_list, print_value, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Run only this scenario
    #[arg(short, long, conflicts_with = "tag")]
    pub scenario: Option<String>,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Drive the in-memory simulated site instead of Chrome
    #[arg(long)]
    pub simulated: bool,

    /// Wizard model YAML (defaults to the built-in holiday entitlement model)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Scenarios run at the same time
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Origin the entry path is joined to
    #[arg(long)]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for test-results.json
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}

/// Scenario result row
#[derive(Serialize)]
pub struct ResultRow {
    pub scenario: String,
    pub outcome: String,
    pub path: String,
    pub duration_ms: u64,
    pub detail: String,
}

impl From<&ScenarioReport> for ResultRow {
    fn from(report: &ScenarioReport) -> Self {
        Self {
            scenario: report.scenario.clone(),
            outcome: outcome_label(report.outcome),
            path: report
                .history
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(" → "),
            duration_ms: report.duration_ms,
            detail: if report.passed() {
                String::new()
            } else {
                report.summary()
            },
        }
    }
}

impl TableDisplay for ResultRow {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Outcome", "Path", "Duration", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.scenario.clone(),
            self.outcome.clone(),
            self.path.clone(),
            format!("{}ms", self.duration_ms),
            self.detail.clone(),
        ]
    }
}

/// Scenarios picked by name or tag, all of them otherwise
pub fn select(wizard: &Wizard, name: Option<&str>, tag: Option<&str>) -> Result<Vec<Scenario>> {
    if let Some(name) = name {
        return Ok(vec![wizard.scenario(name)?.clone()]);
    }
    let selected: Vec<Scenario> = match tag {
        Some(tag) => wizard.scenarios_tagged(tag).cloned().collect(),
        None => wizard.scenarios().to_vec(),
    };
    if selected.is_empty() {
        bail!("No scenarios tagged '{}'", tag.unwrap_or_default());
    }
    Ok(selected)
}

/// Harness defects outrank failures
pub fn exit_code(suite: &SuiteReport) -> u8 {
    if suite.harness_defects > 0 {
        EXIT_HARNESS
    } else if suite.failed > 0 {
        EXIT_FAILED
    } else {
        EXIT_OK
    }
}

pub async fn execute(args: RunArgs, config_path: &Path, format: OutputFormat) -> Result<u8> {
    let mut config = load_config(config_path)?;
    args.apply(&mut config);
    config.validate()?;

    let wizard = load_wizard(args.model.as_deref())?;
    let scenarios = select(&wizard, args.scenario.as_deref(), args.tag.as_deref())?;
    let factory = session_factory(&config, args.simulated)?;
    let runner = ScenarioRunner::from_config(wizard, &config);

    if !format.is_structured() {
        print_info(&format!(
            "Running {} scenario(s) on {}",
            scenarios.len(),
            factory.describe()
        ));
    }

    let suite = runner
        .run_suite(factory.as_ref(), &scenarios, config.concurrency)
        .await;
    let written = suite.write_results(&config.output_dir)?;

    if format.is_structured() {
        print_value(&suite, format)?;
    } else {
        let rows: Vec<ResultRow> = suite.results.iter().map(ResultRow::from).collect();
        print_list(&rows, format);
        print_summary(&suite);
        print_info(&format!("Results written to {}", written.display()));
    }

    Ok(exit_code(&suite))
}

fn print_summary(suite: &SuiteReport) {
    let line = format!(
        "{} passed, {} failed, {} known gap(s), {} harness defect(s) in {}ms",
        suite.passed, suite.failed, suite.known_gaps, suite.harness_defects, suite.duration_ms
    );
    if suite.is_success() {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite(failed: usize, harness_defects: usize) -> SuiteReport {
        SuiteReport {
            total: failed + harness_defects,
            passed: 0,
            failed,
            known_gaps: 0,
            harness_defects,
            duration_ms: 0,
            results: vec![],
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&suite(0, 0)), EXIT_OK);
        assert_eq!(exit_code(&suite(2, 0)), EXIT_FAILED);
        assert_eq!(exit_code(&suite(2, 1)), EXIT_HARNESS);
    }

    #[test]
    fn test_select_by_tag() {
        let wizard = load_wizard(None).unwrap();
        let smoke = select(&wizard, None, Some("smoke")).unwrap();
        let names: Vec<&str> = smoke.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["irregular-hours-pay-period", "regular-days-full-year"]);
    }

    #[test]
    fn test_select_unknown_name_or_tag_fails() {
        let wizard = load_wizard(None).unwrap();
        assert!(select(&wizard, Some("nope"), None).is_err());
        assert!(select(&wizard, None, Some("nope")).is_err());
        assert_eq!(select(&wizard, None, None).unwrap().len(), 7);
    }

    #[test]
    fn test_flags_override_config() {
        let args = RunArgs {
            scenario: None,
            tag: None,
            simulated: true,
            model: None,
            concurrency: Some(4),
            base_url: Some("http://localhost:3000".to_string()),
            headed: true,
            output_dir: None,
        };
        let mut config = HarnessConfig::default();
        args.apply(&mut config);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(!config.browser.headless);
        assert_eq!(config.output_dir, PathBuf::from("test-results"));
    }

    #[tokio::test]
    async fn test_simulated_suite_exits_ok() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            scenario: None,
            tag: Some("smoke".to_string()),
            simulated: true,
            model: None,
            concurrency: Some(2),
            base_url: None,
            headed: false,
            output_dir: Some(dir.path().join("out")),
        };

        let code = execute(args, &dir.path().join("wizcheck.toml"), OutputFormat::Json)
            .await
            .unwrap();

        assert_eq!(code, EXIT_OK);
        assert!(dir.path().join("out/test-results.json").exists());
    }
}

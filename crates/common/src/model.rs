//! Declarative wizard models, loadable from YAML

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::graph::NavigationGraph;
use crate::scenario::Scenario;
use crate::types::{Edge, NodeId, PageNode};

/// A wizard definition as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardModel {
    /// Unique name for this wizard
    pub name: String,

    /// Path of the landing route, joined to the configured base URL
    pub entry_path: String,

    /// Id of the first node every scenario starts on
    pub entry: NodeId,

    pub nodes: Vec<PageNode>,

    #[serde(default)]
    pub edges: Vec<Edge>,

    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl WizardModel {
    /// Parse a model from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(ModelError::from)
    }

    /// Parse a model from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all models from a directory
    pub fn load_all(dir: &Path) -> Result<Vec<Self>> {
        let mut models = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            debug!(path = %entry.path().display(), "Loading wizard model");
            models.push(Self::from_file(entry.path())?);
        }

        Ok(models)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ModelError::from)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ModelError::from)
    }

    /// Validate the definition and build the immutable runtime form
    pub fn compile(self) -> Result<Wizard> {
        let graph = NavigationGraph::new(self.entry.clone(), self.nodes.clone(), self.edges.clone())?;

        let mut names = std::collections::HashSet::new();
        for scenario in &self.scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(ModelError::InvalidScenario {
                    scenario: scenario.name.clone(),
                    reason: "duplicate scenario name".to_string(),
                });
            }
            scenario.validate(&graph)?;
        }

        Ok(Wizard {
            graph,
            scenarios: self.scenarios.clone(),
            definition: self,
        })
    }
}

/// A validated wizard: navigation graph plus its declared scenarios.
///
/// Immutable once built; share it between concurrent scenario runs behind
/// an `Arc`.
#[derive(Debug, Clone)]
pub struct Wizard {
    graph: NavigationGraph,
    scenarios: Vec<Scenario>,
    definition: WizardModel,
}

impl Wizard {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn entry_path(&self) -> &str {
        &self.definition.entry_path
    }

    pub fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, name: &str) -> Result<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ModelError::ScenarioNotFound(name.to_string()))
    }

    pub fn scenarios_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Scenario> + 'a {
        self.scenarios.iter().filter(move |s| s.has_tag(tag))
    }

    pub fn definition(&self) -> &WizardModel {
        &self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyExpectation, Expect, NodeKind, Role, Target};

    const SAMPLE: &str = r#"
name: sample-wizard
entry_path: /sample
entry: start
nodes:
  - id: start
    kind: landing
    url_pattern: /sample
    title: Sample tool
    body:
      expect: contains
      text: Use this tool
    action_label: Start now
    positive_checks:
      - target: { by: role, role: breadcrumbs }
        expect: { kind: visible }
  - id: age
    kind: numeric
    url_pattern: /sample/y
    title: How old are you?
    body:
      expect: absent
    action_label: Continue
    fields:
      - name: age
        kind: numeric
    negative_cases:
      - name: empty
        expected_error_text: Please answer this question
      - name: letters
        inputs:
          age: abc
        expected_error_text: Please answer this question
  - id: result
    kind: result
    url_pattern: /sample/y/
    title: Your answer
edges:
  - from: start
    to: age
  - from: age
    to: result
scenarios:
  - name: happy-path
    tags: [smoke]
    steps:
      - node: start
        expect_next: age
      - node: age
        answers:
          age: "42"
        expect_next: result
  - name: later
    status:
      state: not_implemented
      note: not built yet
"#;

    #[test]
    fn test_parse_sample_model() {
        let model = WizardModel::from_yaml(SAMPLE).unwrap();
        assert_eq!(model.name, "sample-wizard");
        assert_eq!(model.nodes.len(), 3);
        assert_eq!(model.nodes[0].kind, NodeKind::Landing);
        assert_eq!(
            model.nodes[0].positive_checks[0].target,
            Target::role(Role::Breadcrumbs)
        );
        assert_eq!(model.nodes[0].positive_checks[0].expect, Expect::Visible);
        assert_eq!(model.nodes[1].body, BodyExpectation::Absent);
        assert_eq!(model.nodes[1].negative_cases.len(), 2);
        assert!(model.nodes[1].negative_cases[0].expect_url_unchanged);
    }

    #[test]
    fn test_compile_sample_model() {
        let wizard = WizardModel::from_yaml(SAMPLE).unwrap().compile().unwrap();
        assert_eq!(wizard.scenarios().len(), 2);
        assert!(wizard.scenario("happy-path").unwrap().is_ready());
        assert!(!wizard.scenario("later").unwrap().is_ready());
        assert_eq!(wizard.scenarios_tagged("smoke").count(), 1);
        assert!(wizard.scenario("missing").is_err());
    }

    #[test]
    fn test_yaml_export_round_trips() {
        let model = WizardModel::from_yaml(SAMPLE).unwrap();
        let yaml = model.to_yaml().unwrap();
        let again = WizardModel::from_yaml(&yaml).unwrap();
        assert_eq!(again.nodes, model.nodes);
        assert_eq!(again.edges, model.edges);
        assert_eq!(again.scenarios, model.scenarios);
    }

    #[test]
    fn test_rejects_discontiguous_scenario() {
        let broken = SAMPLE.replace("      - node: age\n", "      - node: result\n");
        let err = WizardModel::from_yaml(&broken).unwrap().compile().unwrap_err();
        assert!(matches!(err, ModelError::InvalidScenario { .. }));
    }

    #[test]
    fn test_load_all_reads_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.yaml"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let models = WizardModel::load_all(dir.path()).unwrap();
        assert_eq!(models.len(), 1);
    }
}

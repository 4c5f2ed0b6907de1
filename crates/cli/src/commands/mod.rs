//! CLI Commands

pub mod config;
pub mod export;
pub mod graph;
pub mod negative;
pub mod run;
pub mod scenarios;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use wizcheck_common::{catalog, Wizard, WizardModel};
use wizcheck_e2e::{HarnessConfig, SessionFactory, SimulatedFactory};

/// Nothing failed
pub const EXIT_OK: u8 = 0;
/// The system under test broke a contract
pub const EXIT_FAILED: u8 = 1;
/// The harness itself could not do its job
pub const EXIT_HARNESS: u8 = 2;

/// Built-in model, or the YAML definition at `path`
pub fn load_model(path: Option<&Path>) -> Result<WizardModel> {
    match path {
        Some(path) => WizardModel::from_file(path)
            .with_context(|| format!("Failed to load model {}", path.display())),
        None => Ok(catalog::holiday_entitlement()),
    }
}

pub fn load_wizard(path: Option<&Path>) -> Result<Arc<Wizard>> {
    let model = load_model(path)?;
    let name = model.name.clone();
    let wizard = model
        .compile()
        .with_context(|| format!("Model {} is invalid", name))?;
    debug!(wizard = wizard.name(), scenarios = wizard.scenarios().len(), "Model loaded");
    Ok(Arc::new(wizard))
}

pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    HarnessConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Sessions on the simulated site, or in Chrome when built with it
pub fn session_factory(config: &HarnessConfig, simulated: bool) -> Result<Box<dyn SessionFactory>> {
    if simulated {
        return Ok(Box::new(SimulatedFactory::new(config.base_url.clone())));
    }

    #[cfg(feature = "chromium")]
    {
        Ok(Box::new(wizcheck_e2e::chromium::ChromiumFactory::from_config(config)))
    }

    #[cfg(not(feature = "chromium"))]
    {
        Err(wizcheck_e2e::E2eError::BrowserUnavailable)
            .context("Rebuild with the `chromium` feature or pass --simulated")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_model_compiles() {
        let wizard = load_wizard(None).unwrap();
        assert_eq!(wizard.name(), "calculate-holiday-entitlement");
    }

    #[test]
    fn test_model_file_round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.yaml");
        std::fs::write(&path, catalog::holiday_entitlement().to_yaml().unwrap()).unwrap();

        let wizard = load_wizard(Some(&path)).unwrap();
        assert_eq!(wizard.scenarios().len(), 7);
    }

    #[test]
    fn test_missing_model_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_wizard(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load model"));
    }

    #[test]
    fn test_simulated_factory_needs_no_browser() {
        let factory = session_factory(&HarnessConfig::default(), true).unwrap();
        assert!(factory.describe().contains("simulated"));
    }
}

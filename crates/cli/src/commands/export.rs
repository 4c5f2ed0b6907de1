//! Export Commands

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::{load_model, EXIT_OK};
use crate::output::OutputFormat;

/// Exports YAML unless `--format json` is given
#[derive(Args)]
pub struct ExportArgs {
    /// Re-export this model file instead of the built-in one
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: ExportArgs, format: OutputFormat) -> Result<u8> {
    let model = load_model(args.model.as_deref())?;
    // Compiling rejects a model that would not load back
    model.clone().compile()?;

    let text = match format {
        OutputFormat::Json => model.to_json()?,
        _ => model.to_yaml()?,
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, text)?;
            crate::output::print_success(&format!("Model written to {}", path.display()));
        }
        None => println!("{}", text),
    }
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizcheck_common::WizardModel;

    #[tokio::test]
    async fn test_exported_json_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let args = ExportArgs {
            model: None,
            output: Some(path.clone()),
        };

        execute(args, OutputFormat::Json).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let model: WizardModel = serde_json::from_str(&text).unwrap();
        assert_eq!(model.name, "calculate-holiday-entitlement");
    }
}

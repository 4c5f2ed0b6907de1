//! Config Commands

use anyhow::{bail, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use wizcheck_e2e::HarnessConfig;

use super::{load_config, EXIT_OK};
use crate::output::print_success;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a default config file
    Init {
        /// Destination (defaults to the --config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

pub async fn execute(cmd: ConfigCommands, config_path: &Path) -> Result<u8> {
    match cmd {
        ConfigCommands::Init { path, force } => {
            let path = path.unwrap_or_else(|| config_path.to_path_buf());
            init(&path, force)?;
            print_success(&format!("Config written to {}", path.display()));
        }
        ConfigCommands::Show => {
            let config = load_config(config_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(EXIT_OK)
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    HarnessConfig::default().save(path)?;
    Ok(())
}

//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod evaluate;
pub mod process;

use std::path::{Path, PathBuf};

use claimx_core::models::config::ClaimxConfig;
use claimx_core::FieldExtractionOrchestrator;
use tracing::{debug, warn};

use crate::llm::LlmDateFallback;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("claimx")
        .join("config.json")
}

/// Load the `--config` file, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ClaimxConfig> {
    if let Some(path) = config_path {
        return Ok(ClaimxConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(ClaimxConfig::from_file(&default_path)?)
    } else {
        Ok(ClaimxConfig::default())
    }
}

/// Orchestrator for the configuration, with the LLM fallback when enabled.
pub fn build_orchestrator(config: &ClaimxConfig) -> anyhow::Result<FieldExtractionOrchestrator> {
    let orchestrator = FieldExtractionOrchestrator::from_config(config)?;

    if !config.extraction.enable_llm_fallback {
        return Ok(orchestrator);
    }

    match LlmDateFallback::from_config(&config.llm) {
        Ok(fallback) => Ok(orchestrator.with_fallback(Box::new(fallback))),
        Err(e) => {
            warn!("LLM date fallback disabled: {}", e);
            Ok(orchestrator)
        }
    }
}

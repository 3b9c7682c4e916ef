//! Configuration management for datree-validator.
//!
//! Configuration lives in markdown files with YAML frontmatter. Both the
//! global file and the project file are optional; values from the project
//! file override the global file field by field.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::PROJECT_CONFIG;

pub mod defaults;
pub mod validation;

pub use defaults::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub validate: ValidateConfig,
}

impl Config {
    /// Load configuration with full merge semantics.
    /// Merge order (later overrides earlier):
    /// 1. Global config (~/.config/datree-validator/config.md)
    /// 2. Project config (.datree/config.md)
    pub fn load() -> Result<Self> {
        Self::load_merged_from(global_config_path().as_deref(), Path::new(PROJECT_CONFIG))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let frontmatter =
            split_frontmatter(content).context("Failed to extract frontmatter from config")?;

        let config: Config =
            serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")?;
        config.validate()?;

        Ok(config)
    }

    /// Load merged configuration from the given global and project paths.
    /// Missing files are skipped; the result is validated.
    pub fn load_merged_from(global_path: Option<&Path>, project_path: &Path) -> Result<Self> {
        let global_config = global_path
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let project_config = Some(project_path)
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let config = global_config.merge_with(project_config);
        config.validate()?;
        Ok(config)
    }
}

/// Returns the path to the global config file,
/// e.g. ~/.config/datree-validator/config.md on Linux
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("datree-validator").join("config.md"))
}

/// Extract the YAML between the leading `---` fences.
pub fn split_frontmatter(content: &str) -> Option<String> {
    let content = content.trim();
    let rest = content.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    Some(rest[..end].to_string())
}

/// Partial config for merging - all fields optional
#[derive(Debug, Deserialize, Default)]
struct PartialConfig {
    pub tool: Option<PartialToolConfig>,
    pub validate: Option<PartialValidateConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialToolConfig {
    pub repo: Option<String>,
    pub version: Option<String>,
    pub api_base: Option<String>,
    pub bin_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialValidateConfig {
    pub policy: Option<String>,
    pub skip_schema_validation: Option<bool>,
    pub strict_exit_codes: Option<bool>,
}

impl PartialConfig {
    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        let frontmatter =
            split_frontmatter(content).context("Failed to extract frontmatter from config")?;

        // An empty frontmatter block is a valid, empty config
        if frontmatter.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")
    }

    /// Merge this global config with a project config, returning the merged result.
    /// Values from the project config take precedence over global.
    fn merge_with(self, project: PartialConfig) -> Config {
        let global_tool = self.tool.unwrap_or_default();
        let global_validate = self.validate.unwrap_or_default();
        let project_tool = project.tool.unwrap_or_default();
        let project_validate = project.validate.unwrap_or_default();

        Config {
            tool: ToolConfig {
                // Project value > global value > default
                repo: project_tool
                    .repo
                    .or(global_tool.repo)
                    .unwrap_or_else(defaults::default_repo),
                version: project_tool
                    .version
                    .or(global_tool.version)
                    .unwrap_or_else(defaults::default_version),
                api_base: project_tool
                    .api_base
                    .or(global_tool.api_base)
                    .unwrap_or_else(defaults::default_api_base),
                bin_dir: project_tool
                    .bin_dir
                    .or(global_tool.bin_dir)
                    .unwrap_or_else(defaults::default_bin_dir),
            },
            validate: ValidateConfig {
                policy: project_validate
                    .policy
                    .or(global_validate.policy)
                    .unwrap_or_else(defaults::default_policy),
                skip_schema_validation: project_validate
                    .skip_schema_validation
                    .or(global_validate.skip_schema_validation)
                    .unwrap_or_else(defaults::default_true),
                strict_exit_codes: project_validate
                    .strict_exit_codes
                    .or(global_validate.strict_exit_codes)
                    .unwrap_or(false),
            },
        }
    }
}

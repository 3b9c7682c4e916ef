//! Validation logic for configuration values.

use anyhow::Result;
use url::Url;

use super::defaults::{ToolConfig, ValidateConfig};
use super::Config;

impl Config {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.tool.validate()?;
        self.validate.validate()
    }
}

impl ToolConfig {
    /// Validate tool configuration
    pub fn validate(&self) -> Result<()> {
        let mut parts = self.repo.split('/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if owner.trim().is_empty() || name.trim().is_empty() || parts.next().is_some() {
            anyhow::bail!("tool.repo must be in owner/name form, got '{}'", self.repo);
        }

        if self.version.trim().is_empty() {
            anyhow::bail!("tool.version must not be empty");
        }

        let api_base = Url::parse(&self.api_base).map_err(|e| {
            anyhow::anyhow!("tool.api_base is not a valid URL '{}': {}", self.api_base, e)
        })?;
        match api_base.scheme() {
            "http" | "https" if api_base.has_host() => {}
            "file" => {}
            _ => anyhow::bail!(
                "tool.api_base must be an http(s) or file URL, got '{}'",
                self.api_base
            ),
        }

        if self.bin_dir.as_os_str().is_empty() {
            anyhow::bail!("tool.bin_dir must not be empty");
        }

        Ok(())
    }
}

impl ValidateConfig {
    /// Validate manifest checking configuration
    pub fn validate(&self) -> Result<()> {
        if self.policy.trim().is_empty() {
            anyhow::bail!("validate.policy must not be empty");
        }
        Ok(())
    }
}

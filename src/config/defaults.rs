//! Default values and configuration structs with default implementations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Macro to generate default functions for serde attributes
macro_rules! default_fn {
    ($name:ident, $type:ty, $value:expr) => {
        pub(crate) fn $name() -> $type {
            $value
        }
    };
}

// =========================================================================
// DEFAULT VALUE FUNCTIONS
// =========================================================================

default_fn!(default_repo, String, "datreeio/datree".to_string());
default_fn!(default_version, String, crate::release::LATEST.to_string());
default_fn!(default_api_base, String, "https://api.github.com".to_string());
default_fn!(default_bin_dir, PathBuf, PathBuf::from(crate::paths::BIN_DIR));
default_fn!(default_policy, String, "Default".to_string());
default_fn!(default_true, bool, true);

// =========================================================================
// CONFIG STRUCTS WITH DEFAULTS
// =========================================================================

/// Where the Datree executable comes from and where it is installed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolConfig {
    /// GitHub repository in `owner/name` form (default: datreeio/datree)
    #[serde(default = "default_repo")]
    pub repo: String,
    /// Release tag to install, or `latest`
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL of the releases API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Directory holding the executable (default: bin)
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            version: default_version(),
            api_base: default_api_base(),
            bin_dir: default_bin_dir(),
        }
    }
}

impl ToolConfig {
    /// Path of the executable inside `bin_dir`
    pub fn binary_path(&self) -> PathBuf {
        self.bin_dir.join(crate::platform::executable_name())
    }
}

/// How manifests are checked
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidateConfig {
    /// Datree policy name passed with `-p`
    #[serde(default = "default_policy")]
    pub policy: String,
    /// Report policy rules only, not YAML/schema errors
    #[serde(default = "default_true")]
    pub skip_schema_validation: bool,
    /// Fail on exit statuses other than 0 and 2
    #[serde(default)]
    pub strict_exit_codes: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            skip_schema_validation: default_true(),
            strict_exit_codes: false,
        }
    }
}

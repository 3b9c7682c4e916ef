//! # datree-validator
//!
//! Runs the Datree CLI over generated Kubernetes manifests and re-reports
//! its findings grouped by rule.
//!
//! ## Overview
//!
//! Datree prints one JSON result per manifest, grouped by file. This crate
//! runs it once per manifest, folds every result into a map keyed by rule
//! identifier and reports one violation per rule with the offending
//! resources from every manifest merged together, followed by a single
//! pass/fail submission.
//!
//! ## Modules
//!
//! - [`install`] - Download and unpack the Datree release for the host platform
//! - [`release`] - GitHub release metadata and asset selection
//! - [`platform`] - OS/architecture to release asset lookup
//! - [`runner`] - Subprocess invocation of `datree test`
//! - [`output`] - Record shapes for Datree's JSON output
//! - [`aggregate`] - Per-rule grouping of per-manifest results
//! - [`report`] - Reporting sinks
//! - [`validate`] - A full validation pass
//! - [`manifests`] - Manifest argument expansion
//! - [`config`] - Configuration files
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use datree_validator::config::Config;
//! use datree_validator::report::RecordingReport;
//! use datree_validator::runner::TestOptions;
//! use datree_validator::validate::{validate_with_binary, ValidateOptions};
//!
//! let config = Config::load().expect("Failed to load config");
//! let opts = ValidateOptions {
//!     test: TestOptions {
//!         policy: config.validate.policy.clone(),
//!         skip_schema_validation: true,
//!     },
//!     strict_exit_codes: false,
//! };
//!
//! let mut report = RecordingReport::new();
//! let manifests = vec![PathBuf::from("dist/app.k8s.yaml")];
//! let status = validate_with_binary(&config.tool.binary_path(), &manifests, opts, &mut report)
//!     .expect("validation failed");
//! println!("{} ({} rules violated)", status, report.violations.len());
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod install;
pub mod manifests;
pub mod output;
pub mod platform;
pub mod release;
pub mod report;
pub mod runner;
pub mod validate;

/// Default path constants.
pub mod paths {
    /// Directory the Datree executable is installed into: `bin`
    pub const BIN_DIR: &str = "bin";
    /// Project configuration file: `.datree/config.md`
    pub const PROJECT_CONFIG: &str = ".datree/config.md";
}

//! Validate command: run datree over manifests and print the report.

use anyhow::Result;
use std::io;
use std::path::PathBuf;

use datree_validator::config::Config;
use datree_validator::manifests;
use datree_validator::report::{JsonReport, Report, ReportStatus, TextReport};
use datree_validator::runner::TestOptions;
use datree_validator::validate::{validate_with_binary, ValidateOptions};

/// Output format for the validate command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

pub struct ValidateArgs {
    pub manifests: Vec<String>,
    pub policy: Option<String>,
    pub binary: Option<PathBuf>,
    pub format: ReportFormat,
    pub strict: bool,
    pub with_schema: bool,
}

pub fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let config = Config::load()?;
    let manifests = manifests::resolve(&args.manifests)?;
    let binary = args
        .binary
        .unwrap_or_else(|| config.tool.binary_path());

    let opts = ValidateOptions {
        test: TestOptions {
            policy: args.policy.unwrap_or(config.validate.policy),
            skip_schema_validation: config.validate.skip_schema_validation && !args.with_schema,
        },
        strict_exit_codes: config.validate.strict_exit_codes || args.strict,
    };

    let stdout = io::stdout();
    let mut report: Box<dyn Report> = match args.format {
        ReportFormat::Text => Box::new(TextReport::new(stdout.lock())),
        ReportFormat::Json => Box::new(JsonReport::new(stdout.lock())),
    };

    let status = validate_with_binary(&binary, &manifests, opts, report.as_mut())?;
    drop(report);

    if status == ReportStatus::Failure {
        std::process::exit(1);
    }
    Ok(())
}

//! A single validation pass over a set of manifests.
//!
//! Manifests are checked one at a time. Each run's output is folded into an
//! [`Aggregation`] owned by the pass, which is flattened and handed to a
//! [`Report`] once every manifest has been processed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::aggregate::Aggregation;
use crate::error::InvocationError;
use crate::output;
use crate::report::{Report, ReportStatus};
use crate::runner::{DatreeCli, TestOptions, ToolOutput, ToolRunner};

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub test: TestOptions,
    /// Treat exit statuses other than 0 and 2 as errors instead of clean runs
    pub strict_exit_codes: bool,
}

pub struct Validator<R: ToolRunner> {
    runner: R,
    opts: ValidateOptions,
}

impl<R: ToolRunner> Validator<R> {
    pub fn new(runner: R, opts: ValidateOptions) -> Self {
        Self { runner, opts }
    }

    /// Run the tool over every manifest and aggregate the results.
    ///
    /// Chunks that fail to parse are logged and skipped. A manifest that
    /// cannot be run at all aborts the pass.
    pub fn collect(&self, manifests: &[PathBuf]) -> Result<Aggregation, InvocationError> {
        let mut aggregation = Aggregation::new();

        for manifest in manifests {
            info!(manifest = %manifest.display(), "validating manifest");
            let out = self.runner.run(manifest, &self.opts.test)?;
            self.fold_output(manifest, &out, &mut aggregation)?;
        }

        Ok(aggregation)
    }

    fn fold_output(
        &self,
        manifest: &Path,
        out: &ToolOutput,
        aggregation: &mut Aggregation,
    ) -> Result<(), InvocationError> {
        match out.code {
            Some(0) => {
                debug!(manifest = %manifest.display(), "no policy violations");
                return Ok(());
            }
            _ if out.violations_found() => {}
            _ if self.opts.strict_exit_codes => {
                return Err(InvocationError::UnexpectedStatus {
                    manifest: manifest.display().to_string(),
                    status: out.status_label(),
                });
            }
            _ => {
                warn!(
                    manifest = %manifest.display(),
                    status = %out.status_label(),
                    stderr = %out.stderr.trim(),
                    "datree exited without reporting violations, treating manifest as clean"
                );
                return Ok(());
            }
        }

        for chunk in out.chunks() {
            for parsed in output::parse_stream(chunk) {
                match parsed {
                    Ok(doc) => {
                        if let Some(summary) = &doc.policy_summary {
                            debug!(
                                policy = %summary.policy_name,
                                rules = summary.total_rules_in_policy,
                                failed = summary.total_rules_failed,
                                "policy summary"
                            );
                        }
                        if let Some(summary) = &doc.evaluation_summary {
                            debug!(
                                configs = summary.configs_count,
                                files = summary.files_count,
                                "evaluation summary"
                            );
                        }
                        aggregation.fold(doc);
                    }
                    Err(e) => {
                        warn!(manifest = %manifest.display(), error = %e, "skipping unparseable output");
                    }
                }
            }
        }

        Ok(())
    }

    /// Run a full pass and report it: one `add_violation` per rule, then a
    /// single `submit`.
    pub fn validate(&self, manifests: &[PathBuf], report: &mut dyn Report) -> Result<ReportStatus> {
        let aggregation = self.collect(manifests)?;
        let result = aggregation.finish();

        for violation in result.violations {
            report
                .add_violation(violation)
                .context("Failed to add violation to report")?;
        }
        report
            .submit(result.status, result.metadata)
            .context("Failed to submit report")?;

        info!(status = %result.status, "validation finished");
        Ok(result.status)
    }
}

/// Validate `manifests` with the executable at `binary`.
///
/// The binary is checked before any manifest is touched; a missing or
/// non-executable binary fails the whole pass.
pub fn validate_with_binary(
    binary: &Path,
    manifests: &[PathBuf],
    opts: ValidateOptions,
    report: &mut dyn Report,
) -> Result<ReportStatus> {
    let cli = DatreeCli::new(binary)?;
    Validator::new(cli, opts).validate(manifests, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;
    use crate::report::RecordingReport;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned outputs keyed by manifest path.
    struct FakeRunner {
        outputs: HashMap<PathBuf, ToolOutput>,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl FakeRunner {
        fn new(outputs: Vec<(&str, ToolOutput)>) -> Self {
            Self {
                outputs: outputs
                    .into_iter()
                    .map(|(p, o)| (PathBuf::from(p), o))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ToolRunner for FakeRunner {
        fn run(&self, manifest: &Path, _opts: &TestOptions) -> Result<ToolOutput, InvocationError> {
            self.calls.borrow_mut().push(manifest.to_path_buf());
            self.outputs
                .get(manifest)
                .cloned()
                .ok_or_else(|| InvocationError::Spawn {
                    binary: PathBuf::from("datree"),
                    manifest: manifest.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such manifest"),
                })
        }
    }

    fn opts(strict: bool) -> ValidateOptions {
        ValidateOptions {
            test: TestOptions {
                policy: "Default".to_string(),
                skip_schema_validation: true,
            },
            strict_exit_codes: strict,
        }
    }

    fn doc(file: &str, rule: &str, resources: &[&str], login: &str) -> String {
        let occurrences: Vec<_> = resources
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::json!({
                    "metadataName": name,
                    "kind": "Deployment",
                    "isSkipped": false,
                    "failureLocations": [{
                        "schemaPath": "/spec/template/spec/containers/0/resources",
                        "failedErrorLine": 10 + i,
                        "failedErrorColumn": 7
                    }]
                })
            })
            .collect();
        serde_json::json!({
            "policyValidationResults": [{
                "fileName": file,
                "ruleResults": [{
                    "identifier": rule,
                    "name": format!("{} display", rule),
                    "messageOnFailure": "fix it",
                    "documentationUrl": "https://hub.datree.io/rule",
                    "occurrencesDetails": occurrences
                }]
            }],
            "loginUrl": login
        })
        .to_string()
    }

    fn violations(stdout: String) -> ToolOutput {
        ToolOutput {
            code: Some(2),
            stdout,
            stderr: String::new(),
        }
    }

    fn clean() -> ToolOutput {
        ToolOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_all_clean_is_success() {
        let runner = FakeRunner::new(vec![("a.yaml", clean()), ("b.yaml", clean())]);
        let mut report = RecordingReport::new();

        let status = Validator::new(runner, opts(false))
            .validate(&paths(&["a.yaml", "b.yaml"]), &mut report)
            .unwrap();

        assert_eq!(status, ReportStatus::Success);
        assert!(report.violations.is_empty());
        assert_eq!(report.status(), Some(ReportStatus::Success));
    }

    #[test]
    fn test_rule_merged_across_manifests() {
        let runner = FakeRunner::new(vec![
            ("a.yaml", violations(doc("a.yaml", "RULE-1", &["web"], "https://l/1"))),
            (
                "b.yaml",
                violations(doc("b.yaml", "RULE-1", &["api", "worker"], "https://l/2")),
            ),
        ]);
        let mut report = RecordingReport::new();

        let status = Validator::new(runner, opts(false))
            .validate(&paths(&["a.yaml", "b.yaml"]), &mut report)
            .unwrap();

        assert_eq!(status, ReportStatus::Failure);
        assert_eq!(report.violations.len(), 1);
        let v = &report.violations[0];
        assert_eq!(v.rule_name, "RULE-1 display");
        assert_eq!(v.violating_resources.len(), 3);
        let files: Vec<_> = v
            .violating_resources
            .iter()
            .map(|r| r.manifest_path.as_str())
            .collect();
        assert_eq!(files, vec!["a.yaml", "b.yaml", "b.yaml"]);
        assert_eq!(
            v.violating_resources[1].locations,
            vec!["spec/template/spec/containers/0/resources (line: 10:7)"]
        );
        assert_eq!(
            report.metadata().unwrap().get("Signup").map(String::as_str),
            Some("https://l/2")
        );
    }

    #[test]
    fn test_malformed_chunk_is_skipped() {
        let out = ToolOutput {
            code: Some(2),
            stdout: doc("a.yaml", "RULE-1", &["web"], ""),
            stderr: "{ not json".to_string(),
        };
        let runner = FakeRunner::new(vec![("a.yaml", out)]);
        let mut report = RecordingReport::new();

        let status = Validator::new(runner, opts(false))
            .validate(&paths(&["a.yaml"]), &mut report)
            .unwrap();

        assert_eq!(status, ReportStatus::Failure);
        assert_eq!(report.violations.len(), 1);
        assert!(report.metadata().unwrap().is_empty());
    }

    #[test]
    fn test_stray_line_keeps_report_in_same_stream() {
        let out = violations(format!(
            "{}\nWarning: your datree version is outdated\n",
            doc("a.yaml", "RULE-1", &["web"], "https://app.datree.io/login?t=1")
        ));
        let runner = FakeRunner::new(vec![("a.yaml", out)]);
        let mut report = RecordingReport::new();

        let status = Validator::new(runner, opts(false))
            .validate(&paths(&["a.yaml"]), &mut report)
            .unwrap();

        assert_eq!(status, ReportStatus::Failure);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].violating_resources[0].resource_name, "web");
        assert_eq!(
            report.metadata().unwrap().get("Signup").map(String::as_str),
            Some("https://app.datree.io/login?t=1")
        );
    }

    #[test]
    fn test_output_ignored_unless_violation_status() {
        let out = ToolOutput {
            code: Some(0),
            stdout: doc("a.yaml", "RULE-1", &["web"], ""),
            stderr: String::new(),
        };
        let runner = FakeRunner::new(vec![("a.yaml", out)]);
        let mut report = RecordingReport::new();

        let status = Validator::new(runner, opts(false))
            .validate(&paths(&["a.yaml"]), &mut report)
            .unwrap();
        assert_eq!(status, ReportStatus::Success);
    }

    #[test]
    fn test_unexpected_status_lenient() {
        let out = ToolOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "Error: invalid policy".to_string(),
        };
        let runner = FakeRunner::new(vec![("a.yaml", out)]);
        let mut report = RecordingReport::new();

        let status = Validator::new(runner, opts(false))
            .validate(&paths(&["a.yaml"]), &mut report)
            .unwrap();
        assert_eq!(status, ReportStatus::Success);
    }

    #[test]
    fn test_unexpected_status_strict() {
        let out = ToolOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "Error: invalid policy".to_string(),
        };
        let runner = FakeRunner::new(vec![("a.yaml", out)]);

        let err = Validator::new(runner, opts(true))
            .collect(&paths(&["a.yaml"]))
            .unwrap_err();
        assert!(matches!(err, InvocationError::UnexpectedStatus { .. }));
    }

    #[test]
    fn test_spawn_failure_aborts_pass() {
        let runner = FakeRunner::new(vec![("b.yaml", clean())]);
        let mut report = RecordingReport::new();

        let validator = Validator::new(runner, opts(false));
        let result = validator.validate(&paths(&["a.yaml", "b.yaml"]), &mut report);

        assert!(result.is_err());
        assert!(report.submission.is_none());
        assert_eq!(validator.runner.calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_binary_fails_before_any_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut report = RecordingReport::new();

        let err = validate_with_binary(
            &tmp.path().join("datree"),
            &paths(&["a.yaml"]),
            opts(false),
            &mut report,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::BinaryMissing(_))
        ));
        assert!(report.submission.is_none());
    }
}

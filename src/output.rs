//! Record shapes for the JSON document `datree test -o json` prints.
//!
//! Only the fields the adapter consumes are required; everything else is
//! optional so that minor schema drift in the tool does not turn a report
//! into a parse failure.

use serde::Deserialize;
use thiserror::Error;

/// A captured output chunk that could not be read as a Datree result.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("output is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("output does not match the expected result shape: {0}")]
    Shape(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatreeOutput {
    #[serde(default)]
    pub policy_validation_results: Vec<PolicyValidationResult>,
    #[serde(default)]
    pub policy_summary: Option<PolicySummary>,
    #[serde(default)]
    pub evaluation_summary: Option<EvaluationSummary>,
    #[serde(default)]
    pub login_url: Option<String>,
}

/// Rule results for one validated file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyValidationResult {
    pub file_name: String,
    #[serde(default)]
    pub rule_results: Vec<RuleResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub message_on_failure: String,
    #[serde(default)]
    pub documentation_url: String,
    #[serde(default)]
    pub occurrences_details: Vec<OccurrenceDetail>,
}

/// One resource that violated a rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceDetail {
    pub metadata_name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub skip_message: Option<String>,
    #[serde(default)]
    pub occurrences: Option<u32>,
    #[serde(default)]
    pub is_skipped: bool,
    #[serde(default)]
    pub failure_locations: Vec<FailureLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureLocation {
    pub schema_path: String,
    pub failed_error_line: u64,
    pub failed_error_column: u64,
}

impl FailureLocation {
    /// Human-readable location: `<schema path> (line: <line>:<column>)`,
    /// with the leading `/` of the schema path removed.
    pub fn display(&self) -> String {
        let path = self
            .schema_path
            .strip_prefix('/')
            .unwrap_or(&self.schema_path);
        format!(
            "{} (line: {}:{})",
            path, self.failed_error_line, self.failed_error_column
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySummary {
    pub policy_name: String,
    #[serde(default)]
    pub total_rules_in_policy: u32,
    #[serde(default)]
    pub total_skipped_rules: u32,
    #[serde(default)]
    pub total_rules_failed: u32,
    #[serde(default)]
    pub total_passed_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    #[serde(default)]
    pub configs_count: u32,
    #[serde(default)]
    pub files_count: u32,
    #[serde(default)]
    pub passed_yaml_validation_count: u32,
    #[serde(default)]
    pub k8s_validation: Option<String>,
    #[serde(default)]
    pub passed_policy_validation_count: u32,
}

/// Parse every JSON document in a captured stream.
///
/// Syntax errors and shape mismatches are reported separately so the log
/// line tells whether the tool printed garbage or a different schema.
/// Text that is not JSON, such as an update notice printed before or after
/// the report, yields one error and parsing resumes at the next line that
/// opens a document in column 0.
pub fn parse_stream(stream: &str) -> Vec<Result<DatreeOutput, ParseError>> {
    let mut results = Vec::new();
    let mut rest = stream.trim_start();

    while !rest.is_empty() {
        let mut documents =
            serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        match documents.next() {
            Some(Ok(value)) => {
                results.push(serde_json::from_value(value).map_err(ParseError::Shape));
                rest = rest[documents.byte_offset()..].trim_start();
            }
            Some(Err(e)) => {
                results.push(Err(ParseError::Json(e)));
                match next_document_start(rest) {
                    Some(start) => rest = &rest[start..],
                    None => break,
                }
            }
            None => break,
        }
    }

    results
}

fn next_document_start(text: &str) -> Option<usize> {
    text.match_indices('\n')
        .map(|(index, _)| index + 1)
        .find(|&start| text[start..].starts_with('{'))
}

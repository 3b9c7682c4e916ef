//! Regrouping of per-manifest results into per-rule violations.
//!
//! Datree reports results grouped by file. Reports are grouped by rule, so
//! every rule result is folded into a map keyed by rule identifier and then
//! flattened into one [`Violation`] per rule with all occurrences merged.

use std::collections::BTreeMap;

use tracing::debug;

use crate::output::{DatreeOutput, OccurrenceDetail, RuleResult};
use crate::report::{ReportStatus, ViolatingResource, Violation};

/// Metadata key under which the login URL is reported.
pub const SIGNUP_KEY: &str = "Signup";

/// One rule's failures within one manifest.
#[derive(Debug, Clone)]
pub struct ViolationRecord {
    pub file_name: String,
    pub rule_identifier: String,
    pub rule_name: String,
    pub recommendation: String,
    pub fix: String,
    pub occurrences: Vec<OccurrenceDetail>,
}

impl ViolationRecord {
    /// Build a record from a rule result, dropping occurrences the tool
    /// marked as skipped. Returns `None` when nothing is left.
    pub fn from_rule_result(file_name: &str, rule: RuleResult) -> Option<Self> {
        let occurrences: Vec<OccurrenceDetail> = rule
            .occurrences_details
            .into_iter()
            .filter(|o| !o.is_skipped)
            .collect();
        if occurrences.is_empty() {
            return None;
        }

        Some(Self {
            file_name: file_name.to_string(),
            rule_identifier: rule.identifier,
            rule_name: rule.name,
            recommendation: rule.message_on_failure,
            fix: rule.documentation_url,
            occurrences,
        })
    }
}

/// Accumulator for a single validation pass.
#[derive(Debug, Default)]
pub struct Aggregation {
    by_rule: BTreeMap<String, Vec<ViolationRecord>>,
    login_url: Option<String>,
}

/// Flattened result of a pass, ready to hand to a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    pub violations: Vec<Violation>,
    pub status: ReportStatus,
    pub metadata: BTreeMap<String, String>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed output document into the aggregation.
    pub fn fold(&mut self, output: DatreeOutput) {
        for file in output.policy_validation_results {
            for rule in file.rule_results {
                if let Some(record) = ViolationRecord::from_rule_result(&file.file_name, rule) {
                    self.add_record(record);
                }
            }
        }

        if let Some(url) = output.login_url.filter(|u| !u.trim().is_empty()) {
            self.login_url = Some(url);
        }
    }

    pub fn add_record(&mut self, record: ViolationRecord) {
        debug!(
            rule = %record.rule_identifier,
            manifest = %record.file_name,
            occurrences = record.occurrences.len(),
            "recording violation"
        );
        self.by_rule
            .entry(record.rule_identifier.clone())
            .or_default()
            .push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.by_rule.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.by_rule.len()
    }

    pub fn login_url(&self) -> Option<&str> {
        self.login_url.as_deref()
    }

    pub fn status(&self) -> ReportStatus {
        if self.is_empty() {
            ReportStatus::Success
        } else {
            ReportStatus::Failure
        }
    }

    /// Flatten into one violation per rule identifier, in identifier order.
    pub fn finish(self) -> AggregateReport {
        let status = self.status();

        let mut metadata = BTreeMap::new();
        if let Some(url) = self.login_url {
            metadata.insert(SIGNUP_KEY.to_string(), url);
        }

        let violations = self
            .by_rule
            .into_values()
            .filter_map(merge_records)
            .collect();

        AggregateReport {
            violations,
            status,
            metadata,
        }
    }
}

/// Merge every record for one rule. Rule metadata comes from the first
/// record; Datree reports the same text for a rule in every file.
fn merge_records(records: Vec<ViolationRecord>) -> Option<Violation> {
    let first = records.first()?;
    let rule_name = first.rule_name.clone();
    let recommendation = first.recommendation.clone();
    let fix = first.fix.clone();

    let violating_resources = records
        .into_iter()
        .flat_map(|record| {
            let file_name = record.file_name;
            record
                .occurrences
                .into_iter()
                .map(move |occurrence| ViolatingResource {
                    resource_name: occurrence.metadata_name,
                    locations: occurrence
                        .failure_locations
                        .iter()
                        .map(|loc| loc.display())
                        .collect(),
                    manifest_path: file_name.clone(),
                })
        })
        .collect();

    Some(Violation {
        rule_name,
        recommendation,
        fix,
        violating_resources,
    })
}

//! Reporting sinks for aggregated violations.
//!
//! A validation pass calls [`Report::add_violation`] once per distinct rule
//! and then [`Report::submit`] exactly once.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;

/// Overall outcome of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Failure,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Success => write!(f, "success"),
            ReportStatus::Failure => write!(f, "failure"),
        }
    }
}

/// A resource that violated a rule, with every location it failed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolatingResource {
    pub resource_name: String,
    pub locations: Vec<String>,
    pub manifest_path: String,
}

/// One rule and every resource, across all manifests, that violated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_name: String,
    pub recommendation: String,
    pub fix: String,
    pub violating_resources: Vec<ViolatingResource>,
}

/// Sink that receives a validation pass's results.
pub trait Report {
    fn add_violation(&mut self, violation: Violation) -> Result<()>;

    /// Finish the report. Calling this more than once is an error.
    fn submit(&mut self, status: ReportStatus, metadata: BTreeMap<String, String>) -> Result<()>;
}

/// In-memory report, for embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingReport {
    pub violations: Vec<Violation>,
    pub submission: Option<(ReportStatus, BTreeMap<String, String>)>,
}

impl RecordingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<ReportStatus> {
        self.submission.as_ref().map(|(status, _)| *status)
    }

    pub fn metadata(&self) -> Option<&BTreeMap<String, String>> {
        self.submission.as_ref().map(|(_, metadata)| metadata)
    }
}

impl Report for RecordingReport {
    fn add_violation(&mut self, violation: Violation) -> Result<()> {
        if self.submission.is_some() {
            bail!("Cannot add a violation to a submitted report");
        }
        self.violations.push(violation);
        Ok(())
    }

    fn submit(&mut self, status: ReportStatus, metadata: BTreeMap<String, String>) -> Result<()> {
        if self.submission.is_some() {
            bail!("Report already submitted");
        }
        self.submission = Some((status, metadata));
        Ok(())
    }
}

/// Colored, human-readable report.
pub struct TextReport<W: Write> {
    out: W,
    violations: usize,
    resources: usize,
    submitted: bool,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            violations: 0,
            resources: 0,
            submitted: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Report for TextReport<W> {
    fn add_violation(&mut self, violation: Violation) -> Result<()> {
        if self.submitted {
            bail!("Cannot add a violation to a submitted report");
        }
        self.violations += 1;
        self.resources += violation.violating_resources.len();

        writeln!(self.out, "{} {}", "✗".red(), violation.rule_name.bold())?;
        if !violation.recommendation.is_empty() {
            writeln!(self.out, "    {}", violation.recommendation)?;
        }
        for resource in &violation.violating_resources {
            writeln!(
                self.out,
                "    {} {} {}",
                "•".red(),
                resource.resource_name.cyan(),
                format!("({})", resource.manifest_path).dimmed()
            )?;
            for location in &resource.locations {
                writeln!(self.out, "        {}", location)?;
            }
        }
        if !violation.fix.is_empty() {
            writeln!(self.out, "    {} {}", "→".cyan(), violation.fix)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn submit(&mut self, status: ReportStatus, metadata: BTreeMap<String, String>) -> Result<()> {
        if self.submitted {
            bail!("Report already submitted");
        }
        self.submitted = true;

        match status {
            ReportStatus::Success => {
                writeln!(self.out, "{} No policy violations found", "✓".green())?;
            }
            ReportStatus::Failure => {
                writeln!(
                    self.out,
                    "{} {} {} violated by {} {}",
                    "✗".red(),
                    self.violations,
                    if self.violations == 1 { "rule" } else { "rules" },
                    self.resources,
                    if self.resources == 1 {
                        "resource"
                    } else {
                        "resources"
                    }
                )?;
            }
        }
        for (key, value) in &metadata {
            writeln!(self.out, "{} {}: {}", "ℹ".cyan(), key, value)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    status: ReportStatus,
    metadata: &'a BTreeMap<String, String>,
    violations: &'a [Violation],
}

/// Machine-readable report: one JSON document written on submit.
pub struct JsonReport<W: Write> {
    out: W,
    violations: Vec<Violation>,
    submitted: bool,
}

impl<W: Write> JsonReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            violations: Vec::new(),
            submitted: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Report for JsonReport<W> {
    fn add_violation(&mut self, violation: Violation) -> Result<()> {
        if self.submitted {
            bail!("Cannot add a violation to a submitted report");
        }
        self.violations.push(violation);
        Ok(())
    }

    fn submit(&mut self, status: ReportStatus, metadata: BTreeMap<String, String>) -> Result<()> {
        if self.submitted {
            bail!("Report already submitted");
        }
        self.submitted = true;

        let doc = JsonDocument {
            status,
            metadata: &metadata,
            violations: &self.violations,
        };
        serde_json::to_writer_pretty(&mut self.out, &doc)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

//! Builders for datree JSON output used across integration tests.

use serde_json::{json, Value};

/// One failing resource in a rule result.
pub fn occurrence(resource: &str, schema_path: &str, line: u64, column: u64) -> Value {
    json!({
        "metadataName": resource,
        "kind": "Deployment",
        "skipMessage": "",
        "occurrences": 1,
        "isSkipped": false,
        "failureLocations": [{
            "schemaPath": schema_path,
            "failedErrorLine": line,
            "failedErrorColumn": column
        }]
    })
}

/// A rule result with the given occurrences.
pub fn rule(identifier: &str, occurrences: Vec<Value>) -> Value {
    json!({
        "identifier": identifier,
        "name": format!("Rule {}", identifier),
        "messageOnFailure": format!("{} failed", identifier),
        "documentationUrl": format!("https://hub.datree.io/built-in-rules/{}", identifier.to_lowercase()),
        "occurrencesDetails": occurrences
    })
}

/// A full `datree test -o json` document for one file.
pub fn datree_output(file_name: &str, rules: Vec<Value>, login_url: &str) -> String {
    serde_json::to_string_pretty(&json!({
        "policyValidationResults": [{
            "fileName": file_name,
            "ruleResults": rules
        }],
        "policySummary": {
            "policyName": "Default",
            "totalRulesInPolicy": 21,
            "totalSkippedRules": 0,
            "totalRulesFailed": 1,
            "totalPassedCount": 20
        },
        "evaluationSummary": {
            "configsCount": 1,
            "filesCount": 1,
            "passedYamlValidationCount": 1,
            "k8sValidation": "1/1",
            "passedPolicyValidationCount": 0
        },
        "loginUrl": login_url
    }))
    .expect("fixture serializes")
}

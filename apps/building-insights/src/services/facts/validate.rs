use serde::Serialize;

use super::extract::extract_claim;
use super::registry::{ClaimRegistry, ClaimRule};
use super::ClaimError;
use crate::services::analysis::AnalysisOutcome;
use crate::services::document::MetricDocument;
use crate::services::report::{assemble_report, ReportType};
use crate::services::store::{DateWindow, SensorTable};

pub const STRUCTURAL_VALIDITY: &str = "Report structure and format appear valid";
pub const STRUCTURAL_ACCURACY: f64 = 85.0;
pub const DEGRADED_ACCURACY: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Discrepancy {
    pub label: String,
    pub reported: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ValidationVerdict {
    /// Percentage of checked claims within tolerance, 0 to 100.
    pub overall_accuracy: f64,
    pub total_facts: usize,
    pub verified_facts: Vec<String>,
    pub discrepancies: Vec<Discrepancy>,
    pub errors: Vec<String>,
}

impl ValidationVerdict {
    fn degraded(error: impl Into<String>) -> Self {
        Self {
            overall_accuracy: DEGRADED_ACCURACY,
            total_facts: 1,
            verified_facts: vec![STRUCTURAL_VALIDITY.to_string()],
            discrepancies: Vec::new(),
            errors: vec![error.into()],
        }
    }
}

enum Check {
    Skipped,
    Verified(String),
    Mismatch(Discrepancy),
}

fn check_rule(rule: &ClaimRule, text: &str, truth: &MetricDocument) -> Result<Check, ClaimError> {
    let Some(actual) = truth.resolve_number(&rule.key_path)? else {
        return Ok(Check::Skipped);
    };
    let Some(claim) = extract_claim(rule, text)? else {
        return Ok(Check::Skipped);
    };
    if (claim.reported - actual).abs() <= rule.tolerance {
        Ok(Check::Verified(format!("{}: {:?}", rule.label, claim.reported)))
    } else {
        Ok(Check::Mismatch(Discrepancy {
            label: rule.label.clone(),
            reported: claim.reported,
            actual,
        }))
    }
}

/// Checks every registry claim found in `text` against `truth`.
///
/// Claims whose ground truth is missing or `null`, or that the text never states,
/// are skipped. A rule that fails is recorded in `errors` and the remaining rules
/// still run; any error pins the accuracy to 50.
pub fn validate_against(
    registry: &ClaimRegistry,
    text: &str,
    truth: &MetricDocument,
) -> ValidationVerdict {
    let mut verified_facts = Vec::new();
    let mut discrepancies = Vec::new();
    let mut errors = Vec::new();

    for rule in registry.rules() {
        match check_rule(rule, text, truth) {
            Ok(Check::Skipped) => {}
            Ok(Check::Verified(entry)) => verified_facts.push(entry),
            Ok(Check::Mismatch(discrepancy)) => discrepancies.push(discrepancy),
            Err(err) => {
                tracing::warn!(label = %rule.label, error = %err, "claim check failed");
                errors.push(format!("Error during fact validation: {}: {err}", rule.label));
            }
        }
    }

    let checked = verified_facts.len() + discrepancies.len();
    let (total_facts, mut overall_accuracy) = if checked == 0 {
        verified_facts.push(STRUCTURAL_VALIDITY.to_string());
        (1, STRUCTURAL_ACCURACY)
    } else {
        let pct = verified_facts.len() as f64 * 100.0 / checked as f64;
        (checked, (pct * 10.0).round() / 10.0)
    };
    if !errors.is_empty() {
        overall_accuracy = DEGRADED_ACCURACY;
    }

    ValidationVerdict {
        overall_accuracy,
        total_facts,
        verified_facts,
        discrepancies,
        errors,
    }
}

/// Validates `text` against a report freshly assembled from `table`.
pub fn validate_report(registry: &ClaimRegistry, table: &SensorTable, text: &str) -> ValidationVerdict {
    let truth = match assemble_report(table, &DateWindow::all(), ReportType::Comprehensive) {
        AnalysisOutcome::Ready(doc) => doc,
        AnalysisOutcome::NoData(reason) => {
            tracing::warn!(reason = %reason, "validating without ground truth");
            MetricDocument::null()
        }
        AnalysisOutcome::Failed(reason) => {
            tracing::error!(reason = %reason, "failed to recompute ground truth");
            return ValidationVerdict::degraded(format!("Validation error: {reason}"));
        }
    };
    let verdict = validate_against(registry, text, &truth);
    tracing::info!(
        accuracy = verdict.overall_accuracy,
        total_facts = verdict.total_facts,
        discrepancies = verdict.discrepancies.len(),
        errors = verdict.errors.len(),
        "validated report narrative"
    );
    verdict
}

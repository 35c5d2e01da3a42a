use serde::Serialize;
use std::ops::Range;

use super::registry::{ClaimRegistry, ClaimRule};
use super::ClaimError;

/// A number the narrative states for one claim rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedClaim {
    pub label: String,
    pub reported: f64,
    /// Byte range of the captured number in the narrative.
    pub span: Option<Range<usize>>,
}

/// First match of `rule` in `text`, if any.
pub fn extract_claim(rule: &ClaimRule, text: &str) -> Result<Option<ExtractedClaim>, ClaimError> {
    let Some(captures) = rule.pattern.captures(text) else {
        return Ok(None);
    };
    let group = captures.get(1).ok_or_else(|| ClaimError::MissingCapture {
        label: rule.label.clone(),
    })?;
    let reported = group
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ClaimError::UnparsableCapture {
            label: rule.label.clone(),
            raw: group.as_str().to_string(),
        })?;
    Ok(Some(ExtractedClaim {
        label: rule.label.clone(),
        reported,
        span: Some(group.range()),
    }))
}

/// Every claim the narrative makes, in registry order. Rules that fail to extract are skipped.
pub fn extract_claims(registry: &ClaimRegistry, text: &str) -> Vec<ExtractedClaim> {
    registry
        .rules()
        .iter()
        .filter_map(|rule| match extract_claim(rule, text) {
            Ok(claim) => claim,
            Err(err) => {
                tracing::debug!(error = %err, "claim extraction failed");
                None
            }
        })
        .collect()
}

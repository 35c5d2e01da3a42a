use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;
use tracing::error;

/// Label, pattern (first capture group is the number), ground-truth key path, tolerance.
/// Captures use ASCII `[0-9]` so every match parses as `f64`.
const BUILTIN_CLAIMS: &[(&str, &str, &str, f64)] = &[
    (
        "Average CO2 levels",
        r"Average CO2 levels.*?([0-9]+(?:\.[0-9]+)?)\s*ppm",
        "detailed_analysis.air_quality.co2_statistics.average_ppm",
        2.0,
    ),
    (
        "Median CO2 levels",
        r"Median CO2 levels.*?([0-9]+(?:\.[0-9]+)?)\s*ppm",
        "detailed_analysis.air_quality.co2_statistics.median_ppm",
        2.0,
    ),
    (
        "Maximum CO2 levels",
        r"Max(?:imum)? CO2 levels.*?([0-9]+(?:\.[0-9]+)?)\s*ppm",
        "detailed_analysis.air_quality.co2_statistics.max_ppm",
        5.0,
    ),
    (
        "Overall sustainability score",
        r"sustainability score.*?([0-9]+(?:\.[0-9]+)?)%",
        "executive_summary.overall_sustainability_score",
        2.0,
    ),
    (
        "Average temperature",
        r"Average temperature.*?([0-9]+(?:\.[0-9]+)?)\s*(?:[°º]\s*C\b|C\b|celsius\b)",
        "detailed_analysis.environmental_comfort.temperature_analysis.average_celsius",
        1.0,
    ),
    (
        "Maximum temperature",
        r"Max(?:imum)? temperature.*?([0-9]+(?:\.[0-9]+)?)\s*(?:[°º]\s*C\b|C\b|celsius\b)",
        "detailed_analysis.environmental_comfort.temperature_analysis.max_celsius",
        1.0,
    ),
    (
        "Average humidity",
        r"Average humidity.*?([0-9]+(?:\.[0-9]+)?)\s*%",
        "detailed_analysis.environmental_comfort.humidity_analysis.average_percent",
        1.0,
    ),
    (
        "Peak activity hour",
        r"Peak activity hour.*?([0-9]+)",
        "detailed_analysis.occupancy_patterns.occupancy_summary.peak_activity_hour",
        0.0,
    ),
];

static BUILTIN: OnceLock<ClaimRegistry> = OnceLock::new();

/// One checkable kind of numeric claim.
#[derive(Debug, Clone)]
pub struct ClaimRule {
    pub label: String,
    pub pattern: Regex,
    pub key_path: String,
    pub tolerance: f64,
}

impl ClaimRule {
    /// Compiles `pattern` case-insensitively.
    pub fn new(
        label: impl Into<String>,
        pattern: &str,
        key_path: impl Into<String>,
        tolerance: f64,
    ) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            label: label.into(),
            pattern,
            key_path: key_path.into(),
            tolerance: tolerance.abs(),
        })
    }
}

/// Ordered set of claim rules. Validation walks the rules in this order.
#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    rules: Vec<ClaimRule>,
}

impl ClaimRegistry {
    pub fn new(rules: Vec<ClaimRule>) -> Self {
        Self { rules }
    }

    /// The built-in sustainability report claims, compiled once per process.
    pub fn builtin() -> &'static ClaimRegistry {
        BUILTIN.get_or_init(|| {
            let rules = BUILTIN_CLAIMS
                .iter()
                .filter_map(|(label, pattern, key_path, tolerance)| {
                    match ClaimRule::new(*label, pattern, *key_path, *tolerance) {
                        Ok(rule) => Some(rule),
                        Err(err) => {
                            error!(label = %label, error = %err, "invalid built-in claim pattern; skipping");
                            None
                        }
                    }
                })
                .collect();
            ClaimRegistry { rules }
        })
    }

    pub fn rules(&self) -> &[ClaimRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

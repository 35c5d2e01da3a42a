//! Numeric fact-checking of generated narrative against recomputed metrics.

pub mod extract;
pub mod registry;
pub mod validate;

pub use extract::{extract_claim, extract_claims, ExtractedClaim};
pub use registry::{ClaimRegistry, ClaimRule};
pub use validate::{validate_against, validate_report, Discrepancy, ValidationVerdict};

use crate::services::document::ResolveError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClaimError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("pattern for '{label}' has no capture group")]
    MissingCapture { label: String },
    #[error("'{raw}' captured for '{label}' is not a number")]
    UnparsableCapture { label: String, raw: String },
}

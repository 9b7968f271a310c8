use serde::{Deserialize, Serialize};

/// Outcome of one validation run. Created fresh per call, never shared.
///
/// Policy violations travel in `errors`/`warnings`, never as faults: a bad
/// signal is the normal case here, not an exceptional one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyResult {
    pub is_valid: bool,
    /// Blocking reasons, in check order
    pub errors: Vec<String>,
    /// Non-blocking concerns, in check order
    pub warnings: Vec<String>,
    /// Advisory text for the caller/UI
    pub recommendations: Vec<String>,
    /// Composite 0-100 score; lower is riskier
    pub safety_score: u8,
}

impl SafetyResult {
    /// The fail-closed result for malformed input or an internal fault:
    /// invalid, zero score, the given blocking reasons.
    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
            recommendations: Vec::new(),
            safety_score: 0,
        }
    }
}

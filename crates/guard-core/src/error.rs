use thiserror::Error;

/// Error taxonomy for the guardrail engine.
///
/// `CircuitBreakerOpen` is deliberately distinct from per-signal policy
/// violations (which travel inside [`crate::SafetyResult`]) so callers can
/// surface "account temporarily locked" and "this trade is unsafe"
/// differently.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("circuit breaker open for account {account}: {reason}")]
    CircuitBreakerOpen { account: String, reason: String },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}

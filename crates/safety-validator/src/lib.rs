//! Stateless signal safety validation.
//!
//! [`validate_signal`] runs a fixed sequence of independent checks against an
//! immutable policy snapshot and merges the partial outcomes into one
//! [`SafetyResult`]. The function is pure: no I/O, no shared state, safe under
//! unbounded concurrency. It never returns a fault for well-typed input:
//! malformed signals degrade to a fail-closed zero-score result instead.

mod checks;
#[cfg(test)]
mod tests;

use guard_core::{MarketSnapshot, SafetyPolicy, SafetyResult, TradingSignal};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use checks::CheckOutcome;

/// Per-error deduction applied on top of the per-check minimum.
const ERROR_PENALTY: i32 = 25;
/// Per-warning deduction applied on top of the per-check minimum.
const WARNING_PENALTY: i32 = 5;

/// Validate a proposed trade against the safety policy.
///
/// Checks run in a fixed order; each contributes errors, warnings,
/// recommendations, and its own 0-100 score. The merged score is the MIN
/// across checks (worst case dominates), further reduced by
/// `25 × errors + 5 × warnings` and floored at zero. A single severe failure
/// can therefore never be diluted by otherwise-good checks.
///
/// The slippage, liquidity, and volatility checks are skipped entirely when
/// `market` is absent; the risk/reward check is skipped unless both stop loss
/// and take profit are set.
pub fn validate_signal(
    signal: &TradingSignal,
    portfolio_value: Decimal,
    policy: &SafetyPolicy,
    market: Option<&MarketSnapshot>,
) -> SafetyResult {
    if let Some(result) = reject_malformed(signal, portfolio_value) {
        return result;
    }

    let mut outcomes = vec![
        checks::check_position_size(signal, portfolio_value, policy),
        checks::check_stop_loss(signal, policy),
        checks::check_take_profit(signal, policy),
        checks::check_leverage(signal, policy),
        checks::check_confidence(signal, policy),
    ];

    if let Some(market) = market {
        outcomes.push(checks::check_slippage(signal, market, policy));
        outcomes.push(checks::check_liquidity(market, policy));
        outcomes.push(checks::check_volatility(market, policy));
    }

    if let Some(outcome) = checks::check_risk_reward(signal) {
        outcomes.push(outcome);
    }

    outcomes.push(checks::check_market_timing(signal, policy));

    let result = merge(outcomes);

    if result.is_valid {
        tracing::debug!(
            pair = %signal.pair,
            action = signal.action.as_str(),
            score = result.safety_score,
            warnings = result.warnings.len(),
            "signal approved"
        );
    } else {
        tracing::warn!(
            pair = %signal.pair,
            action = signal.action.as_str(),
            score = result.safety_score,
            errors = ?result.errors,
            "signal rejected"
        );
    }

    result
}

/// Input-shape gate: a signal with nonsense numerics never reaches the
/// scoring pipeline. Fails closed with a zero score.
fn reject_malformed(signal: &TradingSignal, portfolio_value: Decimal) -> Option<SafetyResult> {
    let mut problems = Vec::new();

    if signal.pair.trim().is_empty() {
        problems.push("pair symbol must not be empty".to_string());
    }
    if signal.entry_price <= Decimal::ZERO {
        problems.push("entry price must be positive".to_string());
    }
    if signal.amount <= Decimal::ZERO {
        problems.push("trade amount must be positive".to_string());
    }
    if !signal.confidence.is_finite() || !(0.0..=100.0).contains(&signal.confidence) {
        problems.push("confidence must be between 0 and 100".to_string());
    }
    if let Some(sl) = signal.stop_loss {
        if sl <= Decimal::ZERO {
            problems.push("stop loss must be positive".to_string());
        }
    }
    if let Some(tp) = signal.take_profit {
        if tp <= Decimal::ZERO {
            problems.push("take profit must be positive".to_string());
        }
    }
    if let Some(lev) = signal.leverage {
        if !lev.is_finite() || lev < 1.0 {
            problems.push("leverage must be at least 1".to_string());
        }
    }
    if portfolio_value <= Decimal::ZERO {
        problems.push("portfolio value must be positive".to_string());
    }

    if problems.is_empty() {
        return None;
    }

    tracing::warn!(
        pair = %signal.pair,
        problems = ?problems,
        "malformed signal rejected before validation"
    );

    Some(SafetyResult::rejected(problems))
}

/// Merge partial check outcomes: AND validity, concatenate messages in check
/// order, take the MIN score, then apply the count-based adjustment.
fn merge(outcomes: Vec<CheckOutcome>) -> SafetyResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();
    let mut min_score: i32 = 100;

    for outcome in outcomes {
        min_score = min_score.min(outcome.score);
        errors.extend(outcome.errors);
        warnings.extend(outcome.warnings);
        recommendations.extend(outcome.recommendations);
    }

    let adjusted =
        100 - ERROR_PENALTY * errors.len() as i32 - WARNING_PENALTY * warnings.len() as i32;
    let safety_score = min_score.min(adjusted).clamp(0, 100) as u8;

    SafetyResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        recommendations,
        safety_score,
    }
}

/// Convert a `Decimal` to `f64` for ratio arithmetic, treating conversion
/// failure as zero (the value has already passed the input-shape gate).
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

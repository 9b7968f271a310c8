//! The individual validation checks. Each returns a partial [`CheckOutcome`];
//! the pipeline in `lib.rs` owns the merge.

use chrono::{Datelike, Timelike, Weekday};
use guard_core::{MarketSnapshot, SafetyPolicy, TradeAction, TradingSignal};
use rust_decimal::Decimal;

use crate::to_f64;

/// Partial result of one check: its own 0-100 score plus any messages.
/// A blocking failure zeroes the check's score.
#[derive(Debug)]
pub(crate) struct CheckOutcome {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub score: i32,
}

impl CheckOutcome {
    fn pass() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
            score: 100,
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.score = 0;
    }

    fn warn(&mut self, message: impl Into<String>, penalty: i32) {
        self.warnings.push(message.into());
        self.score = (self.score - penalty).max(0);
    }

    fn recommend(&mut self, message: impl Into<String>) {
        self.recommendations.push(message.into());
    }
}

/// Check 1: position size relative to portfolio, plus the minimum-viable floor.
pub(crate) fn check_position_size(
    signal: &TradingSignal,
    portfolio_value: Decimal,
    policy: &SafetyPolicy,
) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    let amount = to_f64(signal.amount);
    let ratio = amount / to_f64(portfolio_value);

    if ratio > policy.max_position_size_ratio {
        outcome.fail(format!(
            "position size {:.1}% of portfolio exceeds maximum {:.1}%",
            ratio * 100.0,
            policy.max_position_size_ratio * 100.0
        ));
    } else if ratio > policy.max_position_size_ratio * 0.8 {
        outcome.warn(
            format!(
                "position size {:.1}% of portfolio is close to the {:.1}% maximum",
                ratio * 100.0,
                policy.max_position_size_ratio * 100.0
            ),
            20,
        );
    }

    if amount < policy.min_trade_notional {
        outcome.warn(
            format!(
                "trade notional {:.2} is below the minimum viable size {:.2}",
                amount, policy.min_trade_notional
            ),
            5,
        );
    }

    outcome
}

/// Check 2: stop loss presence and directional correctness.
pub(crate) fn check_stop_loss(signal: &TradingSignal, policy: &SafetyPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    let stop_loss = match signal.stop_loss {
        Some(sl) => sl,
        None => {
            if policy.require_stop_loss {
                outcome.fail("stop loss is required by policy");
            } else {
                outcome.warn("no stop loss set; downside is unbounded", 30);
            }
            return outcome;
        }
    };

    match signal.action {
        TradeAction::Buy if stop_loss >= signal.entry_price => {
            outcome.fail("stop loss must be below entry price for buy");
        }
        TradeAction::Sell if stop_loss <= signal.entry_price => {
            outcome.fail("stop loss must be above entry price for sell");
        }
        _ => {
            let distance =
                (to_f64(signal.entry_price) - to_f64(stop_loss)).abs() / to_f64(signal.entry_price);
            if distance > 0.10 {
                outcome.warn(
                    format!("stop loss is {:.1}% from entry price", distance * 100.0),
                    15,
                );
            }
        }
    }

    outcome
}

/// Check 3: take profit presence and directional correctness.
pub(crate) fn check_take_profit(signal: &TradingSignal, policy: &SafetyPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    let take_profit = match signal.take_profit {
        Some(tp) => tp,
        None => {
            if policy.require_take_profit {
                outcome.fail("take profit is required by policy");
            } else {
                outcome.warn("no take profit set", 10);
            }
            return outcome;
        }
    };

    match signal.action {
        TradeAction::Buy if take_profit <= signal.entry_price => {
            outcome.fail("take profit must be above entry price for buy");
        }
        TradeAction::Sell if take_profit >= signal.entry_price => {
            outcome.fail("take profit must be below entry price for sell");
        }
        _ => {}
    }

    outcome
}

/// Check 4: leverage cap. Signals above 5x always get a recommendation to
/// reduce, independent of pass/fail.
pub(crate) fn check_leverage(signal: &TradingSignal, policy: &SafetyPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();
    let leverage = signal.leverage.unwrap_or(1.0);

    if leverage > policy.max_leverage {
        outcome.fail(format!(
            "leverage {:.0}x exceeds maximum {:.0}x",
            leverage, policy.max_leverage
        ));
    } else if leverage > policy.max_leverage * 0.7 {
        outcome.warn(
            format!(
                "leverage {:.0}x is above 70% of the {:.0}x maximum",
                leverage, policy.max_leverage
            ),
            25,
        );
    }

    if leverage > 5.0 {
        outcome.recommend("consider reducing leverage to limit liquidation risk");
    }

    outcome
}

/// Check 5: signal confidence against the policy threshold.
pub(crate) fn check_confidence(signal: &TradingSignal, policy: &SafetyPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    if signal.confidence < policy.min_confidence_threshold {
        outcome.fail(format!(
            "confidence {:.1}% below minimum threshold {:.1}%",
            signal.confidence, policy.min_confidence_threshold
        ));
    } else if signal.confidence < policy.min_confidence_threshold + 10.0 {
        outcome.warn(
            format!(
                "confidence {:.1}% is barely above the {:.1}% threshold",
                signal.confidence, policy.min_confidence_threshold
            ),
            15,
        );
    }

    outcome
}

/// Check 6: spread relative to entry price. Advisory only.
pub(crate) fn check_slippage(
    signal: &TradingSignal,
    market: &MarketSnapshot,
    policy: &SafetyPolicy,
) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    let spread_ratio = to_f64(market.spread) / to_f64(signal.entry_price);
    if spread_ratio > policy.max_slippage_ratio {
        outcome.warn(
            format!(
                "spread {:.2}% of entry price exceeds the {:.2}% slippage tolerance",
                spread_ratio * 100.0,
                policy.max_slippage_ratio * 100.0
            ),
            10,
        );
    }

    outcome
}

/// Check 7: 24h volume against the liquidity floor. Advisory only.
pub(crate) fn check_liquidity(market: &MarketSnapshot, policy: &SafetyPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    let volume = to_f64(market.volume_24h);
    if volume < policy.min_liquidity_notional {
        outcome.warn(
            format!(
                "24h volume {:.0} below the liquidity floor {:.0}",
                volume, policy.min_liquidity_notional
            ),
            15,
        );
    }

    outcome
}

/// Check 8: realized volatility. Advisory only.
pub(crate) fn check_volatility(market: &MarketSnapshot, policy: &SafetyPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    if market.realized_volatility > policy.max_volatility_ratio {
        outcome.warn(
            format!(
                "realized volatility {:.1}% above the {:.1}% tolerance",
                market.realized_volatility * 100.0,
                policy.max_volatility_ratio * 100.0
            ),
            20,
        );
        outcome.recommend("reduce position size while volatility is elevated");
    }

    outcome
}

/// Check 9: reward distance vs risk distance. Runs only when both stop loss
/// and take profit are set, and only if the directional risk distance is
/// positive; a non-positive distance already failed check 2.
pub(crate) fn check_risk_reward(signal: &TradingSignal) -> Option<CheckOutcome> {
    let stop_loss = signal.stop_loss?;
    let take_profit = signal.take_profit?;

    let entry = to_f64(signal.entry_price);
    let (risk, reward) = match signal.action {
        TradeAction::Buy => (entry - to_f64(stop_loss), to_f64(take_profit) - entry),
        TradeAction::Sell => (to_f64(stop_loss) - entry, entry - to_f64(take_profit)),
    };

    if risk <= 0.0 {
        return None;
    }

    let mut outcome = CheckOutcome::pass();
    let ratio = reward / risk;

    if ratio < 1.0 {
        outcome.warn(
            format!("risk/reward ratio {:.2} is below 1:1", ratio),
            25,
        );
        outcome.recommend("improve the risk/reward ratio to at least 1:1");
    } else if ratio < 2.0 {
        outcome.warn(
            format!("risk/reward ratio {:.2} is below 2:1", ratio),
            10,
        );
    }

    Some(outcome)
}

/// Check 10: soft timing heuristics. Purely advisory, never blocking.
pub(crate) fn check_market_timing(signal: &TradingSignal, policy: &SafetyPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::pass();

    let weekday = signal.timestamp.weekday();
    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        outcome.warn("weekend trading tends to have thinner books", 5);
    }

    let hour = signal.timestamp.hour();
    if hour < policy.liquid_hours_start_utc || hour >= policy.liquid_hours_end_utc {
        outcome.warn(
            format!(
                "outside the liquid trading window ({:02}:00-{:02}:00 UTC)",
                policy.liquid_hours_start_utc, policy.liquid_hours_end_utc
            ),
            5,
        );
    }

    outcome
}

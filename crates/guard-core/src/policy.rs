use serde::{Deserialize, Serialize};

use crate::error::GuardError;

/// Process-wide safety policy applied to every signal validation.
///
/// Mutated only through an administrative update; readers always work against
/// an immutable snapshot, so a validation never observes a half-applied
/// policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyPolicy {
    /// Maximum position size as a fraction of portfolio value (e.g., 0.2 = 20%)
    pub max_position_size_ratio: f64,
    /// Maximum daily loss as a fraction of portfolio value before the breaker trips
    pub max_daily_loss_ratio: f64,
    /// Maximum peak-to-trough drawdown ratio tracked per account
    pub max_drawdown_ratio: f64,
    /// Minimum signal confidence, 0-100
    pub min_confidence_threshold: f64,
    /// Maximum leverage multiplier
    pub max_leverage: f64,
    /// Reject signals without a stop loss
    #[serde(default)]
    pub require_stop_loss: bool,
    /// Reject signals without a take profit
    #[serde(default)]
    pub require_take_profit: bool,
    /// Maximum tolerated spread as a fraction of entry price
    pub max_slippage_ratio: f64,
    /// Minimum 24h volume (quote currency) considered liquid
    pub min_liquidity_notional: f64,
    /// Maximum tolerated realized volatility ratio
    pub max_volatility_ratio: f64,
    /// Minimum viable trade notional (quote currency)
    #[serde(default = "default_min_trade_notional")]
    pub min_trade_notional: f64,
    /// Consecutive losing trades before the breaker trips
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,
    /// Start of the liquid trading window, UTC hour (inclusive)
    #[serde(default = "default_liquid_start")]
    pub liquid_hours_start_utc: u32,
    /// End of the liquid trading window, UTC hour (exclusive)
    #[serde(default = "default_liquid_end")]
    pub liquid_hours_end_utc: u32,
}

fn default_min_trade_notional() -> f64 {
    10.0
}
fn default_max_consecutive_losses() -> u32 {
    5
}
fn default_liquid_start() -> u32 {
    6
}
fn default_liquid_end() -> u32 {
    22
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            max_position_size_ratio: 0.20,
            max_daily_loss_ratio: 0.05,
            max_drawdown_ratio: 0.10,
            min_confidence_threshold: 60.0,
            max_leverage: 10.0,
            require_stop_loss: false,
            require_take_profit: false,
            max_slippage_ratio: 0.005,
            min_liquidity_notional: 1_000_000.0,
            max_volatility_ratio: 0.05,
            min_trade_notional: 10.0,
            max_consecutive_losses: 5,
            liquid_hours_start_utc: 6,
            liquid_hours_end_utc: 22,
        }
    }
}

impl SafetyPolicy {
    /// Check that every threshold is usable before the policy is swapped in.
    pub fn validate(&self) -> Result<(), GuardError> {
        fn ratio_in_range(name: &str, value: f64) -> Result<(), GuardError> {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(GuardError::InvalidPolicy(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
            Ok(())
        }

        ratio_in_range("max_position_size_ratio", self.max_position_size_ratio)?;
        ratio_in_range("max_daily_loss_ratio", self.max_daily_loss_ratio)?;
        ratio_in_range("max_drawdown_ratio", self.max_drawdown_ratio)?;
        ratio_in_range("max_slippage_ratio", self.max_slippage_ratio)?;
        ratio_in_range("max_volatility_ratio", self.max_volatility_ratio)?;

        if !self.min_confidence_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.min_confidence_threshold)
        {
            return Err(GuardError::InvalidPolicy(format!(
                "min_confidence_threshold must be in [0, 100], got {}",
                self.min_confidence_threshold
            )));
        }
        if !self.max_leverage.is_finite() || self.max_leverage < 1.0 {
            return Err(GuardError::InvalidPolicy(format!(
                "max_leverage must be >= 1, got {}",
                self.max_leverage
            )));
        }
        if self.min_liquidity_notional < 0.0 || self.min_trade_notional < 0.0 {
            return Err(GuardError::InvalidPolicy(
                "liquidity and trade notional floors must be non-negative".to_string(),
            ));
        }
        if self.max_consecutive_losses == 0 {
            return Err(GuardError::InvalidPolicy(
                "max_consecutive_losses must be at least 1".to_string(),
            ));
        }
        if self.liquid_hours_start_utc > 23
            || self.liquid_hours_end_utc > 24
            || self.liquid_hours_start_utc >= self.liquid_hours_end_utc
        {
            return Err(GuardError::InvalidPolicy(format!(
                "liquid window {}..{} is not a valid UTC hour range",
                self.liquid_hours_start_utc, self.liquid_hours_end_utc
            )));
        }

        Ok(())
    }
}

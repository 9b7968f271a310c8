use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

/// A proposed trade produced by a strategy engine or entered manually.
///
/// Immutable once constructed. Absent values are explicit `Option`s so that
/// "not set" and "zero" can never be confused downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    /// Trading pair symbol (e.g., "BTC/USDT")
    pub pair: String,
    pub action: TradeAction,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Strategy confidence, 0-100
    pub confidence: f64,
    /// Leverage multiplier, >= 1 when set
    #[serde(default)]
    pub leverage: Option<f64>,
    /// Quote-currency notional of the proposed position
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time market context for a pair. Optional input to validation;
/// the liquidity, slippage, and volatility checks only run when it is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Current bid/ask spread in quote currency
    pub spread: Decimal,
    /// Rolling 24h traded volume in quote currency
    pub volume_24h: Decimal,
    /// Realized volatility as a ratio (e.g., 0.04 = 4%)
    pub realized_volatility: f64,
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Low => "low",
            AlertLevel::Medium => "medium",
            AlertLevel::High => "high",
            AlertLevel::Critical => "critical",
        }
    }
}

/// A risk event recorded against an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    /// Free-form context supplied by the caller
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Account-level severity classification derived from recent alert history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
            ThreatLevel::Critical => "Critical",
        }
    }
}

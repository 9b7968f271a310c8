use std::collections::VecDeque;

use chrono::{Duration, Utc};
use guard_core::{Alert, AlertLevel, GuardError, SafetyResult, ThreatLevel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::breaker::CircuitBreaker;

/// Cap on the per-account alert log; the oldest entries are evicted first.
pub const MAX_ALERTS_PER_ACCOUNT: usize = 200;

/// How far back alerts count toward the derived threat level.
const THREAT_WINDOW_HOURS: i64 = 24;

/// Medium alerts inside the window needed to escalate the threat to High.
const MEDIUM_ESCALATION_COUNT: usize = 5;

/// The per-account mutable risk record. Created lazily on first reference;
/// daily counters are zeroed by an explicit reset, never by a wall clock
/// inside the entity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountRiskState {
    pub active_trade_count: u32,
    pub daily_trade_count: u32,
    /// Losing trades since the last win or daily reset
    pub consecutive_losses: u32,
    /// Accumulated losses (positive number) since the last daily reset
    pub daily_loss_amount: Decimal,
    /// Highest portfolio value observed, for drawdown tracking
    pub peak_portfolio_value: Decimal,
    /// Peak-to-trough decline as a ratio of the peak
    pub current_drawdown_ratio: f64,
    pub circuit_breaker: CircuitBreaker,
    /// Newest first, capped at [`MAX_ALERTS_PER_ACCOUNT`]
    pub alerts: VecDeque<Alert>,
    pub threat_level: ThreatLevel,
}

impl AccountRiskState {
    /// Append an alert (newest first), evict beyond the cap, and re-derive
    /// the threat level from the recent alert distribution.
    pub fn push_alert(&mut self, alert: Alert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(MAX_ALERTS_PER_ACCOUNT);
        self.threat_level = self.derive_threat_level();
    }

    /// Threat level from alerts inside the recent window: any Critical alert
    /// dominates, then High; a pile-up of Medium alerts escalates to High.
    pub fn derive_threat_level(&self) -> ThreatLevel {
        let cutoff = Utc::now() - Duration::hours(THREAT_WINDOW_HOURS);

        let mut mediums = 0usize;
        let mut highest = ThreatLevel::Low;
        for alert in self.alerts.iter().filter(|a| a.timestamp >= cutoff) {
            match alert.level {
                AlertLevel::Critical => return ThreatLevel::Critical,
                AlertLevel::High => highest = highest.max(ThreatLevel::High),
                AlertLevel::Medium => {
                    mediums += 1;
                    highest = highest.max(ThreatLevel::Medium);
                }
                AlertLevel::Low => {}
            }
        }

        if mediums >= MEDIUM_ESCALATION_COUNT {
            highest = highest.max(ThreatLevel::High);
        }
        highest
    }

    /// Structural bookkeeping invariants, surfaced through the health check.
    pub fn is_consistent(&self) -> bool {
        if self.circuit_breaker.is_open()
            && (self.circuit_breaker.reason().is_none()
                || self.circuit_breaker.tripped_at().is_none()
                || self.circuit_breaker.origin().is_none())
        {
            return false;
        }
        if self.daily_loss_amount < Decimal::ZERO {
            return false;
        }
        self.alerts.len() <= MAX_ALERTS_PER_ACCOUNT
    }
}

/// Combined outcome of a risk-gated validation. The breaker variant is
/// deliberately distinct from per-signal policy violations so the caller can
/// render "account temporarily locked" instead of "this trade is unsafe".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SignalVerdict {
    /// The account is locked; the per-signal checks were never consulted.
    BreakerOpen {
        reason: String,
        tripped_at: chrono::DateTime<Utc>,
    },
    /// The breaker was closed and the validator ran.
    Evaluated(SafetyResult),
}

impl SignalVerdict {
    /// True only when the breaker was closed and every blocking check passed.
    pub fn approved(&self) -> bool {
        matches!(self, SignalVerdict::Evaluated(result) if result.is_valid)
    }

    /// Unwrap into the error taxonomy: an open breaker becomes
    /// [`GuardError::CircuitBreakerOpen`] for the given account, so callers
    /// that thread results through `?` get the locked/unsafe distinction for
    /// free.
    pub fn into_result(self, account_id: &str) -> Result<SafetyResult, GuardError> {
        match self {
            SignalVerdict::Evaluated(result) => Ok(result),
            SignalVerdict::BreakerOpen { reason, .. } => Err(GuardError::CircuitBreakerOpen {
                account: account_id.to_string(),
                reason,
            }),
        }
    }
}

/// Engine self-report for the external `/health` surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub accounts_tracked: usize,
    pub open_breakers: usize,
}

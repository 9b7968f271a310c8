use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use guard_core::{Alert, AlertLevel, GuardError, MarketSnapshot, SafetyPolicy, TradingSignal};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::breaker::TripOrigin;
use crate::models::{AccountRiskState, HealthStatus, SignalVerdict};

/// Stateful account risk manager: per-account exposure counters, circuit
/// breakers, alert log, and the active policy snapshot.
///
/// Accounts are fully independent; each lives under its own map entry, and
/// every mutation happens under that entry's lock, so concurrent trades on
/// one account are serialized and a breaker trip is visible to the very next
/// validation. The policy is an atomically swapped immutable snapshot;
/// in-flight validations finish against whichever snapshot they started with.
pub struct RiskManager {
    policy: RwLock<Arc<SafetyPolicy>>,
    accounts: DashMap<String, AccountRiskState>,
}

impl Default for RiskManager {
    fn default() -> Self {
        Self {
            policy: RwLock::new(Arc::new(SafetyPolicy::default())),
            accounts: DashMap::new(),
        }
    }
}

impl RiskManager {
    pub fn new(policy: SafetyPolicy) -> Result<Self, GuardError> {
        policy.validate()?;
        Ok(Self {
            policy: RwLock::new(Arc::new(policy)),
            accounts: DashMap::new(),
        })
    }

    /// The current policy snapshot.
    pub fn policy(&self) -> Arc<SafetyPolicy> {
        // Recovering from poison is sound here: the lock only ever guards a
        // whole-Arc replacement, never partial state.
        self.policy.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Atomically swap in a new policy. In-flight validations keep the
    /// snapshot they already hold.
    pub fn update_config(&self, new_policy: SafetyPolicy) -> Result<(), GuardError> {
        new_policy.validate()?;
        let mut guard = self.policy.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(new_policy);
        tracing::info!("safety policy updated");
        Ok(())
    }

    /// Gate a signal through the account's circuit breaker, then the
    /// stateless validator.
    ///
    /// An open breaker fails fast: the per-signal checks are never consulted
    /// and the verdict carries the breaker's reason, distinct from any policy
    /// violation. Account state is created lazily on first reference.
    pub fn validate_signal(
        &self,
        signal: &TradingSignal,
        account_id: &str,
        portfolio_value: Decimal,
        market: Option<&MarketSnapshot>,
    ) -> SignalVerdict {
        let policy = self.policy();

        {
            let entry = self.accounts.entry(account_id.to_string()).or_default();
            if entry.circuit_breaker.is_open() {
                let reason = entry
                    .circuit_breaker
                    .reason()
                    .unwrap_or("circuit breaker open")
                    .to_string();
                tracing::warn!(account = account_id, %reason, "signal blocked by circuit breaker");
                return SignalVerdict::BreakerOpen {
                    reason,
                    tripped_at: entry.circuit_breaker.tripped_at().unwrap_or_else(Utc::now),
                };
            }
        }

        SignalVerdict::Evaluated(safety_validator::validate_signal(
            signal,
            portfolio_value,
            &policy,
            market,
        ))
    }

    /// Settlement hook: an approved order went live. Serialized per account.
    pub fn record_trade(&self, account_id: &str) {
        let mut state = self.accounts.entry(account_id.to_string()).or_default();
        state.active_trade_count += 1;
        state.daily_trade_count += 1;
        tracing::debug!(
            account = account_id,
            active = state.active_trade_count,
            daily = state.daily_trade_count,
            "trade recorded"
        );
    }

    /// Settlement hook: a trade closed with the given P&L. Updates exposure,
    /// drawdown, and the loss streak, and trips the breaker when the daily
    /// loss or the streak crosses its policy limit.
    pub fn record_trade_outcome(&self, account_id: &str, pnl: Decimal, portfolio_value: Decimal) {
        let policy = self.policy();
        let mut state = self.accounts.entry(account_id.to_string()).or_default();

        state.active_trade_count = state.active_trade_count.saturating_sub(1);

        if pnl < Decimal::ZERO {
            state.daily_loss_amount += -pnl;
            state.consecutive_losses += 1;
        } else {
            state.consecutive_losses = 0;
        }

        let was_drawn_down = state.current_drawdown_ratio > policy.max_drawdown_ratio;
        if portfolio_value > state.peak_portfolio_value {
            state.peak_portfolio_value = portfolio_value;
            state.current_drawdown_ratio = 0.0;
        } else if state.peak_portfolio_value > Decimal::ZERO {
            let peak = state.peak_portfolio_value.to_f64().unwrap_or(0.0);
            let current = portfolio_value.to_f64().unwrap_or(0.0);
            state.current_drawdown_ratio = ((peak - current) / peak).max(0.0);
        }

        if !was_drawn_down && state.current_drawdown_ratio > policy.max_drawdown_ratio {
            let message = format!(
                "drawdown {:.1}% exceeds the {:.1}% limit",
                state.current_drawdown_ratio * 100.0,
                policy.max_drawdown_ratio * 100.0
            );
            tracing::warn!(account = account_id, %message, "drawdown limit crossed");
            let drawdown_ratio = state.current_drawdown_ratio;
            state.push_alert(Alert {
                level: AlertLevel::High,
                message,
                data: serde_json::json!({ "drawdown_ratio": drawdown_ratio }),
                timestamp: Utc::now(),
            });
        }

        if portfolio_value > Decimal::ZERO {
            let loss_ratio = state.daily_loss_amount.to_f64().unwrap_or(0.0)
                / portfolio_value.to_f64().unwrap_or(1.0);
            if loss_ratio > policy.max_daily_loss_ratio {
                trip_breaker(
                    account_id,
                    &mut state,
                    TripOrigin::DailyLoss,
                    format!(
                        "daily loss {:.1}% exceeds the {:.1}% limit",
                        loss_ratio * 100.0,
                        policy.max_daily_loss_ratio * 100.0
                    ),
                );
            }
        }

        if state.consecutive_losses >= policy.max_consecutive_losses {
            let message = format!(
                "{} consecutive losing trades reach the limit of {}",
                state.consecutive_losses, policy.max_consecutive_losses
            );
            trip_breaker(account_id, &mut state, TripOrigin::ConsecutiveLosses, message);
        }
    }

    /// Administrative halt: trips the breaker with `Manual` origin, which
    /// only [`RiskManager::reset_circuit_breaker`] can clear.
    pub fn halt_trading(&self, account_id: &str, reason: &str) {
        let mut state = self.accounts.entry(account_id.to_string()).or_default();
        trip_breaker(account_id, &mut state, TripOrigin::Manual, reason.to_string());
    }

    /// Append an alert to the account's bounded log and re-derive its threat
    /// level. High/Critical alerts are expected to be forwarded to an
    /// external channel by the caller; this core only keeps the log.
    pub fn record_alert(
        &self,
        account_id: &str,
        level: AlertLevel,
        message: &str,
        data: serde_json::Value,
    ) -> Alert {
        let alert = Alert {
            level,
            message: message.to_string(),
            data,
            timestamp: Utc::now(),
        };

        match level {
            AlertLevel::Critical => {
                tracing::error!(account = account_id, alert = message, "critical risk alert")
            }
            AlertLevel::High => tracing::warn!(account = account_id, alert = message, "risk alert"),
            _ => tracing::info!(account = account_id, alert = message, "risk alert"),
        }

        let mut state = self.accounts.entry(account_id.to_string()).or_default();
        state.push_alert(alert.clone());
        alert
    }

    /// A consistent point-in-time snapshot of the account's risk record.
    pub fn get_risk_summary(&self, account_id: &str) -> Result<AccountRiskState, GuardError> {
        self.accounts
            .get(account_id)
            .map(|state| state.clone())
            .ok_or_else(|| GuardError::AccountNotFound(account_id.to_string()))
    }

    /// Daily-boundary reset for one account or all: zeroes the daily trade
    /// count, daily loss, and loss streak, and closes loss/streak-origin
    /// breakers. Manual locks stay in place.
    pub fn reset_daily_metrics(&self, account_id: Option<&str>) -> Result<(), GuardError> {
        fn reset(state: &mut AccountRiskState) {
            state.daily_trade_count = 0;
            state.daily_loss_amount = Decimal::ZERO;
            state.consecutive_losses = 0;
            state.circuit_breaker.reset_daily();
        }

        match account_id {
            Some(id) => {
                let mut state = self
                    .accounts
                    .get_mut(id)
                    .ok_or_else(|| GuardError::AccountNotFound(id.to_string()))?;
                reset(&mut state);
                tracing::info!(account = id, "daily risk metrics reset");
            }
            None => {
                for mut entry in self.accounts.iter_mut() {
                    reset(&mut entry);
                }
                tracing::info!("daily risk metrics reset for all accounts");
            }
        }
        Ok(())
    }

    /// Unconditional administrative breaker reset. Idempotent.
    pub fn reset_circuit_breaker(&self, account_id: &str) -> Result<(), GuardError> {
        let mut state = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| GuardError::AccountNotFound(account_id.to_string()))?;
        state.circuit_breaker.reset();
        Ok(())
    }

    /// Engine self-check for the external health surface. Never panics;
    /// reports unhealthy if any account's bookkeeping is inconsistent.
    pub fn health_check(&self) -> HealthStatus {
        let mut healthy = true;
        let mut open_breakers = 0usize;

        for entry in self.accounts.iter() {
            if entry.circuit_breaker.is_open() {
                open_breakers += 1;
            }
            if !entry.is_consistent() {
                tracing::error!(account = entry.key().as_str(), "inconsistent risk state");
                healthy = false;
            }
        }

        HealthStatus {
            healthy,
            accounts_tracked: self.accounts.len(),
            open_breakers,
        }
    }

    /// Serialize every account's risk record for the external persistence
    /// collaborator. The core never touches storage itself.
    pub fn export_state(&self) -> anyhow::Result<String> {
        let snapshot: BTreeMap<String, AccountRiskState> = self
            .accounts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Rehydrate account records exported by [`RiskManager::export_state`],
    /// typically at process startup. Returns the number of accounts loaded.
    pub fn import_state(&self, json: &str) -> anyhow::Result<usize> {
        let snapshot: BTreeMap<String, AccountRiskState> = serde_json::from_str(json)?;
        let count = snapshot.len();
        for (account_id, state) in snapshot {
            self.accounts.insert(account_id, state);
        }
        tracing::info!(accounts = count, "risk state rehydrated");
        Ok(count)
    }
}

/// Trip the breaker and record the companion Critical alert. A repeat trip
/// while already open keeps the first alert (the breaker handles origin
/// upgrades itself).
fn trip_breaker(
    account_id: &str,
    state: &mut AccountRiskState,
    origin: TripOrigin,
    reason: String,
) {
    if state.circuit_breaker.is_open() {
        state.circuit_breaker.trip(origin, reason);
        return;
    }

    tracing::error!(account = account_id, %reason, "tripping circuit breaker");
    state.circuit_breaker.trip(origin, reason.clone());
    state.push_alert(Alert {
        level: AlertLevel::Critical,
        message: reason,
        data: serde_json::json!({ "origin": format!("{origin:?}") }),
        timestamp: Utc::now(),
    });
}

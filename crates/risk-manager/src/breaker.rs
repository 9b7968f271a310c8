//! Per-account circuit breaker.
//!
//! A binary breaker: `Closed` allows trading, `Open` blocks every new trade
//! for the account regardless of signal quality. It never transitions on a
//! timer; only the daily rollover or an administrative reset closes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Breaker position. `Closed` = trading allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BreakerState {
    #[default]
    Closed,
    Open,
}

/// What tripped the breaker. Loss- and streak-origin trips clear on the daily
/// rollover; `Manual` trips survive it and require an explicit admin reset,
/// so a lock placed for a non-loss reason (e.g. suspected compromised
/// credentials) cannot be reopened by the nightly job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripOrigin {
    DailyLoss,
    ConsecutiveLosses,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CircuitBreaker {
    state: BreakerState,
    origin: Option<TripOrigin>,
    reason: Option<String>,
    tripped_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    pub fn is_open(&self) -> bool {
        self.state == BreakerState::Open
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn origin(&self) -> Option<TripOrigin> {
        self.origin
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn tripped_at(&self) -> Option<DateTime<Utc>> {
        self.tripped_at
    }

    /// `Closed → Open`. A second trip while already open keeps the first
    /// trip's metadata, except that a `Manual` trip upgrades the origin so an
    /// administrative lock is never cleared by the daily rollover.
    pub fn trip(&mut self, origin: TripOrigin, reason: impl Into<String>) {
        let reason = reason.into();

        if self.is_open() {
            if origin == TripOrigin::Manual && self.origin != Some(TripOrigin::Manual) {
                tracing::warn!(%reason, "open breaker upgraded to manual lock");
                self.origin = Some(TripOrigin::Manual);
                self.reason = Some(reason);
            }
            return;
        }

        tracing::error!(%reason, ?origin, "circuit breaker tripped, trading blocked");
        self.state = BreakerState::Open;
        self.origin = Some(origin);
        self.reason = Some(reason);
        self.tripped_at = Some(Utc::now());
    }

    /// Unconditional `Open → Closed`, administrative only. Idempotent.
    pub fn reset(&mut self) {
        if self.is_open() {
            tracing::warn!("circuit breaker reset, trading re-enabled");
        }
        self.state = BreakerState::Closed;
        self.origin = None;
        self.reason = None;
        self.tripped_at = None;
    }

    /// Daily-rollover close: clears loss- and streak-origin trips only.
    pub fn reset_daily(&mut self) {
        if self.is_open() && self.origin != Some(TripOrigin::Manual) {
            self.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_and_reset_round_trip() {
        let mut breaker = CircuitBreaker::default();
        assert!(!breaker.is_open());

        breaker.trip(TripOrigin::DailyLoss, "daily loss limit hit");
        assert!(breaker.is_open());
        assert_eq!(breaker.origin(), Some(TripOrigin::DailyLoss));
        assert!(breaker.tripped_at().is_some());

        breaker.reset();
        assert!(!breaker.is_open());
        assert!(breaker.reason().is_none());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut breaker = CircuitBreaker::default();
        breaker.trip(TripOrigin::ConsecutiveLosses, "5 losses in a row");
        breaker.reset();
        breaker.reset();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn daily_reset_spares_manual_locks() {
        let mut breaker = CircuitBreaker::default();
        breaker.trip(TripOrigin::Manual, "compliance hold");
        breaker.reset_daily();
        assert!(breaker.is_open());

        breaker.reset();
        assert!(!breaker.is_open());
    }

    #[test]
    fn manual_trip_upgrades_open_breaker() {
        let mut breaker = CircuitBreaker::default();
        breaker.trip(TripOrigin::DailyLoss, "daily loss limit hit");
        breaker.trip(TripOrigin::Manual, "compliance hold");

        breaker.reset_daily();
        assert!(breaker.is_open(), "manual lock must survive the rollover");
    }

    #[test]
    fn second_loss_trip_keeps_first_metadata() {
        let mut breaker = CircuitBreaker::default();
        breaker.trip(TripOrigin::DailyLoss, "first");
        breaker.trip(TripOrigin::ConsecutiveLosses, "second");
        assert_eq!(breaker.origin(), Some(TripOrigin::DailyLoss));
        assert_eq!(breaker.reason(), Some("first"));
    }
}

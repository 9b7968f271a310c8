pub mod breaker;
pub mod manager;
pub mod models;

pub use breaker::{BreakerState, CircuitBreaker, TripOrigin};
pub use manager::RiskManager;
pub use models::{AccountRiskState, HealthStatus, SignalVerdict, MAX_ALERTS_PER_ACCOUNT};

pub mod error;
pub mod policy;
pub mod result;
pub mod types;

pub use error::GuardError;
pub use policy::SafetyPolicy;
pub use result::SafetyResult;
pub use types::{Alert, AlertLevel, MarketSnapshot, ThreatLevel, TradeAction, TradingSignal};

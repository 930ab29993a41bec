//! Domain types for RoundLab

pub mod ids;
pub mod round;
pub mod trade;

pub use ids::{ConfigHash, DatasetHash, RunId};
pub use round::{DataGap, RoundRecord, Side, TrendSignal, Winner, PRICE_DECIMALS};
pub use trade::TradeOutcome;

//! Domain types for the simulator: bars, signals, account, positions, trades.

pub mod account;
pub mod bar;
pub mod ids;
pub mod position;
pub mod signal;
pub mod trade;

pub use account::Account;
pub use bar::{Bar, BarError};
pub use ids::{TradeId, TradeIdGen};
pub use position::{Position, PositionSide};
pub use signal::{SignalType, TradingSignal};
pub use trade::{OpenTrade, TradeRecord};

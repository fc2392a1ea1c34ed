//! Stock ledger and depletion forecasting

pub mod forecast;
pub mod ledger;

pub use ledger::StockLedger;

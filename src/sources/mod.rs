pub mod alphavantage;
pub mod synthetic;

pub use alphavantage::AlphaVantageClient;

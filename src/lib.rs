pub mod coinbase;
pub mod config;
pub mod engine;
pub mod error;
pub mod error_tracker;
pub mod forecaster;
pub mod model;
pub mod report;
pub mod series;
pub mod ticker_store;

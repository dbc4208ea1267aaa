#![forbid(unsafe_code)]

pub mod config;
pub mod model;
pub mod pricing;
pub mod time;

pub use config::QuoteConfig;
pub use time::Clock;

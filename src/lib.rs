pub mod catalog;
pub mod config;
pub mod domain;
pub mod marvel_client;
pub mod services;
pub mod storage;

pub use catalog::Catalog;
pub use config::Config;

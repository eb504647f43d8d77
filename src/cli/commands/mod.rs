pub mod audit;
pub mod check_key;
pub mod config;
pub mod history;
pub mod plan;

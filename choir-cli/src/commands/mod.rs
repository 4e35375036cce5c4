pub mod account;
pub mod config;

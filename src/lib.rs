pub mod api;
pub mod config;
pub mod error;
pub mod layout;
pub mod optimizer;
pub mod solidity;

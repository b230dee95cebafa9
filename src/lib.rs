pub mod api;
pub mod atomic;
pub mod check;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod deploy;
pub mod entity;
pub mod error;
pub mod export;
pub mod fs;
pub mod logging;
pub mod output;
pub mod plan;
pub mod project;
pub mod resolve;
pub mod suggestions;
pub mod validate;

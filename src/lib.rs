pub mod cli;
pub mod client;
pub mod config;
pub mod confirm;
pub mod error;
pub mod render;
pub mod session;
pub mod shell;
pub mod upload;

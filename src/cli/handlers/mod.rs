// src/cli/handlers/mod.rs

// The logic behind each CLI command.

pub mod commons;
pub mod exec;
pub mod help;
pub mod resolve;
pub mod serve;
pub mod token;

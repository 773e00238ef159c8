// src/core/mod.rs

pub mod cache;
pub mod chatops;
pub mod compiler;
pub mod extra_params;
pub mod format;
pub mod matcher;
pub mod refresh;
pub mod registry;
pub mod settings;

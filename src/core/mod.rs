// src/core/mod.rs

pub mod defaults;
pub mod fingerprint;
pub mod mode_override;
pub mod python_prefix;
pub mod registry;
pub mod resolver;
pub mod scanner;

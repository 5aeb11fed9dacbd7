// src/constants.rs

//! Compiled-in defaults and fixed literals.

// DEFAULT_PORT, DEFAULT_LOCATION and DEFAULT_PYTHON_PREFIXES, generated by build.rs.
include!(concat!(env!("OUT_DIR"), "/defaults.rs"));

/// Prefix of the per-instance cache directory below the location root.
pub const INSTANCE_DIR_PREFIX: &str = "spindle.";

/// Token that ends launcher option processing.
pub const END_OF_OPTIONS: &str = "--";

/// Separator used by python prefix lists.
pub const PREFIX_SEPARATOR: &str = ":";

/// First bit of the reserved security-model field in the option word.
pub const SECURITY_FIELD_SHIFT: u32 = 24;

/// Width mask of the security-model field in the option word.
pub const SECURITY_FIELD_MASK: u64 = 0xF;

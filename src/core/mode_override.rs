// src/core/mode_override.rs

//! The debug mode override.
//!
//! When the resolved configuration has [`Feature::Debug`], exec-family targets
//! must be remapped rather than relocated, and the main executable must stay in
//! place so debuggers see it at its original path. This is the one mutation a
//! resolved configuration ever receives: `Resolved` -> `DebugAdjusted`.

use crate::models::{ConfigState, Feature, ResolvedConfig};

/// Applies the override to a freshly resolved configuration.
///
/// A configuration without the debug bit is returned unchanged and stays
/// `Resolved`. A configuration that is already `DebugAdjusted` is returned
/// unchanged as well.
pub fn apply(mut config: ResolvedConfig) -> ResolvedConfig {
    if config.state == ConfigState::DebugAdjusted || !config.features.contains(Feature::Debug) {
        return config;
    }

    config.features.remove(Feature::RelocAout);
    config.features.remove(Feature::RelocExec);
    config.features.insert(Feature::RemapExec);
    config.state = ConfigState::DebugAdjusted;

    log::debug!("Debug mode override applied: {}", config.features);
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::Resolver;

    fn resolve_without_override(params: &[&str]) -> ResolvedConfig {
        let args: Vec<String> = params.iter().map(|s| s.to_string()).collect();
        let mut resolver = Resolver::new();
        resolver.scan(&args).unwrap();
        resolver.finalize().unwrap()
    }

    #[test]
    fn test_debug_forces_remap_over_explicit_relocation() {
        let resolved =
            resolve_without_override(&["--reloc-aout=yes", "--reloc-exec=yes", "--debug=yes", "job"]);
        assert_eq!(resolved.state(), ConfigState::Resolved);
        assert!(resolved.has(Feature::RelocAout));
        assert!(resolved.has(Feature::RelocExec));
        assert!(!resolved.has(Feature::RemapExec));

        let adjusted = apply(resolved);
        assert_eq!(adjusted.state(), ConfigState::DebugAdjusted);
        assert!(!adjusted.has(Feature::RelocAout));
        assert!(!adjusted.has(Feature::RelocExec));
        assert!(adjusted.has(Feature::RemapExec));
        assert!(adjusted.has(Feature::Debug));
        assert!(adjusted.has(Feature::RelocLibs));
    }

    #[test]
    fn test_without_debug_nothing_changes() {
        let resolved = resolve_without_override(&["job"]);
        let after = apply(resolved.clone());
        assert_eq!(after, resolved);
        assert_eq!(after.state(), ConfigState::Resolved);
    }

    #[test]
    fn test_override_is_not_reentered() {
        let adjusted = apply(resolve_without_override(&["--debug=y", "job"]));
        let again = apply(adjusted.clone());
        assert_eq!(again, adjusted);
    }
}

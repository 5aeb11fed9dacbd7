// src/core/defaults.rs

use crate::constants::{DEFAULT_LOCATION, DEFAULT_PORT, DEFAULT_PYTHON_PREFIXES};
use crate::models::{Feature, FeatureSet, SecurityModel};

/// The compiled-in baseline the resolver falls back to for every setting the
/// command line leaves alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDefaults {
    /// Baseline of the relocation default-bundle group.
    pub relocation: FeatureSet,
    /// Baseline of the miscellaneous default-bundle group.
    pub misc: FeatureSet,
    /// Distribution model used when neither push nor pull is given.
    pub distribution: Feature,
    /// Network transport used when none is given.
    pub network: Feature,
    /// Available security models, most preferred first.
    pub security_candidates: Vec<SecurityModel>,
    /// Server port.
    pub port: u16,
    /// Root of the node-local cache directories.
    pub location: String,
    /// Colon-separated python prefixes merged with the user's list.
    pub python_prefixes: String,
    /// Whether usage logging starts enabled.
    pub logging_enabled: bool,
}

impl CompiledDefaults {
    /// The defaults this binary was built with.
    pub fn builtin() -> Self {
        Self {
            relocation: FeatureSet::of(&[
                Feature::RelocAout,
                Feature::RelocLibs,
                Feature::RelocExec,
                Feature::RelocPython,
                Feature::FollowFork,
            ]),
            misc: FeatureSet::of(&[Feature::Strip]),
            distribution: Feature::Push,
            network: Feature::Cobo,
            security_candidates: SecurityModel::available().to_vec(),
            port: DEFAULT_PORT,
            location: DEFAULT_LOCATION.to_string(),
            python_prefixes: DEFAULT_PYTHON_PREFIXES.to_string(),
            logging_enabled: cfg!(feature = "usage-logging"),
        }
    }

    /// Every feature bit turned on by the defaults alone.
    pub fn baseline_features(&self) -> FeatureSet {
        let mut features = self.relocation.union(self.misc);
        features.insert(self.distribution);
        features.insert(self.network);
        features
    }

    /// The default security model: the first candidate.
    pub fn default_security(&self) -> Option<SecurityModel> {
        self.security_candidates.first().copied()
    }
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self::builtin()
    }
}

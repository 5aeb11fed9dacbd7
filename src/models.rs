// src/models.rs

//! Data model of the launcher configuration: feature bits, their exclusivity
//! groups, security models and the resolved configuration itself.

use crate::constants::{INSTANCE_DIR_PREFIX, SECURITY_FIELD_MASK, SECURITY_FIELD_SHIFT};
use crate::core::{mode_override, python_prefix};
use lazy_static::lazy_static;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

// --- FEATURE BITS ---

/// One independently togglable capability of a launch.
///
/// The discriminant is the bit index used by [`ResolvedConfig::option_word`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Relocate the main executable.
    RelocAout = 0,
    /// Relocate shared libraries.
    RelocLibs = 1,
    /// Relocate python modules loaded by the interpreter.
    RelocPython = 2,
    /// Relocate the targets of exec-family calls.
    RelocExec = 3,
    /// Relocate objects in forked children.
    FollowFork = 4,
    /// Push distribution: every loaded object is sent to all nodes.
    Push = 5,
    /// Pull distribution: objects are fetched on demand.
    Pull = 6,
    /// Tree-based server network.
    Cobo = 7,
    /// Strip symbols before distributing binaries.
    Strip = 8,
    /// Hide the relocation layer from debuggers.
    Debug = 9,
    /// A preload list was supplied.
    Preload = 10,
    /// Keep the node-local cache after the run.
    NoClean = 11,
    /// The job is not an MPI job.
    NoMpi = 12,
    /// Do not hide internal file descriptors from the application.
    NoHide = 13,
    /// Remap exec-family targets instead of relocating them.
    RemapExec = 14,
}

impl Feature {
    /// Every feature, in bit order.
    pub const ALL: [Self; 15] = [
        Self::RelocAout,
        Self::RelocLibs,
        Self::RelocPython,
        Self::RelocExec,
        Self::FollowFork,
        Self::Push,
        Self::Pull,
        Self::Cobo,
        Self::Strip,
        Self::Debug,
        Self::Preload,
        Self::NoClean,
        Self::NoMpi,
        Self::NoHide,
        Self::RemapExec,
    ];

    /// Bit index of this feature in the option word.
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// The exclusivity group this feature belongs to.
    pub fn group(self) -> FeatureGroup {
        match self {
            Self::RelocAout
            | Self::RelocLibs
            | Self::RelocPython
            | Self::RelocExec
            | Self::FollowFork => FeatureGroup::Relocation,
            Self::Push | Self::Pull => FeatureGroup::Distribution,
            Self::Cobo => FeatureGroup::Network,
            Self::Strip | Self::Debug | Self::Preload | Self::NoClean => FeatureGroup::Misc,
            Self::NoMpi | Self::NoHide | Self::RemapExec => FeatureGroup::Direct,
        }
    }

    /// Stable, human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::RelocAout => "reloc-aout",
            Self::RelocLibs => "reloc-libs",
            Self::RelocPython => "reloc-python",
            Self::RelocExec => "reloc-exec",
            Self::FollowFork => "follow-fork",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Cobo => "cobo",
            Self::Strip => "strip",
            Self::Debug => "debug",
            Self::Preload => "preload",
            Self::NoClean => "noclean",
            Self::NoMpi => "no-mpi",
            Self::NoHide => "no-hide",
            Self::RemapExec => "remap-exec",
        }
    }

    fn mask(self) -> u32 {
        1 << self.ordinal()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the resolver treats the bits of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Exactly one bit is resolved: the explicit choice, or the compiled default.
    ExactlyOne,
    /// Compiled baseline bits, individually overridable in both directions.
    DefaultBundle,
    /// Bits set directly by dedicated options or by the mode override.
    Direct,
}

/// A named partition of the feature bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    /// What gets relocated.
    Relocation,
    /// Push or pull.
    Distribution,
    /// Server network topology.
    Network,
    /// Other per-run behaviors with a compiled baseline.
    Misc,
    /// Bits outside the enable/disable accumulators.
    Direct,
}

impl FeatureGroup {
    /// Resolution rule applied to this group.
    pub fn kind(self) -> GroupKind {
        match self {
            Self::Distribution | Self::Network => GroupKind::ExactlyOne,
            Self::Relocation | Self::Misc => GroupKind::DefaultBundle,
            Self::Direct => GroupKind::Direct,
        }
    }

    /// All features of the group.
    pub fn members(self) -> FeatureSet {
        Feature::ALL
            .iter()
            .copied()
            .filter(|feature| feature.group() == self)
            .collect()
    }

    /// Short label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Relocation => "relocation",
            Self::Distribution => "push/pull",
            Self::Network => "network",
            Self::Misc => "miscellaneous",
            Self::Direct => "launch",
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A set of [`Feature`]s backed by a dense bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureSet {
    mask: u32,
}

impl FeatureSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self { mask: 0 }
    }

    /// Builds a set from a slice of features.
    pub fn of(features: &[Feature]) -> Self {
        features.iter().copied().collect()
    }

    /// Adds a feature. Returns `true` if it was not present.
    pub fn insert(&mut self, feature: Feature) -> bool {
        let added = !self.contains(feature);
        self.mask |= feature.mask();
        added
    }

    /// Removes a feature. Returns `true` if it was present.
    pub fn remove(&mut self, feature: Feature) -> bool {
        let present = self.contains(feature);
        self.mask &= !feature.mask();
        present
    }

    /// Whether the feature is in the set.
    pub fn contains(self, feature: Feature) -> bool {
        self.mask & feature.mask() != 0
    }

    /// Whether the set has no members.
    pub fn is_empty(self) -> bool {
        self.mask == 0
    }

    /// Number of members.
    pub fn len(self) -> usize {
        self.iter().count()
    }

    /// Members of either set.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            mask: self.mask | other.mask,
        }
    }

    /// Members of both sets.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self {
            mask: self.mask & other.mask,
        }
    }

    /// Members of `self` that are not in `other`.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self {
            mask: self.mask & !other.mask,
        }
    }

    /// The members that belong to `group`.
    #[must_use]
    pub fn restricted_to(self, group: FeatureGroup) -> Self {
        self.intersection(group.members())
    }

    /// Iterates the members in bit order.
    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL
            .into_iter()
            .filter(move |feature| self.contains(*feature))
    }

    /// The raw bitmask, one bit per [`Feature::ordinal`].
    pub fn bits(self) -> u32 {
        self.mask
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut set = Self::empty();
        for feature in iter {
            set.insert(feature);
        }
        set
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Feature::name).collect();
        f.write_str(&names.join(","))
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for feature in self.iter() {
            seq.serialize_element(&feature)?;
        }
        seq.end()
    }
}

// --- SECURITY MODELS ---

/// Authentication scheme between the launcher and the distribution servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityModel {
    /// Authenticate through munge.
    Munge,
    /// Exchange keys through the tool launch daemon.
    Lmon,
    /// Use a keyfile stored in a global file system.
    Keyfile,
    /// No authentication at all.
    Unauthenticated,
}

lazy_static! {
    static ref AVAILABLE_SECURITY_MODELS: Vec<SecurityModel> = SecurityModel::CANDIDATES
        .iter()
        .copied()
        .filter(|model| model.is_compiled())
        .collect();
}

impl SecurityModel {
    /// Every model, in default-preference order.
    pub const CANDIDATES: [Self; 4] = [Self::Munge, Self::Lmon, Self::Keyfile, Self::Unauthenticated];

    /// Whether support for this model was compiled in.
    pub fn is_compiled(self) -> bool {
        match self {
            Self::Munge => cfg!(feature = "security-munge"),
            Self::Lmon => cfg!(feature = "security-lmon"),
            Self::Keyfile => cfg!(feature = "security-keyfile"),
            Self::Unauthenticated => cfg!(feature = "security-none"),
        }
    }

    /// Compiled-in models in preference order. Never empty.
    pub fn available() -> &'static [Self] {
        &AVAILABLE_SECURITY_MODELS
    }

    /// Identifier stored in the option word's security field.
    pub fn id(self) -> u64 {
        match self {
            Self::Munge => 1,
            Self::Lmon => 2,
            Self::Keyfile => 3,
            Self::Unauthenticated => 4,
        }
    }

    /// Command-line option selecting this model.
    pub fn option_name(self) -> &'static str {
        match self {
            Self::Munge => "security-munge",
            Self::Lmon => "security-lmon",
            Self::Keyfile => "security-keyfile",
            Self::Unauthenticated => "security-none",
        }
    }

    /// Help text for the selecting option.
    pub fn description(self) -> &'static str {
        match self {
            Self::Munge => "Use munge for security authentication",
            Self::Lmon => "Use the launch daemon to exchange keys for security authentication",
            Self::Keyfile => {
                "Use a keyfile stored in a global file system for security authentication"
            }
            Self::Unauthenticated => "Do not do any security authentication",
        }
    }
}

impl fmt::Display for SecurityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Munge => "munge",
            Self::Lmon => "lmon",
            Self::Keyfile => "keyfile",
            Self::Unauthenticated => "none",
        };
        f.write_str(name)
    }
}

// --- RESOLVED CONFIGURATION ---

/// Lifecycle state of a [`ResolvedConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigState {
    /// Produced by finalize; no post-processing applied.
    Resolved,
    /// The debug mode override has been applied.
    DebugAdjusted,
}

/// The final launch configuration.
///
/// Built once by the resolver and read-only afterwards. The only transition is
/// [`ResolvedConfig::apply_mode_override`], which consumes the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub(crate) features: FeatureSet,
    pub(crate) security: SecurityModel,
    pub(crate) port: u16,
    pub(crate) location: String,
    pub(crate) preload_file: Option<PathBuf>,
    pub(crate) python_prefixes: BTreeSet<String>,
    pub(crate) use_mpi: bool,
    pub(crate) hide_fds: bool,
    pub(crate) logging_enabled: bool,
    pub(crate) command: Vec<String>,
    pub(crate) state: ConfigState,
}

impl ResolvedConfig {
    /// Applies the debug mode override. See [`mode_override::apply`].
    #[must_use]
    pub fn apply_mode_override(self) -> Self {
        mode_override::apply(self)
    }

    /// The resolved feature bits.
    pub fn features(&self) -> FeatureSet {
        self.features
    }

    /// Shorthand for `features().contains(feature)`.
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(feature)
    }

    /// Dense encoding: feature bits at their ordinals, security id in the
    /// reserved field starting at bit 24.
    pub fn option_word(&self) -> u64 {
        let security = (self.security.id() & SECURITY_FIELD_MASK) << SECURITY_FIELD_SHIFT;
        u64::from(self.features.bits()) | security
    }

    /// TCP port of the distribution servers.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Root directory of the node-local cache.
    pub fn location_root(&self) -> &str {
        &self.location
    }

    /// Cache directory of one server instance: `<root>/spindle.<instance>`.
    pub fn location(&self, instance: u32) -> String {
        format!("{}/{}{}", self.location, INSTANCE_DIR_PREFIX, instance)
    }

    /// Path of the preload list, if one was given. The file is not read here.
    pub fn preload_file(&self) -> Option<&Path> {
        self.preload_file.as_deref()
    }

    /// The selected security model.
    pub fn security_model(&self) -> SecurityModel {
        self.security
    }

    /// Deduplicated python prefixes joined with `:` in lexicographic order.
    pub fn python_prefixes(&self) -> String {
        python_prefix::join(&self.python_prefixes)
    }

    /// Deduplicated python prefixes.
    pub fn python_prefix_set(&self) -> &BTreeSet<String> {
        &self.python_prefixes
    }

    /// Whether the job is launched through MPI.
    pub fn is_mpi_job(&self) -> bool {
        self.use_mpi
    }

    /// Whether the launcher's file descriptors are hidden from the job.
    pub fn hide_fds(&self) -> bool {
        self.hide_fds
    }

    /// Whether usage logging is on.
    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    /// The job command (first captured token).
    pub fn command(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    /// Number of captured tokens, command included.
    pub fn app_argc(&self) -> usize {
        self.command.len()
    }

    /// Captured tokens, argv-style: command first, then its arguments.
    pub fn app_args(&self) -> &[String] {
        &self.command
    }

    /// Lifecycle state.
    pub fn state(&self) -> ConfigState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> ResolvedConfig {
        ResolvedConfig {
            features: FeatureSet::of(&[Feature::RelocLibs, Feature::Push, Feature::Cobo]),
            security: SecurityModel::Keyfile,
            port: 21940,
            location: "/tmp".to_string(),
            preload_file: None,
            python_prefixes: ["/usr".to_string()].into_iter().collect(),
            use_mpi: true,
            hide_fds: true,
            logging_enabled: false,
            command: vec!["srun".to_string(), "-n".to_string(), "4".to_string()],
            state: ConfigState::Resolved,
        }
    }

    #[test]
    fn test_feature_set_operations() {
        let mut set = FeatureSet::of(&[Feature::RelocAout, Feature::Strip]);
        assert!(set.contains(Feature::RelocAout));
        assert!(!set.contains(Feature::Pull));
        assert!(set.insert(Feature::Pull));
        assert!(!set.insert(Feature::Pull));
        assert_eq!(set.len(), 3);
        assert!(set.remove(Feature::Strip));
        assert!(!set.remove(Feature::Strip));

        let other = FeatureSet::of(&[Feature::Pull, Feature::Cobo]);
        assert_eq!(set.intersection(other), FeatureSet::of(&[Feature::Pull]));
        assert_eq!(set.difference(other), FeatureSet::of(&[Feature::RelocAout]));
        assert_eq!(set.union(other).len(), 3);
    }

    #[test]
    fn test_groups_partition_all_features() {
        let groups = [
            FeatureGroup::Relocation,
            FeatureGroup::Distribution,
            FeatureGroup::Network,
            FeatureGroup::Misc,
            FeatureGroup::Direct,
        ];
        let total: usize = groups.iter().map(|g| g.members().len()).sum();
        assert_eq!(total, Feature::ALL.len());
        assert_eq!(
            FeatureGroup::Distribution.members(),
            FeatureSet::of(&[Feature::Push, Feature::Pull])
        );
        assert_eq!(FeatureGroup::Network.kind(), GroupKind::ExactlyOne);
        assert_eq!(FeatureGroup::Misc.kind(), GroupKind::DefaultBundle);
    }

    #[test]
    fn test_feature_set_display_and_serialize() {
        let set = FeatureSet::of(&[Feature::Cobo, Feature::RelocAout]);
        assert_eq!(set.to_string(), "reloc-aout,cobo");
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["reloc-aout","cobo"]"#);
    }

    #[test]
    fn test_available_security_models_follow_candidate_order() {
        let available = SecurityModel::available();
        assert!(!available.is_empty());
        let positions: Vec<usize> = available
            .iter()
            .map(|m| SecurityModel::CANDIDATES.iter().position(|c| c == m).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(available.iter().all(|m| m.is_compiled()));
    }

    #[test]
    fn test_option_word_encodes_security_in_reserved_field() {
        let config = sample_config();
        let word = config.option_word();
        assert_eq!(word & 0xFF_FFFF, u64::from(config.features().bits()));
        assert_eq!((word >> 24) & 0xF, SecurityModel::Keyfile.id());
    }

    #[test]
    fn test_location_appends_instance_directory() {
        let config = sample_config();
        assert_eq!(config.location(0), "/tmp/spindle.0");
        assert_eq!(config.location(42), "/tmp/spindle.42");
        assert_eq!(config.location_root(), "/tmp");
    }

    #[test]
    fn test_app_args_are_argv_style() {
        let config = sample_config();
        assert_eq!(config.command(), "srun");
        assert_eq!(config.app_argc(), 3);
        assert_eq!(config.app_args()[2], "4");
    }
}

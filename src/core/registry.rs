// src/core/registry.rs

//! The option registry: every launcher option, what it controls, what kind of
//! value it takes and which exclusivity group it belongs to.

use crate::core::resolver::{ResolverError, ResolverResult};
use crate::models::{Feature, FeatureGroup, SecurityModel};
use lazy_static::lazy_static;
use std::collections::HashMap;

/// The value an option takes on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A `yes`/`y`/`no`/`n` literal.
    YesNo,
    /// Free-form text; the placeholder is shown in help.
    Text(&'static str),
    /// No value.
    Flag,
}

/// What an option does once scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionAction {
    /// Enable or disable a feature bit.
    Feature(Feature),
    /// Server TCP port.
    Port,
    /// Root of the node-local cache.
    Location,
    /// Extra python install prefixes.
    PythonPrefix,
    /// Preload list path. Also enables [`Feature::Preload`].
    Preload,
    /// Select a security model.
    Security(SecurityModel),
    /// Turn usage logging off.
    DisableLogging,
    /// Treat the job as a serial job.
    NoMpi,
    /// Leave internal file descriptors visible.
    NoHide,
}

/// Help section an option is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionGroup {
    /// Relocation behaviors.
    Relocation,
    /// Push or pull distribution.
    Distribution,
    /// Server network and placement.
    Network,
    /// Security models.
    Security,
    /// Everything else.
    Misc,
}

impl OptionGroup {
    /// Display order of the help sections.
    pub const ORDER: [Self; 5] = [
        Self::Relocation,
        Self::Distribution,
        Self::Network,
        Self::Security,
        Self::Misc,
    ];

    /// Section title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Relocation => "Relocation",
            Self::Distribution => "Distribution model",
            Self::Network => "Network",
            Self::Security => "Security",
            Self::Misc => "Miscellaneous",
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Long name, without the leading `--`.
    pub name: &'static str,
    /// Optional single-character key.
    pub short: Option<char>,
    /// What kind of value follows the option.
    pub kind: ValueKind,
    /// Effect on the resolver.
    pub action: OptionAction,
    /// Help section.
    pub group: OptionGroup,
    /// One-line help text.
    pub help: &'static str,
    /// Accepted but not listed in help.
    pub hidden: bool,
}

impl OptionSpec {
    /// Whether the option needs a value.
    pub fn takes_value(&self) -> bool {
        !matches!(self.kind, ValueKind::Flag)
    }

    /// The feature bit an option enables or disables, if any.
    pub fn feature(&self) -> Option<Feature> {
        match self.action {
            OptionAction::Feature(feature) => Some(feature),
            OptionAction::Preload => Some(Feature::Preload),
            _ => None,
        }
    }

    /// The exclusivity group of the controlled feature, if any.
    pub fn feature_group(&self) -> Option<FeatureGroup> {
        self.feature().map(Feature::group)
    }
}

const fn entry(
    name: &'static str,
    short: char,
    kind: ValueKind,
    action: OptionAction,
    group: OptionGroup,
    help: &'static str,
) -> OptionSpec {
    OptionSpec {
        name,
        short: Some(short),
        kind,
        action,
        group,
        help,
        hidden: false,
    }
}

/// Options present in every build. Security options are appended at runtime
/// from the compiled-in models.
static BASE_OPTIONS: &[OptionSpec] = &[
    entry(
        "reloc-aout",
        'a',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::RelocAout),
        OptionGroup::Relocation,
        "Relocate the main executable. Default: yes",
    ),
    entry(
        "reloc-libs",
        'l',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::RelocLibs),
        OptionGroup::Relocation,
        "Relocate shared libraries. Default: yes",
    ),
    entry(
        "reloc-python",
        'y',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::RelocPython),
        OptionGroup::Relocation,
        "Relocate python modules (.py/.pyc) when loaded via python. Default: yes",
    ),
    entry(
        "reloc-exec",
        'x',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::RelocExec),
        OptionGroup::Relocation,
        "Relocate the targets of exec/execv/execve/... calls. Default: yes",
    ),
    entry(
        "follow-fork",
        'f',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::FollowFork),
        OptionGroup::Relocation,
        "Relocate objects in forked child processes. Default: yes",
    ),
    entry(
        "push",
        'p',
        ValueKind::Flag,
        OptionAction::Feature(Feature::Push),
        OptionGroup::Distribution,
        "Make objects loaded by any process available to all processes (default)",
    ),
    entry(
        "pull",
        'q',
        ValueKind::Flag,
        OptionAction::Feature(Feature::Pull),
        OptionGroup::Distribution,
        "Make objects available only to the processes that require them",
    ),
    entry(
        "cobo",
        'c',
        ValueKind::Flag,
        OptionAction::Feature(Feature::Cobo),
        OptionGroup::Network,
        "Use a tree-based cobo network for distributing objects (default)",
    ),
    entry(
        "port",
        't',
        ValueKind::Text("number"),
        OptionAction::Port,
        OptionGroup::Network,
        "TCP port for the distribution servers",
    ),
    entry(
        "location",
        'o',
        ValueKind::Text("directory"),
        OptionAction::Location,
        OptionGroup::Network,
        "Back-end directory for relocated files. Should be node-local, such as a ramdisk",
    ),
    entry(
        "python-prefix",
        'r',
        ValueKind::Text("path[:path...]"),
        OptionAction::PythonPrefix,
        OptionGroup::Misc,
        "Colon-separated list of directories that contain the python install location",
    ),
    entry(
        "debug",
        'd',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::Debug),
        OptionGroup::Misc,
        "Hide relocation from debuggers so libraries appear to come from their original locations. Default: no",
    ),
    entry(
        "preload",
        'e',
        ValueKind::Text("file"),
        OptionAction::Preload,
        OptionGroup::Misc,
        "Text file with a white-space separated list of files to stage on each node before execution",
    ),
    entry(
        "strip",
        's',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::Strip),
        OptionGroup::Misc,
        "Strip debug and symbol information from binaries before distributing them. Default: yes",
    ),
    entry(
        "noclean",
        'n',
        ValueKind::YesNo,
        OptionAction::Feature(Feature::NoClean),
        OptionGroup::Misc,
        "Keep the node-local file cache after execution. Default: no",
    ),
    OptionSpec {
        hidden: !cfg!(feature = "usage-logging"),
        ..entry(
            "disable-logging",
            'z',
            ValueKind::Flag,
            OptionAction::DisableLogging,
            OptionGroup::Misc,
            "Disable usage logging for this invocation",
        )
    },
    entry(
        "no-mpi",
        'm',
        ValueKind::Flag,
        OptionAction::NoMpi,
        OptionGroup::Misc,
        "Run a serial job instead of an MPI job",
    ),
    entry(
        "no-hide",
        'h',
        ValueKind::Flag,
        OptionAction::NoHide,
        OptionGroup::Misc,
        "Do not hide internal file descriptors from the application",
    ),
];

lazy_static! {
    static ref OPTION_REGISTRY: Vec<OptionSpec> = {
        let mut options = BASE_OPTIONS.to_vec();
        options.extend(SecurityModel::available().iter().map(|model| OptionSpec {
            name: model.option_name(),
            short: None,
            kind: ValueKind::Flag,
            action: OptionAction::Security(*model),
            group: OptionGroup::Security,
            help: model.description(),
            hidden: false,
        }));
        options
    };
    static ref LONG_INDEX: HashMap<&'static str, usize> = OPTION_REGISTRY
        .iter()
        .enumerate()
        .map(|(i, spec)| (spec.name, i))
        .collect();
}

/// All options known to this build.
pub fn all_options() -> &'static [OptionSpec] {
    &OPTION_REGISTRY
}

/// Options listed in help, in registry order.
pub fn visible_options() -> impl Iterator<Item = &'static OptionSpec> {
    all_options().iter().filter(|spec| !spec.hidden)
}

/// Looks up an option by its long name.
pub fn find_long(name: &str) -> Option<&'static OptionSpec> {
    LONG_INDEX
        .get(name)
        .and_then(|&index| OPTION_REGISTRY.get(index))
}

/// Looks up an option by its short key.
pub fn find_short(key: char) -> Option<&'static OptionSpec> {
    OPTION_REGISTRY.iter().find(|spec| spec.short == Some(key))
}

/// Parses a yes/no literal for `spec`. Matching is exact and case-sensitive.
pub fn parse_switch(spec: &OptionSpec, value: &str) -> ResolverResult<bool> {
    match value {
        "yes" | "y" => Ok(true),
        "no" | "n" => Ok(false),
        _ => Err(ResolverError::MalformedSwitch {
            option: spec.name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_find_long_and_short_agree() {
        let by_long = find_long("reloc-aout").unwrap();
        let by_short = find_short('a').unwrap();
        assert_eq!(by_long, by_short);
        assert_eq!(by_long.kind, ValueKind::YesNo);
        assert_eq!(by_long.feature(), Some(Feature::RelocAout));
        assert_eq!(by_long.feature_group(), Some(FeatureGroup::Relocation));
    }

    #[test]
    fn test_unknown_options_are_not_found() {
        assert!(find_long("reloc-everything").is_none());
        assert!(find_long("").is_none());
        assert!(find_short('Q').is_none());
    }

    #[test]
    fn test_names_and_short_keys_are_unique() {
        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        for spec in all_options() {
            assert!(names.insert(spec.name), "duplicate option {}", spec.name);
            if let Some(key) = spec.short {
                assert!(keys.insert(key), "duplicate short key {}", key);
            }
        }
    }

    #[test]
    fn test_security_options_follow_compiled_models() {
        let security: Vec<_> = all_options()
            .iter()
            .filter(|spec| spec.group == OptionGroup::Security)
            .collect();
        assert_eq!(security.len(), SecurityModel::available().len());
        for spec in security {
            assert_eq!(spec.kind, ValueKind::Flag);
            assert!(spec.short.is_none());
            assert!(matches!(spec.action, OptionAction::Security(m) if m.is_compiled()));
        }
    }

    #[cfg(not(feature = "security-munge"))]
    #[test]
    fn test_missing_security_model_is_unknown() {
        assert!(find_long("security-munge").is_none());
    }

    #[test]
    fn test_preload_controls_preload_bit() {
        let spec = find_long("preload").unwrap();
        assert!(spec.takes_value());
        assert_eq!(spec.feature(), Some(Feature::Preload));
    }

    #[test]
    fn test_parse_switch_accepts_exact_literals() {
        let spec = find_long("strip").unwrap();
        assert!(parse_switch(spec, "yes").unwrap());
        assert!(parse_switch(spec, "y").unwrap());
        assert!(!parse_switch(spec, "no").unwrap());
        assert!(!parse_switch(spec, "n").unwrap());
    }

    #[test]
    fn test_parse_switch_rejects_other_literals() {
        let spec = find_long("strip").unwrap();
        for value in ["YES", "No", "true", "1", ""] {
            let err = parse_switch(spec, value).unwrap_err();
            assert!(err.to_string().contains("strip must be 'yes' or 'no'"));
        }
    }
}

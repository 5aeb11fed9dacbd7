// src/core/resolver.rs

use crate::core::defaults::CompiledDefaults;
use crate::core::python_prefix;
use crate::core::registry::{self, OptionAction, ValueKind};
use crate::core::scanner::{self, ScannedOption};
use crate::models::{ConfigState, Feature, FeatureGroup, FeatureSet, ResolvedConfig, SecurityModel};
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can make a launcher command line unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("{option} must be 'yes' or 'no' (got '{value}')")]
    MalformedSwitch { option: String, value: String },
    #[error("Option '{option}' requires a value.")]
    MissingValue { option: String },
    #[error("Option '{option}' does not take a value.")]
    UnexpectedValue { option: String },
    #[error("port must be a number between 1 and 65535 (got '{value}')")]
    InvalidPort { value: String },
    #[error("Cannot have the same option both enabled and disabled: {options}")]
    ConflictingDirective { options: String },
    #[error("Cannot enable multiple {group} options: {options}")]
    MultipleSelection { group: FeatureGroup, options: String },
    #[error("Cannot select more than one security model (--{} and --{})", .first.option_name(), .second.option_name())]
    MultipleSecurityModels {
        first: SecurityModel,
        second: SecurityModel,
    },
    #[error("No security model is available in this build.")]
    NoSecurityModel,
    #[error("No command found to launch.")]
    MissingCommand,
    #[error("Unknown option '{option}'.")]
    UnknownOption { option: String },
}

/// Result alias for resolution.
pub type ResolverResult<T> = Result<T, ResolverError>;

// --- PUBLIC API ---

/// Resolves launcher arguments against the compiled-in defaults, then applies
/// the debug mode override.
pub fn resolve(args: &[String]) -> ResolverResult<ResolvedConfig> {
    resolve_with_defaults(args, CompiledDefaults::builtin())
}

/// Like [`resolve`], with an explicit baseline.
pub fn resolve_with_defaults(
    args: &[String],
    defaults: CompiledDefaults,
) -> ResolverResult<ResolvedConfig> {
    let mut resolver = Resolver::with_defaults(defaults);
    resolver.scan(args)?;
    let resolved = resolver.finalize()?;
    Ok(resolved.apply_mode_override())
}

/// Accumulated state of one resolution: what the command line explicitly
/// enabled and disabled, the scalar overrides, and the captured command.
///
/// Lives for a single `scan` + `finalize` sequence. Once the command has been
/// captured, further options are ignored; once finalized, `finalize` keeps
/// returning the same configuration.
#[derive(Debug, Clone)]
pub struct Resolver {
    defaults: CompiledDefaults,
    enabled: FeatureSet,
    disabled: FeatureSet,
    /// Bits set by dedicated options, outside the enable/disable accumulators.
    direct: FeatureSet,
    port: Option<String>,
    location: Option<String>,
    preload_file: Option<PathBuf>,
    python_prefixes: Option<String>,
    security: Option<SecurityModel>,
    logging_enabled: bool,
    use_mpi: bool,
    hide_fds: bool,
    command: Vec<String>,
    captured: bool,
    resolved: Option<ResolvedConfig>,
}

impl Resolver {
    /// A resolver over the compiled-in defaults.
    pub fn new() -> Self {
        Self::with_defaults(CompiledDefaults::builtin())
    }

    /// A resolver over an explicit baseline.
    pub fn with_defaults(defaults: CompiledDefaults) -> Self {
        let logging_enabled = defaults.logging_enabled;
        Self {
            defaults,
            enabled: FeatureSet::empty(),
            disabled: FeatureSet::empty(),
            direct: FeatureSet::empty(),
            port: None,
            location: None,
            preload_file: None,
            python_prefixes: None,
            security: None,
            logging_enabled,
            use_mpi: true,
            hide_fds: true,
            command: Vec::new(),
            captured: false,
            resolved: None,
        }
    }

    /// Scan phase: applies every launcher option in order and captures the
    /// job command that follows them.
    pub fn scan(&mut self, args: &[String]) -> ResolverResult<()> {
        if self.captured || self.resolved.is_some() {
            log::debug!("Ignoring {} token(s): the command was already captured.", args.len());
            return Ok(());
        }
        let scanned = scanner::scan_tokens(args)?;
        for option in scanned.options {
            self.apply(option)?;
        }
        self.capture_command(scanned.command);
        Ok(())
    }

    /// Records a single option occurrence.
    pub fn apply(&mut self, option: ScannedOption<'_>) -> ResolverResult<()> {
        let spec = option.spec;
        if self.captured || self.resolved.is_some() {
            log::debug!("Ignoring '--{}': the command was already captured.", spec.name);
            return Ok(());
        }

        match spec.action {
            OptionAction::Feature(feature) if spec.kind == ValueKind::YesNo => {
                let value = require_value(&option)?;
                if registry::parse_switch(spec, value)? {
                    self.enabled.insert(feature);
                } else {
                    self.disabled.insert(feature);
                }
            }
            OptionAction::Feature(feature) => {
                self.enabled.insert(feature);
            }
            OptionAction::Port => self.port = Some(require_value(&option)?.to_string()),
            OptionAction::Location => self.location = Some(require_value(&option)?.to_string()),
            OptionAction::PythonPrefix => {
                self.python_prefixes = Some(require_value(&option)?.to_string());
            }
            OptionAction::Preload => {
                self.preload_file = Some(PathBuf::from(require_value(&option)?));
                self.enabled.insert(Feature::Preload);
            }
            OptionAction::Security(model) => match self.security {
                Some(first) if first != model => {
                    return Err(ResolverError::MultipleSecurityModels {
                        first,
                        second: model,
                    });
                }
                _ => self.security = Some(model),
            },
            OptionAction::DisableLogging => self.logging_enabled = false,
            OptionAction::NoMpi => {
                self.use_mpi = false;
                self.direct.insert(Feature::NoMpi);
            }
            OptionAction::NoHide => {
                self.hide_fds = false;
                self.direct.insert(Feature::NoHide);
            }
        }

        match option.value {
            Some(value) => log::debug!("Accepted --{}={}", spec.name, value),
            None => log::debug!("Accepted --{}", spec.name),
        }
        Ok(())
    }

    /// Positional capture. Only the first capture counts.
    pub fn capture_command<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.captured {
            log::debug!("Command already captured; ignoring further positional tokens.");
            return;
        }
        self.command = tokens.into_iter().map(Into::into).collect();
        self.captured = true;
    }

    /// Finalize phase: applies precedence and exclusivity rules and produces
    /// the resolved configuration. Calling it again returns the first result.
    pub fn finalize(&mut self) -> ResolverResult<ResolvedConfig> {
        if let Some(resolved) = &self.resolved {
            log::debug!("Resolution already finalized; returning the existing configuration.");
            return Ok(resolved.clone());
        }

        if self.command.is_empty() {
            return Err(ResolverError::MissingCommand);
        }

        let conflicts = self.enabled.intersection(self.disabled);
        if !conflicts.is_empty() {
            return Err(ResolverError::ConflictingDirective {
                options: conflicts.to_string(),
            });
        }

        let mut features = self.direct;
        features.insert(self.select_one(FeatureGroup::Network, self.defaults.network)?);
        features.insert(self.select_one(FeatureGroup::Distribution, self.defaults.distribution)?);
        features = features
            .union(self.bundle(FeatureGroup::Relocation, self.defaults.relocation))
            .union(self.bundle(FeatureGroup::Misc, self.defaults.misc));

        let security = match self.security {
            Some(model) => model,
            None => self
                .defaults
                .default_security()
                .ok_or(ResolverError::NoSecurityModel)?,
        };

        let port = match &self.port {
            Some(raw) => parse_port(raw)?,
            None => self.defaults.port,
        };

        let python_prefixes = python_prefix::merge(
            &self.defaults.python_prefixes,
            self.python_prefixes.as_deref(),
        );

        let config = ResolvedConfig {
            features,
            security,
            port,
            location: self
                .location
                .clone()
                .unwrap_or_else(|| self.defaults.location.clone()),
            preload_file: self.preload_file.clone(),
            python_prefixes,
            use_mpi: self.use_mpi,
            hide_fds: self.hide_fds,
            logging_enabled: self.logging_enabled,
            command: self.command.clone(),
            state: ConfigState::Resolved,
        };

        log::debug!(
            "Resolved features [{}], security '{}', port {}, command '{}'.",
            config.features,
            config.security,
            config.port,
            config.command()
        );
        self.resolved = Some(config.clone());
        Ok(config)
    }

    /// Exactly-one group: the explicit choice, or the compiled default.
    fn select_one(&self, group: FeatureGroup, default: Feature) -> ResolverResult<Feature> {
        let chosen = self.enabled.restricted_to(group);
        if chosen.len() > 1 {
            return Err(ResolverError::MultipleSelection {
                group,
                options: chosen.to_string(),
            });
        }
        Ok(chosen.iter().next().unwrap_or(default))
    }

    /// Default-bundle group: (defaults | enabled) - disabled, within the group.
    fn bundle(&self, group: FeatureGroup, defaults: FeatureSet) -> FeatureSet {
        defaults
            .union(self.enabled)
            .difference(self.disabled)
            .restricted_to(group)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

fn require_value<'a>(option: &ScannedOption<'a>) -> ResolverResult<&'a str> {
    option.value.ok_or_else(|| ResolverError::MissingValue {
        option: option.spec.name.to_string(),
    })
}

/// Parses a server port. Only plain decimal digits are accepted; zero and
/// out-of-range values are rejected.
fn parse_port(raw: &str) -> ResolverResult<u16> {
    let digits_only = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
    match raw.parse::<u16>() {
        Ok(port) if digits_only && port != 0 => Ok(port),
        _ => Err(ResolverError::InvalidPort {
            value: raw.to_string(),
        }),
    }
}

// MARK: --- UNIT TESTS ---

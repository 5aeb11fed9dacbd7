// src/cli.rs

use crate::constants::{DEFAULT_LOCATION, DEFAULT_PORT, DEFAULT_PYTHON_PREFIXES};
use crate::core::registry::{self, OptionGroup, OptionSpec, ValueKind};
use crate::models::SecurityModel;
use clap::{ArgAction, Parser};
use colored::Colorize;
use std::ffi::OsString;

/// Width of the option column in the generated help.
const USAGE_COLUMN_WIDTH: usize = 34;

/// Renders the usage column of one option, e.g. `-a, --reloc-aout=yes|no`.
fn usage_column(spec: &OptionSpec) -> String {
    let short = match spec.short {
        Some(key) => format!("-{}, ", key),
        None => "    ".to_string(),
    };
    let value = match spec.kind {
        ValueKind::YesNo => "=yes|no".to_string(),
        ValueKind::Text(placeholder) => format!("={}", placeholder),
        ValueKind::Flag => String::new(),
    };
    format!("{}--{}{}", short, spec.name, value)
}

/// Builds the launcher option reference shown after clap's own help.
///
/// The launcher options are not clap arguments (they are resolved by
/// [`crate::core::resolver`]), so their help is rendered from the registry.
/// Colors are dropped automatically when the output is not a terminal.
pub fn build_options_help() -> String {
    let mut help = format!("{}\n", "Launcher options:".yellow().bold());

    for group in OptionGroup::ORDER {
        let specs: Vec<&OptionSpec> = registry::visible_options()
            .filter(|spec| spec.group == group)
            .collect();
        if specs.is_empty() {
            continue;
        }

        help.push_str(&format!("\n{}\n", group.title().green().bold()));
        for spec in specs {
            let usage = format!("{:<width$}", usage_column(spec), width = USAGE_COLUMN_WIDTH);
            help.push_str(&format!("  {} {}\n", usage.cyan(), spec.help));
        }
    }

    let default_security = SecurityModel::available()
        .first()
        .map(ToString::to_string)
        .unwrap_or_default();
    help.push_str(&format!(
        "\n{}\n  port {}, location {}, python prefixes {}, security {}\n",
        "Compiled defaults:".yellow().bold(),
        DEFAULT_PORT,
        DEFAULT_LOCATION,
        DEFAULT_PYTHON_PREFIXES,
        default_security
    ));
    help.push_str(&format!(
        "\n{}\n",
        "Everything from the first non-option token (or after `--`) is the job command.".dimmed()
    ));
    help
}

/// relaunch: starts a parallel job with its executables, libraries and python
/// modules relocated through node-local distribution servers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "relaunch [OPTIONS...] <COMMAND> [ARGS...]")]
#[command(after_help = build_options_help())]
// `-h` belongs to the launcher (`--no-hide`), so clap only gets `--help`.
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Print help.
    #[arg(long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Launcher options followed by the job command and its arguments.
    /// Passed verbatim to the resolver.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Cli {
    /// Parses the process arguments. See [`Cli::try_parse_launcher_from`].
    pub fn parse_launcher() -> Self {
        Self::try_parse_launcher_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Lets clap serve `--help` and `--version`, then hands the resolver every
    /// argument after the program name exactly as given.
    ///
    /// clap strips a `--` in first position, which would turn
    /// `relaunch -- --pull job` into a launcher option.
    pub fn try_parse_launcher_from<I, T>(raw: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let raw: Vec<OsString> = raw.into_iter().map(Into::into).collect();
        let mut cli = Self::try_parse_from(raw.iter())?;
        // clap already rejected non UTF-8 values, so the conversion is exact.
        cli.args = raw
            .iter()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        Ok(cli)
    }
}

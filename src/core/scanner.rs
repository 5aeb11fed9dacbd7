// src/core/scanner.rs

use crate::constants::END_OF_OPTIONS;
use crate::core::registry::{self, OptionSpec};
use crate::core::resolver::{ResolverError, ResolverResult};

/// One recognized option occurrence and its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedOption<'a> {
    pub spec: &'static OptionSpec,
    pub value: Option<&'a str>,
}

/// The launcher's options, split from the job command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedArgs<'a> {
    /// Options in command-line order.
    pub options: Vec<ScannedOption<'a>>,
    /// The job command and its arguments, verbatim.
    pub command: Vec<&'a str>,
}

/// Splits raw launcher arguments into options and the captured command.
///
/// # Logic:
/// - `--name=value`, `--name value`, `-k value` and `-kvalue` carry values.
///   A value-taking option consumes the next token even if it starts with `-`.
/// - Flag-only short keys can be clustered (`-pm`).
/// - The first token that is not an option starts the command; it and every
///   token after it are captured untouched. `--` ends the options and is dropped.
/// - A lone `-` is a positional token.
pub fn scan_tokens(args: &[String]) -> ResolverResult<ScannedArgs<'_>> {
    let mut options = Vec::new();
    let mut command = Vec::new();
    let mut tokens = args.iter().map(String::as_str);

    while let Some(token) = tokens.next() {
        if token == END_OF_OPTIONS {
            command.extend(tokens.by_ref());
            break;
        }

        if let Some(body) = token.strip_prefix("--") {
            let (name, attached) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };
            let spec = registry::find_long(name).ok_or_else(|| ResolverError::UnknownOption {
                option: format!("--{}", name),
            })?;

            let value = if spec.takes_value() {
                match attached {
                    Some(value) => Some(value),
                    None => Some(tokens.next().ok_or_else(|| missing_value(spec))?),
                }
            } else if attached.is_some() {
                return Err(ResolverError::UnexpectedValue {
                    option: spec.name.to_string(),
                });
            } else {
                None
            };
            options.push(ScannedOption { spec, value });
        } else if let Some(keys) = token.strip_prefix('-').filter(|keys| !keys.is_empty()) {
            for (pos, key) in keys.char_indices() {
                let spec = registry::find_short(key).ok_or_else(|| ResolverError::UnknownOption {
                    option: format!("-{}", key),
                })?;

                if !spec.takes_value() {
                    options.push(ScannedOption { spec, value: None });
                    continue;
                }

                // The rest of the cluster is the value; otherwise the next token is.
                let rest = keys.get(pos + key.len_utf8()..).unwrap_or_default();
                let value = if rest.is_empty() {
                    tokens.next().ok_or_else(|| missing_value(spec))?
                } else {
                    rest
                };
                options.push(ScannedOption {
                    spec,
                    value: Some(value),
                });
                break;
            }
        } else {
            command.push(token);
            command.extend(tokens.by_ref());
            break;
        }
    }

    log::debug!(
        "Scanned {} launcher option(s), {} command token(s).",
        options.len(),
        command.len()
    );
    Ok(ScannedArgs { options, command })
}

fn missing_value(spec: &OptionSpec) -> ResolverError {
    ResolverError::MissingValue {
        option: spec.name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_cli_params(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    fn names_and_values<'a>(scanned: &ScannedArgs<'a>) -> Vec<(&'static str, Option<&'a str>)> {
        scanned
            .options
            .iter()
            .map(|opt| (opt.spec.name, opt.value))
            .collect()
    }

    #[test]
    fn test_long_options_with_attached_and_separate_values() {
        let params = to_cli_params(&["--reloc-aout=no", "--port", "7000", "--pull", "srun", "-n", "4"]);
        let scanned = scan_tokens(&params).unwrap();
        assert_eq!(
            names_and_values(&scanned),
            vec![
                ("reloc-aout", Some("no")),
                ("port", Some("7000")),
                ("pull", None),
            ]
        );
        assert_eq!(scanned.command, vec!["srun", "-n", "4"]);
    }

    #[test]
    fn test_short_options_and_clusters() {
        let params = to_cli_params(&["-pm", "-ano", "-t", "9000", "a.out"]);
        let scanned = scan_tokens(&params).unwrap();
        assert_eq!(
            names_and_values(&scanned),
            vec![
                ("push", None),
                ("no-mpi", None),
                ("reloc-aout", Some("no")),
                ("port", Some("9000")),
            ]
        );
        assert_eq!(scanned.command, vec!["a.out"]);
    }

    #[test]
    fn test_value_may_start_with_dash() {
        let params = to_cli_params(&["--location", "-weird-dir", "job"]);
        let scanned = scan_tokens(&params).unwrap();
        assert_eq!(scanned.options[0].value, Some("-weird-dir"));
        assert_eq!(scanned.command, vec!["job"]);
    }

    #[test]
    fn test_end_of_options_marker_is_dropped() {
        let params = to_cli_params(&["--push", "--", "--reloc-aout=no", "x"]);
        let scanned = scan_tokens(&params).unwrap();
        assert_eq!(scanned.options.len(), 1);
        assert_eq!(scanned.command, vec!["--reloc-aout=no", "x"]);
    }

    #[test]
    fn test_options_after_command_are_not_interpreted() {
        let params = to_cli_params(&["mpirun", "--pull", "--port=0"]);
        let scanned = scan_tokens(&params).unwrap();
        assert!(scanned.options.is_empty());
        assert_eq!(scanned.command, vec!["mpirun", "--pull", "--port=0"]);
    }

    #[test]
    fn test_lone_dash_is_positional() {
        let params = to_cli_params(&["-", "rest"]);
        let scanned = scan_tokens(&params).unwrap();
        assert_eq!(scanned.command, vec!["-", "rest"]);
    }

    #[test]
    fn test_empty_input_yields_empty_capture() {
        let scanned = scan_tokens(&[]).unwrap();
        assert!(scanned.options.is_empty());
        assert!(scanned.command.is_empty());
    }

    #[test]
    fn test_unknown_long_option_is_rejected() {
        let params = to_cli_params(&["--reloc-everything", "job"]);
        let err = scan_tokens(&params).unwrap_err();
        assert!(matches!(err, ResolverError::UnknownOption { ref option } if option == "--reloc-everything"));
    }

    #[test]
    fn test_unknown_short_key_is_rejected() {
        let params = to_cli_params(&["-pQ", "job"]);
        let err = scan_tokens(&params).unwrap_err();
        assert!(matches!(err, ResolverError::UnknownOption { ref option } if option == "-Q"));
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let params = to_cli_params(&["--port"]);
        let err = scan_tokens(&params).unwrap_err();
        assert!(matches!(err, ResolverError::MissingValue { ref option } if option == "port"));

        let params = to_cli_params(&["-t"]);
        assert!(scan_tokens(&params).is_err());
    }

    #[test]
    fn test_value_on_flag_is_rejected() {
        let params = to_cli_params(&["--push=yes", "job"]);
        let err = scan_tokens(&params).unwrap_err();
        assert!(matches!(err, ResolverError::UnexpectedValue { ref option } if option == "push"));
    }
}

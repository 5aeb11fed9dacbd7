// src/bin/relaunch.rs

use anyhow::Result;
use colored::*;
use relaunch::{
    cli::Cli,
    core::{fingerprint::fingerprint, resolver},
    models::ResolvedConfig,
};

/// The main entry point of the `relaunch` front end.
/// It sets up logging, resolves the launch configuration and performs
/// centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse_launcher()) {
        // Every resolution error is fatal: nothing is launched.
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Resolves the command line and reports the configuration handed to the
/// launch and relocation services.
fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let config = resolver::resolve(&cli.args)?;
    let digest = fingerprint(&config)?;
    log::info!(
        "Resolved launch configuration {} for '{}'.",
        digest,
        config.command()
    );

    print_report(&config, &digest);
    Ok(())
}

fn print_report(config: &ResolvedConfig, digest: &str) {
    let row = |label: &str, value: String| println!("  {:<18} {}", label.cyan(), value);
    let yes_no = |flag: bool| (if flag { "yes" } else { "no" }).to_string();

    println!("{}", "Launch configuration".yellow().bold());
    row("features", config.features().to_string());
    row("option word", format!("{:#x}", config.option_word()));
    row("security", config.security_model().to_string());
    row("port", config.port().to_string());
    row("cache root", config.location_root().to_string());
    row(
        "preload",
        config
            .preload_file()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "none".to_string()),
    );
    row("python prefixes", config.python_prefixes());
    row("mpi job", yes_no(config.is_mpi_job()));
    row("hide fds", yes_no(config.hide_fds()));
    row("usage logging", yes_no(config.logging_enabled()));
    row("command", config.app_args().join(" "));
    row("fingerprint", digest.to_string());
}

// build.rs

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Shape of `defaults.toml`.
#[derive(Deserialize)]
struct Defaults {
    port: u16,
    location: String,
    python_prefix: String,
}

fn main() {
    // --- 1. Inform Cargo about rerun triggers ---
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=defaults.toml");
    println!("cargo:rerun-if-env-changed=RELAUNCH_DEFAULT_PORT");
    println!("cargo:rerun-if-env-changed=RELAUNCH_DEFAULT_LOCATION");
    println!("cargo:rerun-if-env-changed=RELAUNCH_PYTHON_PREFIX");

    // --- 2. Load the baseline from defaults.toml ---
    let content =
        fs::read_to_string("defaults.toml").expect("Failed to read defaults file: defaults.toml");
    let mut defaults: Defaults =
        toml::from_str(&content).expect("Failed to parse defaults.toml");

    // --- 3. Apply build-time environment overrides ---
    if let Ok(port) = env::var("RELAUNCH_DEFAULT_PORT") {
        defaults.port = port
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("RELAUNCH_DEFAULT_PORT is not a valid port: '{}'", port));
    }
    if let Ok(location) = env::var("RELAUNCH_DEFAULT_LOCATION") {
        defaults.location = location;
    }
    if let Ok(prefix) = env::var("RELAUNCH_PYTHON_PREFIX") {
        defaults.python_prefix = prefix;
    }

    if defaults.port == 0 {
        panic!("The default port must be non-zero");
    }
    if defaults.location.is_empty() {
        panic!("The default location must not be empty");
    }

    // --- 4. Generate the constants ---
    // `{:?}` yields valid, escaped Rust string literals.
    let code = format!(
        "/// Default TCP port for the distribution servers.\n\
         pub const DEFAULT_PORT: u16 = {};\n\
         /// Default root directory for the node-local file cache.\n\
         pub const DEFAULT_LOCATION: &str = {:?};\n\
         /// Default colon-separated python install prefixes.\n\
         pub const DEFAULT_PYTHON_PREFIXES: &str = {:?};\n",
        defaults.port, defaults.location, defaults.python_prefix
    );

    // --- 5. Write the generated code to the `OUT_DIR` directory ---
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("defaults.rs");
    fs::write(&dest_path, code).unwrap();
}

//! # relaunch
//!
//! Option resolution for a distributed job launcher. The launcher starts a
//! parallel job and configures the relocation/distribution servers that serve
//! its executables, libraries and python modules; this crate turns the
//! launcher's command line, the compiled-in defaults and the compiled-in
//! security models into one immutable [`models::ResolvedConfig`].
//!
//! The usual entry point is [`core::resolver::resolve`].

#[cfg(not(any(
    feature = "security-munge",
    feature = "security-lmon",
    feature = "security-keyfile",
    feature = "security-none"
)))]
compile_error!(
    "No security model available: enable at least one of the `security-munge`, \
     `security-lmon`, `security-keyfile` or `security-none` features."
);

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;

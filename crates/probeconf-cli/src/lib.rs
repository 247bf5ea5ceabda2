//! Command-line front end for probeconf.
//!
//! `main.rs` is the composition root: it parses arguments, loads the
//! layered configuration, sets up logging and wires the host adapters from
//! `probeconf-runtime` into the core [`Configurator`](probeconf_core::Configurator).

#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;

#[cfg(test)]
use tempfile as _;

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;
pub mod presentation;

pub use bootstrap::HostContext;
pub use commands::Commands;
pub use config::load_options;
pub use error::CliError;
pub use parser::{Cli, split_configure_args};

//! Command handlers for the `powledger` binary

pub mod commands;

pub use commands::{cmd_demo, cmd_keygen, cmd_tamper, AppState, CliResult};

//! hostpool: command-line interface
//!
//! Provides the `hostpool` binary for managing the host registry, logging
//! into hosts through proxy chains and copying files to and from them.

pub mod commands;
pub mod output;
pub mod terminal;

//! Command handlers, one module per subcommand.

pub mod apply;
pub mod completions;
pub mod config;
pub mod init;
pub mod provision;

//! Command implementations for the CLI.

pub mod demo;
pub mod init;
pub mod rewrite;

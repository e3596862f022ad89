//! CLI subcommands.

pub mod diagnostics;
pub mod run;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Check connectivity to Docker and etcd, then exit.
    Diagnostics,
}

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod call;
pub mod probe;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Invoke a remote procedure and print its reply.
    Call(CallArgs),
    /// Connect, run the handshake and report session metadata.
    Probe(ProbeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Call(args) => call::run(args, format),
        Command::Probe(args) => probe::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Remote procedure name.
    pub procedure: String,
    /// Positional parameters. Plain values are literals; prefix with
    /// `list:` (comma-separated), `ref:` (server-side reference),
    /// `wp:@FILE` (word-processing lines from a file) or `lit:` to escape
    /// a value that starts with one of these prefixes.
    pub params: Vec<String>,
    /// Broker profile file (JSON).
    #[arg(long, short = 'p', value_name = "FILE", env = "BROKERLINK_PROFILE")]
    pub profile: PathBuf,
    /// Maximum time to wait for a pooled session (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Broker profile file (JSON).
    #[arg(long, short = 'p', value_name = "FILE", env = "BROKERLINK_PROFILE")]
    pub profile: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

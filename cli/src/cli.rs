//! # CLI Interface
//!
//! Defines the command-line argument structure for `fair-plc` using
//! `clap` derive. Supports five subcommands: `generate`, `show`,
//! `update`, `import`, and `list`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FAIR publisher identity tools.
///
/// Manages `did:plc:` identities for software publishers: key
/// generation, registration with the PLC directory, key rotation, and
/// update submission. Private keys stay in a local store; the directory
/// only ever sees signed operations.
#[derive(Parser, Debug)]
#[command(
    name = "fair-plc",
    about = "FAIR publisher identity tools",
    version,
    propagate_version = true
)]
pub struct FairPlcCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the local identity store.
    #[arg(long, short = 's', env = "FAIR_PLC_STORE", default_value = "~/.fair-plc", global = true)]
    pub store: PathBuf,

    /// Base URL of the PLC directory.
    #[arg(long, env = "FAIR_PLC_DIRECTORY", default_value = "https://plc.directory", global = true)]
    pub directory: String,

    /// Default log filter; `RUST_LOG` overrides it when set.
    #[arg(long, default_value = "fair_plc=info,fair_plc_cli=info", global = true)]
    pub log_level: String,
}

/// Top-level subcommands for the `fair-plc` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new identity and register it with the directory.
    Generate(GenerateArgs),
    /// Show a stored identity: keys, expected document, directory state.
    Show(ShowArgs),
    /// Diff local state against the directory and submit an update
    /// operation if they differ.
    Update(UpdateArgs),
    /// Import an existing identity from its encoded private keys.
    Import(ImportArgs),
    /// List the DIDs held in the local store.
    List,
}

/// Arguments for the `generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Base URL of the package repository this identity publishes
    /// through. The directory record points package clients here.
    #[arg(long, env = "FAIR_PLC_PACKAGES_URL")]
    pub packages_url: String,
}

/// Arguments for the `show` subcommand.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// The `did:plc:` identifier to show.
    pub did: String,

    /// Base URL of the package repository.
    #[arg(long, env = "FAIR_PLC_PACKAGES_URL")]
    pub packages_url: String,

    /// Also query the directory for publication status and log tail.
    #[arg(long)]
    pub remote: bool,
}

/// Arguments for the `update` subcommand.
#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// The `did:plc:` identifier to update.
    pub did: String,

    /// Base URL of the package repository.
    #[arg(long, env = "FAIR_PLC_PACKAGES_URL")]
    pub packages_url: String,
}

/// Arguments for the `import` subcommand.
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// The `did:plc:` identifier the keys belong to.
    pub did: String,

    /// Encoded private rotation keys (multibase), authoritative
    /// signer first. Repeat the flag for multiple keys.
    #[arg(long = "rotation-key", required = true)]
    pub rotation_keys: Vec<String>,

    /// Encoded private verification keys (multibase), newest last.
    /// Repeat the flag for multiple keys.
    #[arg(long = "verification-key", required = true)]
    pub verification_keys: Vec<String>,
}

// Copyright (c) 2026 FAIR Package Management. MIT License.
// See LICENSE for details.

//! # FAIR Publisher Identity CLI
//!
//! Entry point for the `fair-plc` binary. Parses CLI arguments,
//! initializes logging, and drives the identity workflows in the
//! `fair-plc` library against a local sled store.
//!
//! The binary supports five subcommands:
//!
//! - `generate` — create an identity and register it with the directory
//! - `show`     — print a stored identity's keys and expected document
//! - `update`   — diff local state against the directory and submit
//! - `import`   — adopt an existing identity from its private keys
//! - `list`     — list DIDs in the local store

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use fair_plc::store::DidStore;
use fair_plc::{Did, DidRecord, Key, PlcConfig, SledStore, UpdateOutcome};

use cli::{Commands, FairPlcCli};

fn main() -> Result<()> {
    let args = FairPlcCli::parse();
    logging::init_logging(&args.log_level);

    let store = open_store(&args.store)?;

    match args.command {
        Commands::Generate(cmd) => generate(&store, &args.directory, cmd),
        Commands::Show(cmd) => show(&store, &args.directory, cmd),
        Commands::Update(cmd) => update(&store, &args.directory, cmd),
        Commands::Import(cmd) => import(&store, cmd),
        Commands::List => list(&store),
    }
}

/// Opens the sled-backed identity store, expanding a leading `~`.
fn open_store(path: &Path) -> Result<SledStore> {
    let path = expand_home(path);
    SledStore::open(&path)
        .with_context(|| format!("failed to open identity store at {}", path.display()))
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

/// Creates a fresh identity, registers it, and prints the result.
fn generate(store: &SledStore, directory: &str, args: cli::GenerateArgs) -> Result<()> {
    let config = PlcConfig::new(&args.packages_url).with_directory(directory);
    tracing::info!(directory = %config.directory_url, "creating identity");
    let did = Did::create(store, &config).context("identity creation failed")?;

    println!("Identity created and registered.");
    println!("  DID              : {}", did.id());
    for key in did.rotation_keys()? {
        println!("  Rotation key     : {}", key.encode_did_key());
    }
    for key in did.verification_keys()? {
        println!("  Verification key : {}", key.encode_did_key());
    }
    Ok(())
}

/// Prints a stored identity's public keys and expected DID document.
fn show(store: &SledStore, directory: &str, args: cli::ShowArgs) -> Result<()> {
    let config = PlcConfig::new(&args.packages_url).with_directory(directory);
    let did = Did::load(store, &args.did, &config)?;

    println!("DID: {}", did.id());
    for key in did.rotation_keys()? {
        println!("  Rotation key     : {}", key.encode_did_key());
    }
    for key in did.verification_keys()? {
        println!("  Verification key : {}", key.encode_did_key());
    }

    if args.remote {
        let status = did.is_published()?;
        println!("Directory status: {status:?}");
        let last = did.fetch_last_op()?;
        println!("Log tail CID: {}", last.cid()?);
    }

    let document = did.expected_document()?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Diffs local state against the directory tail and submits when needed.
fn update(store: &SledStore, directory: &str, args: cli::UpdateArgs) -> Result<()> {
    let config = PlcConfig::new(&args.packages_url).with_directory(directory);
    let did = Did::load(store, &args.did, &config)?;

    tracing::info!(did = %did.id(), "diffing against directory");
    match did.update()? {
        UpdateOutcome::Updated(op) => {
            println!("Update submitted: {}", op.cid()?);
        }
        UpdateOutcome::NoChanges => {
            println!("Directory already matches local state; nothing submitted.");
        }
    }
    Ok(())
}

/// Adopts an existing identity from its encoded private keys.
///
/// Every key must decode to private material before anything is stored;
/// a single bad key aborts the whole import.
fn import(store: &SledStore, args: cli::ImportArgs) -> Result<()> {
    if !args.did.starts_with("did:plc:") {
        bail!("not a did:plc identifier: {}", args.did);
    }
    for encoded in args.rotation_keys.iter().chain(&args.verification_keys) {
        let key = Key::from_private(encoded)
            .with_context(|| format!("invalid key material: {encoded}"))?;
        if !key.is_private() {
            bail!("key decodes to public material only: {encoded}");
        }
    }

    let record = DidRecord {
        id: args.did.clone(),
        rotation_keys: args.rotation_keys,
        verification_keys: args.verification_keys,
    };
    store.put(&record)?;

    println!(
        "Imported {} ({} rotation, {} verification key(s)).",
        record.id,
        record.rotation_keys.len(),
        record.verification_keys.len()
    );
    Ok(())
}

/// Lists every DID in the local store.
fn list(store: &SledStore) -> Result<()> {
    let ids = store.list_ids()?;
    if ids.is_empty() {
        println!("No identities stored.");
        return Ok(());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

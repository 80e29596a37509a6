// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linkmesh linker node.
//!
//! Linkers form the discovery mesh: they accept service registrations,
//! answer client lookups, and keep each other's registries in sync via
//! one-hop gossip.
//!
//! # Usage
//!
//! ```bash
//! # Start the linker listed second in linkers.json
//! linkmesh-linker --id 1
//!
//! # Custom mesh file and probe timeout
//! linkmesh-linker --id 0 --config mesh/linkers.json --probe-timeout 2000
//! ```
//!
//! The `--id` is this linker's index into the mesh file's list; the
//! linker binds that entry's port and peers with every other entry.

use clap::Parser;
use linkmesh::MeshConfig;
use linkmesh_linker::{LinkerConfig, LinkerServer};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Linkmesh linker - service-discovery broker node
#[derive(Parser, Debug)]
#[command(name = "linkmesh-linker")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Index of this linker in the mesh configuration
    #[arg(short, long)]
    id: usize,

    /// Mesh configuration file (JSON list of linker addresses)
    #[arg(short, long, default_value = "linkers.json")]
    config: PathBuf,

    /// Bind address (0.0.0.0 for all interfaces)
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Probe timeout for suspect services in milliseconds
    #[arg(long, default_value = "1000")]
    probe_timeout: u64,

    /// Per-peer bootstrap timeout in milliseconds
    #[arg(long, default_value = "1000")]
    bootstrap_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("loading mesh configuration from {:?}", args.config);
    let mesh = MeshConfig::from_file(&args.config)?;

    let mut config = LinkerConfig::from_mesh(&mesh, args.id)?;
    config.bind_address = args.bind.parse()?;
    config.probe_timeout_ms = args.probe_timeout;
    config.bootstrap_timeout_ms = args.bootstrap_timeout;

    info!(
        "linker {} of {}: port {}, {} peers, probe {}ms",
        args.id,
        mesh.linkers.len(),
        config.port,
        config.peers.len(),
        config.probe_timeout_ms
    );

    let server = LinkerServer::bind(config).await?;

    let handle = server.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown signal received, stopping linker...");
        handle.shutdown().await;
    });

    server.run().await?;

    info!("linker stopped");
    Ok(())
}

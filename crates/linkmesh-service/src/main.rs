// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linkmesh service node.
//!
//! # Usage
//!
//! ```bash
//! # Offer the time service on port 9400
//! linkmesh-service --kind time --port 9400
//!
//! # Offer the sum service with a custom mesh file
//! linkmesh-service --kind sum --port 9401 --config mesh/linkers.json
//! ```
//!
//! An unknown `--kind` fails at argument parsing, before any socket is
//! opened.

use clap::Parser;
use linkmesh::{MeshConfig, ServiceKind};
use linkmesh_service::ServiceNode;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Linkmesh service - registers with a linker and answers requests
#[derive(Parser, Debug)]
#[command(name = "linkmesh-service")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service kind to offer (time, sum or reply)
    #[arg(short, long)]
    kind: ServiceKind,

    /// UDP port to serve on (0 for an ephemeral port)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Mesh configuration file (JSON list of linker addresses)
    #[arg(short, long, default_value = "linkers.json")]
    config: PathBuf,

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
    let linkers = mesh.linker_addrs()?;

    let node = ServiceNode::bind(args.kind, args.port, linkers).await?;
    info!("{} service bound on {}", args.kind, node.local_addr()?);

    node.register().await?;
    node.serve().await?;

    Ok(())
}

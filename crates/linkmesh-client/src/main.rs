// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linkmesh interactive client.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a sum service
//! linkmesh-client --kind sum
//! > 3 4
//! sum: 7
//!
//! # Talk to a time service
//! linkmesh-client --kind time
//! > now
//! epoch millis: 1760000000000
//! ```
//!
//! When a service stops answering, the client reports it to a linker and
//! locates a replacement before continuing.

use clap::Parser;
use linkmesh::{MeshConfig, ServiceKind};
use linkmesh_client::input::{self, Command};
use linkmesh_client::{ClientError, ClientSession};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Linkmesh client - locates a service through the mesh and calls it
#[derive(Parser, Debug)]
#[command(name = "linkmesh-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service kind to use (time, sum or reply)
    #[arg(short, long)]
    kind: ServiceKind,

    /// UDP port to bind (0 for an ephemeral port)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Mesh configuration file (JSON list of linker addresses)
    #[arg(short, long, default_value = "linkers.json")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
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
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mesh = MeshConfig::from_file(&args.config)?;
    let linkers = mesh.linker_addrs()?;

    let session = ClientSession::bind(args.kind, args.port, linkers).await?;

    println!("locating a {} service...", args.kind);
    let mut service = session.locate().await?;
    println!("using {} service at {}", args.kind, service);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("enter a payload, or quit to exit:");

    while let Some(line) = lines.next_line().await? {
        let payload = match input::parse_line(args.kind, &line) {
            Ok(Command::Quit) => {
                println!("bye");
                break;
            }
            Ok(Command::Payload(payload)) => payload,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match session.call(&service, payload).await {
            Ok(response) => println!("{}", input::render_response(args.kind, &response)),
            Err(ClientError::CallTimeout(_)) => {
                warn!("{} stopped answering, reporting it", service);
                println!("service at {} is not answering, finding another...", service);

                if let Err(e) = session.report_down(&service).await {
                    warn!("down report not delivered: {}", e);
                }

                service = session.locate().await?;
                info!("switched to {} service at {}", args.kind, service);
                println!("using {} service at {}", args.kind, service);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

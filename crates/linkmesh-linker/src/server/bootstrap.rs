// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Anti-entropy bootstrap: adopt a peer's registry before serving.
//!
//! A newly started linker knows nothing about running services, but any
//! one live peer is assumed to reflect them accurately. Each peer is
//! asked in peer-list order; the first valid table reply replaces the
//! local registry wholesale (no merging). If every peer stays silent the
//! linker is the first node in the mesh and starts empty.

use super::LinkerServer;
use linkmesh::{Envelope, MessageKind, Role, ServiceTable};
use tokio::time::timeout;
use tracing::{debug, info, warn};

impl LinkerServer {
    /// Poll peers for a registry snapshot. Best-effort: runs before the
    /// receive loop, bounded by one timeout per peer, and never fails the
    /// startup.
    pub(super) async fn bootstrap(&self) {
        if self.peers.is_empty() {
            info!("no peers configured, starting with an empty registry");
            return;
        }

        let request = Envelope::control(MessageKind::RequestTable, Role::Linker).encode();
        let mut buf = vec![0u8; self.config.max_datagram_size];

        for peer in self.peers.iter() {
            debug!("requesting registry table from {}", peer);
            if let Err(e) = self.socket.send_to(&request, peer.to_string()).await {
                warn!("failed to reach {} for bootstrap: {}", peer, e);
                continue;
            }

            let reply = match timeout(
                self.config.bootstrap_timeout(),
                self.socket.recv_from(&mut buf),
            )
            .await
            {
                Err(_) => {
                    debug!("no table from {} within {:?}", peer, self.config.bootstrap_timeout());
                    continue;
                }
                Ok(Err(e)) => {
                    warn!("receive error while waiting for a table: {}", e);
                    continue;
                }
                Ok(Ok((len, from))) => (buf[..len].to_vec(), from),
            };

            let (bytes, from) = reply;
            let table = match Envelope::decode(&bytes) {
                Ok(envelope) if envelope.kind == MessageKind::Table && envelope.role == Role::Linker => {
                    match ServiceTable::decode(&envelope.payload) {
                        Ok(table) => table,
                        Err(e) => {
                            // Malformed table: same as a timeout, ask the
                            // next peer.
                            warn!("malformed table from {}: {}", from, e);
                            continue;
                        }
                    }
                }
                Ok(envelope) => {
                    debug!("ignoring {:?} from {} during bootstrap", envelope.kind, from);
                    continue;
                }
                Err(e) => {
                    warn!("undecodable bootstrap reply from {}: {}", from, e);
                    continue;
                }
            };

            let adopted = table.address_count();
            self.registry.write().await.replace(table);
            info!("adopted registry table from {} ({} addresses)", from, adopted);
            return;
        }

        info!("no peer answered, assuming first linker in the mesh");
    }
}

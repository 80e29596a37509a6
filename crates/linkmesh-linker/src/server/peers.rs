// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The fixed set of peer linkers and gossip fan-out.
//!
//! Gossip has propagation depth exactly one hop: the linker that handled
//! the original mutation fans it out to every peer, and a peer applying a
//! gossiped mutation never re-broadcasts it. In a fully connected mesh
//! that bounds the message count per mutation by the peer count.

use linkmesh::{Envelope, NodeAddr};
use tokio::net::UdpSocket;
use tracing::warn;

/// The other linkers in the mesh, established at construction and
/// immutable thereafter.
#[derive(Debug)]
pub struct PeerSet {
    peers: Vec<NodeAddr>,
}

impl PeerSet {
    /// Build the peer set from the static configuration.
    pub fn new(peers: Vec<NodeAddr>) -> Self {
        Self { peers }
    }

    /// Number of peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether this linker has no peers (single-node mesh).
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Peers in mesh order.
    pub fn iter(&self) -> std::slice::Iter<'_, NodeAddr> {
        self.peers.iter()
    }

    /// Send one envelope to every peer. Returns the number of successful
    /// sends; per-peer failures are logged and skipped, since a missed
    /// gossip is repaired by the next anti-entropy sync.
    pub async fn broadcast(&self, socket: &UdpSocket, envelope: &Envelope) -> usize {
        let bytes = envelope.encode();
        let mut sent = 0;
        for peer in &self.peers {
            match socket.send_to(&bytes, peer.to_string()).await {
                Ok(_) => sent += 1,
                Err(e) => warn!("failed to gossip to {}: {}", peer, e),
            }
        }
        sent
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared helpers for linker integration tests: small meshes on
//! loopback, with timeouts shrunk so probes and bootstraps settle fast.

// Not every test binary uses every helper.
#![allow(dead_code)]

use linkmesh::{Envelope, MessageKind, NodeAddr, Role, ServiceKind};
use linkmesh_linker::{LinkerConfig, LinkerServer};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Linker config for tests: loopback, ephemeral port, short timeouts.
pub fn test_config(peers: Vec<NodeAddr>) -> LinkerConfig {
    LinkerConfig {
        bind_address: "127.0.0.1".parse().unwrap(),
        port: 0,
        peers,
        probe_timeout_ms: 200,
        bootstrap_timeout_ms: 150,
        ..Default::default()
    }
}

/// The NodeAddr a bound test socket is reachable at.
pub fn addr_of(socket: &UdpSocket) -> NodeAddr {
    NodeAddr::from(socket.local_addr().unwrap())
}

/// Spawn `n` fully meshed linkers on loopback and wait until their
/// bootstrap phases are over.
pub async fn spawn_mesh(n: usize) -> Vec<(LinkerServer, NodeAddr)> {
    let mut sockets = Vec::new();
    let mut addrs = Vec::new();
    for _ in 0..n {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        addrs.push(addr_of(&socket));
        sockets.push(socket);
    }

    let mut servers = Vec::new();
    for (i, socket) in sockets.into_iter().enumerate() {
        let peers = addrs
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, addr)| addr.clone())
            .collect();
        let server = LinkerServer::from_socket(test_config(peers), socket).unwrap();
        let runner = server.clone();
        tokio::spawn(async move {
            let _ = runner.run().await;
        });
        servers.push((server, addrs[i].clone()));
    }

    // Worst case every linker walks its whole peer list during bootstrap.
    tokio::time::sleep(Duration::from_millis(200 * n as u64 + 300)).await;
    servers
}

/// Register the socket's address under `kind` with a linker and require
/// the acknowledgment.
pub async fn register_service(socket: &UdpSocket, kind: ServiceKind, linker: &NodeAddr) {
    let hello = Envelope::new(
        MessageKind::RegisterService,
        Role::Service,
        vec![kind.to_wire()],
    )
    .encode();
    socket.send_to(&hello, linker.to_string()).await.unwrap();

    let mut buf = [0u8; 64];
    let (len, _) = timeout(Duration::from_secs(1), socket.recv_from(&mut buf))
        .await
        .expect("linker did not acknowledge the registration")
        .unwrap();
    let envelope = Envelope::decode(&buf[..len]).unwrap();
    assert_eq!(envelope.kind, MessageKind::Ack);
    assert_eq!(envelope.role, Role::Linker);
}

/// Ask a linker for a `kind` address. `None` when the linker stays silent
/// (the on-the-wire shape of a lookup miss).
pub async fn request_service(
    socket: &UdpSocket,
    kind: ServiceKind,
    linker: &NodeAddr,
) -> Option<NodeAddr> {
    let request = Envelope::new(
        MessageKind::RequestService,
        Role::Client,
        vec![kind.to_wire()],
    )
    .encode();
    socket.send_to(&request, linker.to_string()).await.unwrap();

    let mut buf = [0u8; 512];
    match timeout(Duration::from_millis(300), socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => {
            let envelope = Envelope::decode(&buf[..len]).unwrap();
            assert_eq!(envelope.kind, MessageKind::Response);
            Some(NodeAddr::decode(&envelope.payload).unwrap())
        }
        _ => None,
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Active liveness probing of suspect services.
//!
//! Probes run on a transient socket bound to an ephemeral port, so the
//! probe's reply wait never stalls the linker's main receive loop and the
//! suspect's answer cannot be confused with regular traffic.

use linkmesh::{Envelope, MessageKind, NodeAddr, Role};
use std::io;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

/// Ping `suspect` and wait up to `wait` for any sign of life.
///
/// Returns `Ok(true)` when the suspect answered (a PONG, or any datagram -
/// a service that replies at all is alive), `Ok(false)` when the wait
/// elapsed. I/O failures are returned to the caller, which must not treat
/// them as a confirmed death.
pub async fn probe(suspect: &NodeAddr, wait: Duration) -> io::Result<bool> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let ping = Envelope::control(MessageKind::Ping, Role::Linker).encode();
    socket.send_to(&ping, suspect.to_string()).await?;

    let mut buf = [0u8; 256];
    match timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, from))) => {
            match Envelope::decode(&buf[..len]) {
                Ok(envelope) => debug!("probe answered by {} with {:?}", from, envelope.kind),
                Err(_) => debug!("probe answered by {} with an undecodable datagram", from),
            }
            Ok(true)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_times_out_on_silence() {
        // Nothing listens on this socket once it is dropped.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let suspect = NodeAddr::from(silent.local_addr().unwrap());
        drop(silent);

        let alive = probe(&suspect, Duration::from_millis(150)).await.unwrap();
        assert!(!alive);
    }

    #[tokio::test]
    async fn test_probe_detects_pong() {
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let suspect = NodeAddr::from(responder.local_addr().unwrap());

        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            if let Ok((_, from)) = responder.recv_from(&mut buf).await {
                let pong = Envelope::control(MessageKind::Pong, Role::Service).encode();
                let _ = responder.send_to(&pong, from).await;
            }
        });

        let alive = probe(&suspect, Duration::from_millis(500)).await.unwrap();
        assert!(alive);
    }
}

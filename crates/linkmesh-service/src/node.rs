// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service node: registration handshake and the serve loop.

use crate::handler;
use linkmesh::{Backoff, Envelope, MessageKind, NodeAddr, Role, ServiceKind};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Starting timeout for the registration handshake.
const HANDSHAKE_BASE_TIMEOUT: Duration = Duration::from_millis(500);

/// Registration attempts before giving up. Bounded so sustained packet
/// loss surfaces as an error instead of an endless silent loop.
const MAX_REGISTER_ATTEMPTS: usize = 32;

/// Service error types.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no linkers configured")]
    NoLinkers,

    #[error("no linker acknowledged the registration after {0} attempts")]
    RegistrationFailed(usize),
}

/// A service endpoint: one socket, one kind, the static linker list.
#[derive(Debug)]
pub struct ServiceNode {
    socket: UdpSocket,
    kind: ServiceKind,
    linkers: Vec<NodeAddr>,
}

impl ServiceNode {
    /// Bind the service socket. The bound port is the port clients will
    /// reach the service on; registration advertises it implicitly as the
    /// datagram source.
    pub async fn bind(
        kind: ServiceKind,
        port: u16,
        linkers: Vec<NodeAddr>,
    ) -> Result<Self, ServiceError> {
        if linkers.is_empty() {
            return Err(ServiceError::NoLinkers);
        }
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        Ok(Self {
            socket,
            kind,
            linkers,
        })
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }

    /// Register with the mesh: pick a linker at random, announce the
    /// service kind, and wait for an acknowledgment; on timeout escalate
    /// the wait and try another random linker. Returns the linker that
    /// acknowledged.
    pub async fn register(&self) -> Result<NodeAddr, ServiceError> {
        let hello = Envelope::new(
            MessageKind::RegisterService,
            Role::Service,
            vec![self.kind.to_wire()],
        )
        .encode();

        let mut backoff = Backoff::new(HANDSHAKE_BASE_TIMEOUT);
        let mut buf = [0u8; 256];

        for attempt in 1..=MAX_REGISTER_ATTEMPTS {
            let linker = &self.linkers[fastrand::usize(..self.linkers.len())];
            debug!(
                "registering {} with {} (attempt {}, timeout {:?})",
                self.kind,
                linker,
                attempt,
                backoff.timeout()
            );
            self.socket.send_to(&hello, linker.to_string()).await?;

            match timeout(backoff.timeout(), self.socket.recv_from(&mut buf)).await {
                Ok(Ok((len, from))) => match Envelope::decode(&buf[..len]) {
                    Ok(envelope)
                        if envelope.kind == MessageKind::Ack && envelope.role == Role::Linker =>
                    {
                        info!("registered {} service with {}", self.kind, from);
                        return Ok(linker.clone());
                    }
                    Ok(envelope) => {
                        debug!("ignoring {:?} during handshake", envelope.kind);
                        backoff.escalate();
                    }
                    Err(e) => {
                        warn!("corrupt handshake reply from {}: {}", from, e);
                        backoff.escalate();
                    }
                },
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    debug!("no ack from {} within {:?}", linker, backoff.timeout());
                    backoff.escalate();
                }
            }
        }

        Err(ServiceError::RegistrationFailed(MAX_REGISTER_ATTEMPTS))
    }

    /// Answer requests and pings until the socket fails fatally.
    pub async fn serve(&self) -> Result<(), ServiceError> {
        info!("{} service listening on {}", self.kind, self.socket.local_addr()?);
        let mut buf = vec![0u8; 2048 + 16];

        loop {
            let (len, src) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    warn!("receive error: {}", e);
                    continue;
                }
            };

            let envelope = match Envelope::decode(&buf[..len]) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!("dropping undecodable datagram from {}: {}", src, e);
                    continue;
                }
            };

            match (envelope.kind, envelope.role) {
                (MessageKind::Request, Role::Client) => {
                    let response = handler::respond(self.kind, &envelope.payload);
                    debug!("answering {} request from {}", self.kind, src);
                    self.send(
                        &Envelope::new(MessageKind::Response, Role::Service, response),
                        src,
                    )
                    .await;
                }
                (MessageKind::Ping, _) => {
                    debug!("ping from {}", src);
                    self.send(&Envelope::control(MessageKind::Pong, Role::Service), src)
                        .await;
                }
                (kind, role) => {
                    debug!("ignoring {:?} from {} with role {:?}", kind, src, role);
                }
            }
        }
    }

    async fn send(&self, envelope: &Envelope, dest: std::net::SocketAddr) {
        if let Err(e) = self.socket.send_to(&envelope.encode(), dest).await {
            warn!("failed to send {:?} to {}: {}", envelope.kind, dest, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_requires_linkers() {
        let err = ServiceNode::bind(ServiceKind::Time, 0, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoLinkers));
    }

    #[tokio::test]
    async fn test_register_acknowledged_by_fake_linker() {
        let linker_socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let linker_addr = NodeAddr::from(linker_socket.local_addr().unwrap());

        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (len, from) = linker_socket.recv_from(&mut buf).await.unwrap();
            let envelope = Envelope::decode(&buf[..len]).unwrap();
            assert_eq!(envelope.kind, MessageKind::RegisterService);
            assert_eq!(envelope.role, Role::Service);
            assert_eq!(envelope.payload, vec![ServiceKind::Sum.to_wire()]);

            let ack = Envelope::control(MessageKind::Ack, Role::Linker).encode();
            linker_socket.send_to(&ack, from).await.unwrap();
        });

        let node = ServiceNode::bind(ServiceKind::Sum, 0, vec![linker_addr.clone()])
            .await
            .unwrap();
        let acked_by = node.register().await.unwrap();
        assert_eq!(acked_by, linker_addr);
    }

    #[tokio::test]
    async fn test_serve_answers_request_and_ping() {
        let node = ServiceNode::bind(
            ServiceKind::Sum,
            0,
            vec![NodeAddr::new("127.0.0.1", 1)],
        )
        .await
        .unwrap();
        let service_addr = ("127.0.0.1", node.local_addr().unwrap().port());
        tokio::spawn(async move {
            let _ = node.serve().await;
        });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let request = Envelope::new(MessageKind::Request, Role::Client, vec![20, 22]).encode();
        client.send_to(&request, service_addr).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        let response = Envelope::decode(&buf[..len]).unwrap();
        assert_eq!(response.kind, MessageKind::Response);
        assert_eq!(response.payload, vec![42]);

        let ping = Envelope::control(MessageKind::Ping, Role::Linker).encode();
        client.send_to(&ping, service_addr).await.unwrap();
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        let pong = Envelope::decode(&buf[..len]).unwrap();
        assert_eq!(pong.kind, MessageKind::Pong);
        assert_eq!(pong.role, Role::Service);
    }
}

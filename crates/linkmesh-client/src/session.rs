// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client session: locate a service, call it, report it when it dies.

use linkmesh::{Backoff, Envelope, MessageKind, NodeAddr, Role, ServiceKind};
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Starting timeout for linker round-trips (locate, report).
const LINKER_BASE_TIMEOUT: Duration = Duration::from_millis(500);

/// Wait for a service's answer to an application-level request.
const CALL_TIMEOUT: Duration = Duration::from_millis(500);

/// Attempts against linkers before giving up on an operation.
const MAX_LINKER_ATTEMPTS: usize = 32;

/// Client error types.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no linkers configured")]
    NoLinkers,

    #[error("no linker produced a {0} service address after {1} attempts")]
    NoService(ServiceKind, usize),

    #[error("service did not answer within {0:?}")]
    CallTimeout(Duration),

    #[error("no linker acknowledged the down report after {0} attempts")]
    ReportFailed(usize),
}

/// A client endpoint: one socket, the wanted kind, the static linker
/// list.
#[derive(Debug)]
pub struct ClientSession {
    socket: UdpSocket,
    kind: ServiceKind,
    linkers: Vec<NodeAddr>,
    call_timeout: Duration,
}

impl ClientSession {
    /// Bind the client socket.
    pub async fn bind(
        kind: ServiceKind,
        port: u16,
        linkers: Vec<NodeAddr>,
    ) -> Result<Self, ClientError> {
        if linkers.is_empty() {
            return Err(ClientError::NoLinkers);
        }
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        Ok(Self {
            socket,
            kind,
            linkers,
            call_timeout: CALL_TIMEOUT,
        })
    }

    fn random_linker(&self) -> &NodeAddr {
        &self.linkers[fastrand::usize(..self.linkers.len())]
    }

    /// Ask the mesh for an address offering the wanted kind. Each attempt
    /// targets a fresh random linker; a linker with no candidate stays
    /// silent, which lands here as a timeout and moves on.
    pub async fn locate(&self) -> Result<NodeAddr, ClientError> {
        let request = Envelope::new(
            MessageKind::RequestService,
            Role::Client,
            vec![self.kind.to_wire()],
        )
        .encode();

        let mut backoff = Backoff::new(LINKER_BASE_TIMEOUT);
        let mut buf = [0u8; 512];

        for attempt in 1..=MAX_LINKER_ATTEMPTS {
            let linker = self.random_linker();
            debug!(
                "asking {} for a {} service (attempt {})",
                linker, self.kind, attempt
            );
            self.socket.send_to(&request, linker.to_string()).await?;

            match timeout(backoff.timeout(), self.socket.recv_from(&mut buf)).await {
                Ok(Ok((len, from))) => match Envelope::decode(&buf[..len]) {
                    Ok(envelope) if envelope.kind == MessageKind::Response => {
                        match NodeAddr::decode(&envelope.payload) {
                            Ok(addr) => {
                                info!("{} service located at {} (via {})", self.kind, addr, from);
                                return Ok(addr);
                            }
                            Err(e) => {
                                warn!("corrupt service address from {}: {}", from, e);
                                backoff.escalate();
                            }
                        }
                    }
                    Ok(envelope) => {
                        debug!("ignoring {:?} while locating", envelope.kind);
                        backoff.escalate();
                    }
                    Err(e) => {
                        warn!("corrupt reply from {}: {}", from, e);
                        backoff.escalate();
                    }
                },
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    debug!("no answer from {} within {:?}", linker, backoff.timeout());
                    backoff.escalate();
                }
            }
        }

        Err(ClientError::NoService(self.kind, MAX_LINKER_ATTEMPTS))
    }

    /// Send an application-level request to a service and wait for its
    /// response. Datagrams that are not the awaited response are skipped
    /// until the deadline.
    pub async fn call(&self, service: &NodeAddr, payload: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let request = Envelope::new(MessageKind::Request, Role::Client, payload).encode();
        self.socket.send_to(&request, service.to_string()).await?;

        let deadline = Instant::now() + self.call_timeout;
        let mut buf = vec![0u8; 2048 + 16];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ClientError::CallTimeout(self.call_timeout));
            }

            match timeout(remaining, self.socket.recv_from(&mut buf)).await {
                Ok(Ok((len, from))) => match Envelope::decode(&buf[..len]) {
                    Ok(envelope) if envelope.kind == MessageKind::Response => {
                        return Ok(envelope.payload);
                    }
                    Ok(envelope) => debug!("ignoring {:?} from {} during a call", envelope.kind, from),
                    Err(e) => warn!("corrupt datagram from {} during a call: {}", from, e),
                },
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(ClientError::CallTimeout(self.call_timeout)),
            }
        }
    }

    /// Report a silent service to the mesh. Retries random linkers until
    /// one acknowledges; the linker probes before evicting, so a false
    /// alarm costs nothing.
    pub async fn report_down(&self, service: &NodeAddr) -> Result<(), ClientError> {
        let report = Envelope::new(
            MessageKind::ServiceDown,
            Role::Client,
            service.encode(),
        )
        .encode();

        let mut backoff = Backoff::new(LINKER_BASE_TIMEOUT);
        let mut buf = [0u8; 512];

        for attempt in 1..=MAX_LINKER_ATTEMPTS {
            let linker = self.random_linker();
            debug!(
                "reporting {} down to {} (attempt {})",
                service, linker, attempt
            );
            self.socket.send_to(&report, linker.to_string()).await?;

            match timeout(backoff.timeout(), self.socket.recv_from(&mut buf)).await {
                Ok(Ok((len, from))) => match Envelope::decode(&buf[..len]) {
                    Ok(envelope)
                        if envelope.kind == MessageKind::Ack && envelope.role == Role::Linker =>
                    {
                        info!("down report for {} acknowledged by {}", service, from);
                        return Ok(());
                    }
                    Ok(envelope) => {
                        debug!("ignoring {:?} while reporting", envelope.kind);
                        backoff.escalate();
                    }
                    Err(e) => {
                        warn!("corrupt reply from {}: {}", from, e);
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

        Err(ClientError::ReportFailed(MAX_LINKER_ATTEMPTS))
    }
}

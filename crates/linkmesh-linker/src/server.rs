// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linker core implementation: the reactive protocol engine.

use crate::config::LinkerConfig;
use linkmesh::config::ConfigError;
use linkmesh::wire::DecodeError;
use linkmesh::{Envelope, MessageKind, NodeAddr, Role, ServiceKind, ServiceTable};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, error, info, warn};

mod bootstrap;
pub mod peers;
pub mod probe;
pub mod registry;

pub use peers::PeerSet;
pub use registry::ServiceRegistry;

/// A linker node: one bound socket, one registry, a fixed peer set.
///
/// The linker has no state machine beyond "serving"; it is a reactive
/// dispatcher over (message kind, sender role). All registry access goes
/// through one `RwLock`, serializing mutations against concurrent probe
/// tasks and snapshot reads.
#[derive(Clone)]
pub struct LinkerServer {
    config: Arc<LinkerConfig>,
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    peers: Arc<PeerSet>,
    registry: Arc<RwLock<ServiceRegistry>>,
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
}

impl LinkerServer {
    /// Bind the linker's socket per the configuration.
    pub async fn bind(config: LinkerConfig) -> Result<Self, LinkerError> {
        let socket = UdpSocket::bind((config.bind_address, config.port)).await?;
        Self::from_socket(config, socket)
    }

    /// Build a linker on an already-bound socket.
    pub fn from_socket(config: LinkerConfig, socket: UdpSocket) -> Result<Self, LinkerError> {
        config.validate()?;
        let local_addr = socket.local_addr()?;
        let peers = PeerSet::new(config.peers.clone());
        Ok(Self {
            config: Arc::new(config),
            socket: Arc::new(socket),
            local_addr,
            peers: Arc::new(peers),
            registry: Arc::new(RwLock::new(ServiceRegistry::new())),
            shutdown: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the linker: anti-entropy bootstrap, then the receive loop.
    /// Returns after [`shutdown`](Self::shutdown) is signalled.
    pub async fn run(&self) -> Result<(), LinkerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(LinkerError::AlreadyRunning);
        }

        self.bootstrap().await;

        info!(
            "linker serving on {} ({} peers)",
            self.local_addr,
            self.peers.len()
        );

        let mut buf = vec![0u8; self.config.max_datagram_size];
        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => match result {
                    Ok((len, src)) => self.handle_datagram(&buf[..len], src).await,
                    // Transient (e.g. ICMP-induced) receive errors must not
                    // take the linker down.
                    Err(e) => warn!("receive error: {}", e),
                },
                _ = self.shutdown.notified() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Signal the linker to stop serving.
    pub async fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    /// Whether the receive loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Total number of registered service addresses.
    pub async fn service_count(&self) -> usize {
        self.registry.read().await.address_count()
    }

    /// A copy of the current registry table.
    pub async fn table(&self) -> ServiceTable {
        self.registry.read().await.snapshot()
    }

    /// Dispatch one inbound datagram.
    async fn handle_datagram(&self, buf: &[u8], src: SocketAddr) {
        let envelope = match Envelope::decode(buf) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping undecodable datagram from {}: {}", src, e);
                return;
            }
        };

        debug!("{:?} from {} ({:?})", envelope.kind, src, envelope.role);

        match (envelope.kind, envelope.role) {
            (MessageKind::RegisterService, Role::Service) => {
                self.handle_register(&envelope, src).await;
            }
            (MessageKind::RegisterService, Role::Linker) => {
                self.handle_gossiped_register(&envelope, src).await;
            }
            (MessageKind::RequestService, Role::Client) => {
                self.handle_request_service(&envelope, src).await;
            }
            (MessageKind::ServiceDown, Role::Client) => {
                self.handle_service_down(&envelope, src).await;
            }
            (MessageKind::RemoveService, Role::Linker) => {
                self.handle_gossiped_remove(&envelope, src).await;
            }
            (MessageKind::RequestTable, Role::Linker) => {
                self.handle_request_table(src).await;
            }
            (kind, role) => {
                debug!("ignoring {:?} from {} with role {:?}", kind, src, role);
            }
        }
    }

    /// REGISTER_SERVICE from a service: the registered endpoint is the
    /// datagram's source address. Ack the service, then gossip
    /// `[kind, address]` to every peer.
    async fn handle_register(&self, envelope: &Envelope, src: SocketAddr) {
        let kind = match service_kind_payload(&envelope.payload) {
            Ok(kind) => kind,
            Err(e) => {
                warn!("dropping malformed registration from {}: {}", src, e);
                return;
            }
        };

        let addr = NodeAddr::from(src);
        let fresh = self.registry.write().await.register(kind, addr.clone());
        if fresh {
            info!("registered {} service at {}", kind, addr);
        } else {
            debug!("{} service at {} re-registered", kind, addr);
        }

        self.send(&Envelope::control(MessageKind::Ack, Role::Linker), src)
            .await;

        let mut payload = Vec::with_capacity(1 + addr.encoded_len());
        payload.push(kind.to_wire());
        addr.encode_into(&mut payload);
        let gossip = Envelope::new(MessageKind::RegisterService, Role::Linker, payload);
        let sent = self.peers.broadcast(&self.socket, &gossip).await;
        debug!("gossiped {} registration to {} peers", kind, sent);
    }

    /// REGISTER_SERVICE re-delivered by a peer linker: the endpoint is
    /// embedded in the payload. Applied locally, never re-gossiped -
    /// propagation depth is exactly one hop.
    async fn handle_gossiped_register(&self, envelope: &Envelope, src: SocketAddr) {
        let (kind, addr) = match registration_payload(&envelope.payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("dropping malformed gossip from {}: {}", src, e);
                return;
            }
        };

        if self.registry.write().await.register(kind, addr.clone()) {
            info!("registered {} service at {} (gossip from {})", kind, addr, src);
        }
    }

    /// REQUEST_SERVICE from a client: answer with one address chosen
    /// uniformly at random, or stay silent when none is registered - the
    /// client's timeout-and-retry handles the miss.
    async fn handle_request_service(&self, envelope: &Envelope, src: SocketAddr) {
        let kind = match service_kind_payload(&envelope.payload) {
            Ok(kind) => kind,
            Err(e) => {
                warn!("dropping malformed service request from {}: {}", src, e);
                return;
            }
        };

        match self.registry.read().await.lookup(kind) {
            Some(addr) => {
                debug!("answering {} lookup from {} with {}", kind, src, addr);
                self.send(
                    &Envelope::new(MessageKind::Response, Role::Linker, addr.encode()),
                    src,
                )
                .await;
            }
            None => {
                debug!("no {} service available for {}", kind, src);
            }
        }
    }

    /// SERVICE_DOWN from a client: ack right away so the client's retry
    /// timing is decoupled from probe latency, then verify the report on a
    /// spawned task before evicting.
    async fn handle_service_down(&self, envelope: &Envelope, src: SocketAddr) {
        self.send(&Envelope::control(MessageKind::Ack, Role::Linker), src)
            .await;

        let suspect = match NodeAddr::decode(&envelope.payload) {
            Ok(addr) => addr,
            Err(e) => {
                warn!("dropping malformed down report from {}: {}", src, e);
                return;
            }
        };

        info!("{} reported {} down, probing", src, suspect);
        let server = self.clone();
        tokio::spawn(async move {
            server.probe_and_evict(suspect).await;
        });
    }

    /// Probe a suspect; on confirmed death evict it locally and gossip the
    /// removal. A suspect that answers in time is left untouched.
    async fn probe_and_evict(&self, suspect: NodeAddr) {
        match probe::probe(&suspect, self.config.probe_timeout()).await {
            Ok(true) => {
                info!("{} answered its probe, keeping it registered", suspect);
            }
            Ok(false) => {
                let removed = self.registry.write().await.remove(&suspect);
                if removed {
                    info!("{} confirmed down, evicted", suspect);
                } else {
                    debug!("{} confirmed down but was not registered here", suspect);
                }

                let gossip = Envelope::new(
                    MessageKind::RemoveService,
                    Role::Linker,
                    suspect.encode(),
                );
                let sent = self.peers.broadcast(&self.socket, &gossip).await;
                debug!("gossiped eviction of {} to {} peers", suspect, sent);
            }
            Err(e) => {
                // Without a completed probe there is no confirmed death;
                // leave the registry alone.
                warn!("probe of {} failed: {}", suspect, e);
            }
        }
    }

    /// REMOVE_SERVICE gossiped by a peer: apply locally, never re-gossip.
    async fn handle_gossiped_remove(&self, envelope: &Envelope, src: SocketAddr) {
        let addr = match NodeAddr::decode(&envelope.payload) {
            Ok(addr) => addr,
            Err(e) => {
                warn!("dropping malformed removal gossip from {}: {}", src, e);
                return;
            }
        };

        if self.registry.write().await.remove(&addr) {
            info!("evicted {} (gossip from {})", addr, src);
        }
    }

    /// REQUEST_TABLE from a bootstrapping peer: answer with a full
    /// registry snapshot.
    async fn handle_request_table(&self, src: SocketAddr) {
        let table = self.registry.read().await.snapshot();
        debug!(
            "sending registry table to {} ({} addresses)",
            src,
            table.address_count()
        );
        self.send(
            &Envelope::new(MessageKind::Table, Role::Linker, table.encode()),
            src,
        )
        .await;
    }

    /// Fire one envelope at a destination; send failures are logged, not
    /// propagated - the requester's retry covers the loss.
    async fn send(&self, envelope: &Envelope, dest: SocketAddr) {
        if let Err(e) = self.socket.send_to(&envelope.encode(), dest).await {
            error!("failed to send {:?} to {}: {}", envelope.kind, dest, e);
        }
    }
}

/// Parse a payload that must be exactly one service-kind byte.
fn service_kind_payload(payload: &[u8]) -> Result<ServiceKind, DecodeError> {
    match payload {
        [] => Err(DecodeError::Truncated { need: 1, have: 0 }),
        [byte] => ServiceKind::from_wire(*byte).ok_or(DecodeError::UnknownServiceKind(*byte)),
        longer => Err(DecodeError::TrailingBytes(longer.len() - 1)),
    }
}

/// Parse a gossiped registration payload: `[kind, address]`.
fn registration_payload(payload: &[u8]) -> Result<(ServiceKind, NodeAddr), DecodeError> {
    let (kind_byte, rest) = payload
        .split_first()
        .ok_or(DecodeError::Truncated { need: 1, have: 0 })?;
    let kind =
        ServiceKind::from_wire(*kind_byte).ok_or(DecodeError::UnknownServiceKind(*kind_byte))?;
    let addr = NodeAddr::decode(rest)?;
    Ok((kind, addr))
}

/// Linker error types.
#[derive(Debug, Error)]
pub enum LinkerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("linker already running")]
    AlreadyRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

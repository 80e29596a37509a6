// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire envelope encoding/decoding.
//!
//! One envelope per datagram; the datagram boundary is the only framing.
//!
//! Wire layout:
//! ```text
//! +-------------+---------+------+------+----------------+---------+
//! | magic (2B)  | version | kind | role | payload len BE | payload |
//! | 0x4C 0x4D   | 0x01    | 1B   | 1B   | 2B             | 0..2048 |
//! +-------------+---------+------+------+----------------+---------+
//! ```
//!
//! Decoding never panics: truncated, corrupted, or foreign buffers produce
//! a [`DecodeError`] the caller is expected to log before resuming its
//! receive loop.

use thiserror::Error;

/// Envelope magic, "LM" big-endian.
pub const MAGIC: u16 = 0x4C4D;

/// Wire format version.
pub const VERSION: u8 = 0x01;

/// Fixed header size in bytes.
pub const HEADER_LEN: usize = 7;

/// Upper bound on a payload carried by one envelope.
pub const MAX_PAYLOAD: usize = 2048;

/// The closed set of message kinds exchanged in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// A service advertises itself (direct from a service, or gossiped
    /// between linkers - the sender role tells them apart).
    RegisterService = 0,
    /// A client asks a linker for an address offering a service kind.
    RequestService = 1,
    /// An application-level request from a client to a service.
    Request = 2,
    /// Bare acknowledgment.
    Ack = 3,
    /// Reply carrying a payload (a service address from a linker, or an
    /// application-level answer from a service).
    Response = 4,
    /// A client reports a suspect service address to a linker.
    ServiceDown = 5,
    /// Gossiped eviction of a confirmed-dead address.
    RemoveService = 6,
    /// Liveness probe.
    Ping = 7,
    /// Liveness probe answer.
    Pong = 8,
    /// A linker asks a peer for its full registry table.
    RequestTable = 9,
    /// Full registry table snapshot.
    Table = 10,
}

impl MessageKind {
    /// Map a wire byte back to a kind.
    pub fn from_wire(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::RegisterService,
            1 => Self::RequestService,
            2 => Self::Request,
            3 => Self::Ack,
            4 => Self::Response,
            5 => Self::ServiceDown,
            6 => Self::RemoveService,
            7 => Self::Ping,
            8 => Self::Pong,
            9 => Self::RequestTable,
            10 => Self::Table,
            _ => return None,
        })
    }

    /// The byte this kind is encoded as.
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Sender role carried in every envelope.
///
/// A linker uses it to tell an original registration (role `Service`)
/// apart from a gossiped re-delivery (role `Linker`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    Client = 0,
    Linker = 1,
    Service = 2,
}

impl Role {
    /// Map a wire byte back to a role.
    pub fn from_wire(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Client,
            1 => Self::Linker,
            2 => Self::Service,
            _ => return None,
        })
    }

    /// The byte this role is encoded as.
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Decode failure. Always recoverable: log, drop the datagram, continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer too short: {have} bytes, need {need}")]
    Truncated { need: usize, have: usize },

    #[error("bad magic {0:#06x}")]
    BadMagic(u16),

    #[error("unsupported wire version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),

    #[error("unknown sender role {0:#04x}")]
    UnknownRole(u8),

    #[error("unknown service kind {0:#04x}")]
    UnknownServiceKind(u8),

    #[error("declared payload length {declared} but {actual} bytes follow the header")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("payload of {0} bytes exceeds the wire bound")]
    PayloadTooLarge(usize),

    #[error("host bytes are not valid UTF-8")]
    BadHost,

    #[error("{0} trailing bytes after a complete value")]
    TrailingBytes(usize),
}

/// The only unit ever placed on the wire.
///
/// Control messages (ACK, PING, PONG, REQUEST_TABLE) carry an empty
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: MessageKind,
    pub role: Role,
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Build an envelope with a payload.
    pub fn new(kind: MessageKind, role: Role, payload: Vec<u8>) -> Self {
        Self {
            kind,
            role,
            payload,
        }
    }

    /// Build a payload-less control envelope.
    pub fn control(kind: MessageKind, role: Role) -> Self {
        Self::new(kind, role, Vec::new())
    }

    /// Serialize to the wire form. Deterministic: the same envelope always
    /// produces the same bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.push(VERSION);
        out.push(self.kind.to_wire());
        out.push(self.role.to_wire());
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse one datagram. The buffer must hold exactly one envelope;
    /// trailing bytes are rejected via the declared payload length.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_LEN {
            return Err(DecodeError::Truncated {
                need: HEADER_LEN,
                have: buf.len(),
            });
        }

        let magic = u16::from_be_bytes([buf[0], buf[1]]);
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }

        if buf[2] != VERSION {
            return Err(DecodeError::UnsupportedVersion(buf[2]));
        }

        let kind = MessageKind::from_wire(buf[3]).ok_or(DecodeError::UnknownKind(buf[3]))?;
        let role = Role::from_wire(buf[4]).ok_or(DecodeError::UnknownRole(buf[4]))?;

        let declared = u16::from_be_bytes([buf[5], buf[6]]) as usize;
        if declared > MAX_PAYLOAD {
            return Err(DecodeError::PayloadTooLarge(declared));
        }

        let actual = buf.len() - HEADER_LEN;
        if declared != actual {
            return Err(DecodeError::LengthMismatch { declared, actual });
        }

        Ok(Self {
            kind,
            role,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node addresses: the (host, port) pair identifying any mesh participant.

use crate::wire::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// A network endpoint identified by host and port.
///
/// Immutable once constructed; equality, hashing, and ordering are by
/// (host, port). Used as the set element identifying a live service or
/// linker endpoint. Hosts are bounded by the 255-byte DNS name limit,
/// which the one-byte wire length prefix relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddr {
    pub host: String,
    pub port: u16,
}

impl NodeAddr {
    /// Build an address from its parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Size of the wire form: port (2) + host length (1) + host bytes.
    pub fn encoded_len(&self) -> usize {
        3 + self.host.len()
    }

    /// Append the wire form: `port: u16 BE`, `host_len: u8`, host UTF-8.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.port.to_be_bytes());
        out.push(self.host.len() as u8);
        out.extend_from_slice(self.host.as_bytes());
    }

    /// The wire form as a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Decode one address from the front of `buf`, returning the address
    /// and the number of bytes consumed.
    pub fn decode_from(buf: &[u8]) -> Result<(Self, usize), DecodeError> {
        if buf.len() < 3 {
            return Err(DecodeError::Truncated {
                need: 3,
                have: buf.len(),
            });
        }
        let port = u16::from_be_bytes([buf[0], buf[1]]);
        let host_len = buf[2] as usize;
        let total = 3 + host_len;
        if buf.len() < total {
            return Err(DecodeError::Truncated {
                need: total,
                have: buf.len(),
            });
        }
        let host = std::str::from_utf8(&buf[3..total]).map_err(|_| DecodeError::BadHost)?;
        Ok((Self::new(host, port), total))
    }

    /// Decode a buffer that must contain exactly one address.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let (addr, used) = Self::decode_from(buf)?;
        if used != buf.len() {
            return Err(DecodeError::TrailingBytes(buf.len() - used));
        }
        Ok(addr)
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<SocketAddr> for NodeAddr {
    fn from(sa: SocketAddr) -> Self {
        Self::new(sa.ip().to_string(), sa.port())
    }
}

/// Failure to parse a `host:port` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddrParseError {
    #[error("'{0}' is not of the form host:port")]
    MissingPort(String),

    #[error("invalid port in '{0}'")]
    BadPort(String),

    #[error("empty host in '{0}'")]
    EmptyHost(String),

    #[error("host in '{0}' exceeds 255 bytes")]
    HostTooLong(String),
}

impl FromStr for NodeAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AddrParseError::MissingPort(s.to_string()))?;
        if host.is_empty() {
            return Err(AddrParseError::EmptyHost(s.to_string()));
        }
        if host.len() > 255 {
            return Err(AddrParseError::HostTooLong(s.to_string()));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| AddrParseError::BadPort(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

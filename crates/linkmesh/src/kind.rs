// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service kinds offered and requested in the mesh.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of service categories.
///
/// The numeric mapping is part of the wire contract: every participant
/// embeds a kind as a one-byte payload prefix and all of them must agree
/// on the numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ServiceKind {
    /// Returns the current time as an 8-byte big-endian epoch-millisecond
    /// timestamp. Empty request payload.
    Time = 0,
    /// Sums two byte operands; 2-byte request payload, 1-byte reply.
    Sum = 1,
    /// Echoes a UTF-8 string payload.
    Reply = 2,
}

impl ServiceKind {
    /// Every kind, in wire order.
    pub const ALL: [ServiceKind; 3] = [Self::Time, Self::Sum, Self::Reply];

    /// Map a wire byte back to a kind.
    pub fn from_wire(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Time,
            1 => Self::Sum,
            2 => Self::Reply,
            _ => return None,
        })
    }

    /// The byte this kind is encoded as.
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Time => "time",
            Self::Sum => "sum",
            Self::Reply => "reply",
        };
        f.write_str(name)
    }
}

/// Unknown service kind named on a command line or in configuration.
///
/// Surfaced before any socket is opened; requesting a kind that does not
/// exist is a misconfiguration, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown service kind '{0}' (expected time, sum or reply)")]
pub struct ParseServiceKindError(pub String);

impl FromStr for ServiceKind {
    type Err = ParseServiceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "sum" => Ok(Self::Sum),
            "reply" => Ok(Self::Reply),
            _ => Err(ParseServiceKindError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_numbering_is_fixed() {
        assert_eq!(ServiceKind::Time.to_wire(), 0);
        assert_eq!(ServiceKind::Sum.to_wire(), 1);
        assert_eq!(ServiceKind::Reply.to_wire(), 2);
    }

    #[test]
    fn test_wire_roundtrip() {
        for kind in ServiceKind::ALL {
            assert_eq!(ServiceKind::from_wire(kind.to_wire()), Some(kind));
        }
        assert_eq!(ServiceKind::from_wire(3), None);
        assert_eq!(ServiceKind::from_wire(0xff), None);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("time".parse::<ServiceKind>().unwrap(), ServiceKind::Time);
        assert_eq!("SUM".parse::<ServiceKind>().unwrap(), ServiceKind::Sum);
        assert_eq!("Reply".parse::<ServiceKind>().unwrap(), ServiceKind::Reply);
    }

    #[test]
    fn test_parse_unknown_kind_fails() {
        let err = "echo".parse::<ServiceKind>().unwrap_err();
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn test_display_matches_parse() {
        for kind in ServiceKind::ALL {
            assert_eq!(kind.to_string().parse::<ServiceKind>().unwrap(), kind);
        }
    }
}

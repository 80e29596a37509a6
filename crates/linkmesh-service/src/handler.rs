// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Response computation, one case per service kind.
//!
//! Adding a kind means adding one enum variant and one match arm here;
//! there is no dispatch machinery beyond the closed match.

use linkmesh::ServiceKind;
use std::time::{SystemTime, UNIX_EPOCH};

/// Compute the response payload for a request against a service of
/// `kind`.
///
/// - `Time`: the current time as an 8-byte big-endian epoch-millisecond
///   timestamp; the request payload is ignored.
/// - `Sum`: one byte, the wrapping sum of the first two payload bytes;
///   `[0]` when fewer than two are given.
/// - `Reply`: the payload echoed back unchanged.
pub fn respond(kind: ServiceKind, payload: &[u8]) -> Vec<u8> {
    match kind {
        ServiceKind::Time => epoch_millis().to_be_bytes().to_vec(),
        ServiceKind::Sum => match payload {
            [a, b, ..] => vec![a.wrapping_add(*b)],
            _ => vec![0],
        },
        ServiceKind::Reply => payload.to_vec(),
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

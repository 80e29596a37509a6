// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interactive command parsing and response rendering.

use linkmesh::ServiceKind;
use thiserror::Error;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Exit the client.
    Quit,
    /// Send this payload to the service.
    Payload(Vec<u8>),
}

/// Rejected input line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("type a payload, or quit to exit")]
    Empty,

    #[error("sum needs two integers between 0 and 255")]
    BadSumOperands,
}

/// Parse an input line into a request payload for a service of `kind`.
///
/// `quit` / `q` exit regardless of kind. Sum expects two byte-sized
/// integers; Reply sends the raw line; Time ignores the line and sends an
/// empty payload.
pub fn parse_line(kind: ServiceKind, line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    if line == "quit" || line == "q" {
        return Ok(Command::Quit);
    }
    if line.is_empty() {
        return Err(InputError::Empty);
    }

    let payload = match kind {
        ServiceKind::Time => Vec::new(),
        ServiceKind::Sum => {
            let mut operands = line.split_whitespace().map(|token| token.parse::<u8>());
            match (operands.next(), operands.next()) {
                (Some(Ok(a)), Some(Ok(b))) => vec![a, b],
                _ => return Err(InputError::BadSumOperands),
            }
        }
        ServiceKind::Reply => line.as_bytes().to_vec(),
    };
    Ok(Command::Payload(payload))
}

/// Render a service's response payload for the console.
pub fn render_response(kind: ServiceKind, payload: &[u8]) -> String {
    match kind {
        ServiceKind::Time => match <[u8; 8]>::try_from(payload) {
            Ok(bytes) => format!("epoch millis: {}", u64::from_be_bytes(bytes)),
            Err(_) => format!("malformed time response ({} bytes)", payload.len()),
        },
        ServiceKind::Sum => match payload.first() {
            Some(sum) => format!("sum: {}", sum),
            None => "malformed sum response (empty)".to_string(),
        },
        ServiceKind::Reply => format!("reply: {}", String::from_utf8_lossy(payload)),
    }
}

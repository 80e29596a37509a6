// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linkmesh client node.
//!
//! The client knows only the static linker list. To use a service it asks
//! one linker, chosen at random, for the address of the wanted kind; on
//! timeout it asks another random linker with an escalated wait, never
//! sticking to a known-bad one. It then talks to the service directly.
//!
//! ```text
//! client --(request_service)--> linker
//!        <------(response)-----
//!
//! client --------(request)----> service
//!        <------(response)-----
//! ```
//!
//! A call that times out is reported to a linker (SERVICE_DOWN) before
//! the client re-locates elsewhere, so a dead service is probed and
//! evicted instead of silently abandoned.

pub mod input;
pub mod session;

pub use session::{ClientError, ClientSession};

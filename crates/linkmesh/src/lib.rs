// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Core types and wire protocol for the linkmesh discovery mesh.
//!
//! A linkmesh deployment consists of three participant roles sharing one
//! datagram protocol:
//!
//! - **Linkers** form the broker mesh: they hold the service registry,
//!   answer lookups, and gossip registry mutations to their peers.
//! - **Services** advertise themselves to one linker and answer requests.
//! - **Clients** ask a linker for a service address, then talk to the
//!   service directly.
//!
//! This crate holds everything those participants share: the envelope
//! codec ([`wire`]), endpoint addresses ([`addr`]), service kinds
//! ([`kind`]), the registry snapshot format ([`table`]), the escalating
//! retry timeout ([`backoff`]), and the mesh configuration file
//! ([`config`]). It is transport-agnostic and carries no async runtime;
//! the node crates put the bytes on sockets.

pub mod addr;
pub mod backoff;
pub mod config;
pub mod kind;
pub mod table;
pub mod wire;

pub use addr::NodeAddr;
pub use backoff::Backoff;
pub use config::{ConfigError, MeshConfig};
pub use kind::ServiceKind;
pub use table::ServiceTable;
pub use wire::{DecodeError, Envelope, MessageKind, Role, MAX_PAYLOAD};

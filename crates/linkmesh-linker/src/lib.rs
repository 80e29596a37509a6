// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linkmesh linker node.
//!
//! Linkers are the bridge between clients and services: services register
//! with one linker chosen at random, linkers gossip every registry
//! mutation to their peers (one hop, never re-broadcast), and clients ask
//! any linker for the address of a service kind. A client-reported suspect
//! is probed before eviction, so a slow service is not confused with a
//! dead one.
//!
//! ```text
//! SERVICE REGISTRATION          CLIENT LOOKUP
//! linker <--(register)-- svc    linker <--(request_service)-- client
//!        ----(ack)---->                ------(response)----->
//!        --(register)--> peers
//!
//! SERVICE TIMEOUT
//! linker <--(service_down)-- client
//!        -------(ack)------>
//!        -------(ping)--------------> suspect
//!        --(remove_service)--> peers       (only on probe timeout)
//! ```
//!
//! On startup a linker polls its peers for a full registry snapshot
//! before serving traffic; if none answers it assumes it is the first
//! node in the mesh.

pub mod config;
pub mod server;

pub use config::LinkerConfig;
pub use server::{LinkerError, LinkerServer};

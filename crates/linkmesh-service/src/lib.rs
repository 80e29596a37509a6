// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linkmesh service node.
//!
//! At startup a service registers itself with one linker chosen at
//! random, retrying with an escalating timeout until a linker
//! acknowledges. It then answers application-level requests and liveness
//! pings until stopped.
//!
//! ```text
//! service --(register_service)--> linker
//!         <--------(ack)---------
//!
//! service <-------(request)------ client
//!         ------(response)------>
//!
//! service <--------(ping)------- linker
//!         --------(pong)------->
//! ```

pub mod handler;
pub mod node;

pub use node::{ServiceError, ServiceNode};

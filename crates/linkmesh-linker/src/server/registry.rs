// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The linker's service registry.
//!
//! One registry per linker, owned by that linker alone and mutated only
//! by its protocol engine; peers learn about mutations through explicit
//! gossip messages, never through shared state.

use linkmesh::{NodeAddr, ServiceKind, ServiceTable};

/// In-memory mapping from service kind to the set of addresses currently
/// believed to offer that kind.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    table: ServiceTable,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an address under a kind. Idempotent: re-registering the same
    /// (kind, address) pair leaves a single entry. Returns `true` when the
    /// entry is new.
    pub fn register(&mut self, kind: ServiceKind, addr: NodeAddr) -> bool {
        self.table.insert(kind, addr)
    }

    /// Pick one address offering `kind`, uniformly at random over the set
    /// as it stands right now. `None` when no address is registered - a
    /// normal outcome, not an error.
    pub fn lookup(&self, kind: ServiceKind) -> Option<NodeAddr> {
        let set = self.table.get(kind)?;
        if set.is_empty() {
            return None;
        }
        let pick = fastrand::usize(..set.len());
        set.iter().nth(pick).cloned()
    }

    /// Remove an address from every kind's set. Failure detection works on
    /// raw addresses: a dead endpoint is dead for all kinds it served.
    pub fn remove(&mut self, addr: &NodeAddr) -> bool {
        self.table.remove_addr(addr)
    }

    /// Deep copy of the whole mapping, for answering anti-entropy
    /// requests.
    pub fn snapshot(&self) -> ServiceTable {
        self.table.clone()
    }

    /// Replace the whole mapping with a peer's snapshot during bootstrap.
    pub fn replace(&mut self, table: ServiceTable) {
        self.table = table;
    }

    /// Total number of registered addresses across all kinds.
    pub fn address_count(&self) -> usize {
        self.table.address_count()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The authoritative local view of the mesh: who is in it, and their advertised metadata.

use crate::{node_name::NodeName, value::Metadata};

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct RegistryInner {
    self_name: NodeName,
    peers: HashMap<NodeName, Metadata>,
}

/// `{selfName, {peerName -> metadata}}`.
///
/// Reads are linearizable relative to writes on the same node; writers must never hold the
/// lock across network I/O. Peer metadata learned over RPC is fetched first and only then
/// committed here.
#[derive(Clone)]
pub struct NodeRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl NodeRegistry {
    /// Creates a registry containing only `self_name -> self_metadata`.
    pub fn new(self_name: NodeName, self_metadata: Metadata) -> Self {
        let mut peers = HashMap::new();
        peers.insert(self_name.clone(), self_metadata);

        Self {
            inner: Arc::new(RwLock::new(RegistryInner { self_name, peers })),
        }
    }

    fn read(&self) -> RwLockReadGuard<RegistryInner> {
        self.inner.read().expect("registry lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<RegistryInner> {
        self.inner.write().expect("registry lock poisoned")
    }

    /// This node's own identity.
    pub fn self_name(&self) -> NodeName {
        self.read().self_name.clone()
    }

    /// A snapshot of the full membership map.
    pub fn get_all(&self) -> HashMap<NodeName, Metadata> {
        self.read().peers.clone()
    }

    /// The metadata advertised by `name`, if known.
    pub fn get(&self, name: &NodeName) -> Option<Metadata> {
        self.read().peers.get(name).cloned()
    }

    /// All known node names, including self.
    pub fn names(&self) -> Vec<NodeName> {
        self.read().peers.keys().cloned().collect()
    }

    /// Upserts this node's own advertised metadata.
    pub fn set_self_metadata(&self, metadata: Metadata) {
        let self_name = self.read().self_name.clone();
        self.write().peers.insert(self_name, metadata);
    }

    /// Upserts a peer's advertised metadata.
    pub fn set_peer_metadata(&self, name: NodeName, metadata: Metadata) {
        self.write().peers.insert(name, metadata);
    }

    /// Replaces the full peer map, always keeping `self_name -> self_metadata`.
    ///
    /// Used by `PingTask` (rebuild the reachable set) and `SyncTask` (merge-union with
    /// transitively discovered peers).
    pub fn replace_all(&self, mut peers: HashMap<NodeName, Metadata>) {
        let mut write = self.write();
        let self_name = write.self_name.clone();
        let self_metadata = write.peers.get(&self_name).cloned().unwrap_or_default();
        peers.insert(self_name, self_metadata);
        write.peers = peers;
    }

    /// Unions `other` into the current membership map (later — i.e. `other` — wins on
    /// conflicting keys), always keeping self's own metadata authoritative.
    pub fn merge(&self, other: HashMap<NodeName, Metadata>) {
        let mut write = self.write();
        let self_name = write.self_name.clone();
        for (name, metadata) in other {
            write.peers.insert(name, metadata);
        }
        let self_metadata = write.peers.get(&self_name).cloned().unwrap_or_default();
        write.peers.insert(self_name, self_metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_name_always_present() {
        let registry = NodeRegistry::new(NodeName::new("a@h"), Metadata::default());
        assert!(registry.get_all().contains_key(&NodeName::new("a@h")));
    }

    #[test]
    fn replace_all_preserves_self() {
        let registry = NodeRegistry::new(NodeName::new("a@h"), Metadata::default());
        registry.set_self_metadata(Metadata::from([("role".into(), serde_json::json!("entry"))]));

        let mut peers = HashMap::new();
        peers.insert(NodeName::new("b@h"), Metadata::default());
        registry.replace_all(peers);

        let all = registry.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&NodeName::new("a@h")]["role"], serde_json::json!("entry"));
    }

    #[test]
    fn merge_unions_without_losing_existing_peers() {
        let registry = NodeRegistry::new(NodeName::new("a@h"), Metadata::default());
        registry.set_peer_metadata(NodeName::new("b@h"), Metadata::default());

        let mut other = HashMap::new();
        other.insert(NodeName::new("c@h"), Metadata::default());
        registry.merge(other);

        let names: std::collections::HashSet<_> = registry.names().into_iter().collect();
        assert!(names.contains(&NodeName::new("a@h")));
        assert!(names.contains(&NodeName::new("b@h")));
        assert!(names.contains(&NodeName::new("c@h")));
    }
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! An in-process `Transport` for end-to-end tests. Every RPC is a direct async call into
//! the target node's own state rather than a call over a socket — this is what the
//! scenario tests in `crate::tests` are built on. Only compiled under `#[cfg(test)]`;
//! never part of the public API.

use crate::{
    error::MeshError, event::Envelope, node::MeshNode, node_name::NodeName, request::{Request, RequestId},
    transport::Transport, value::Metadata,
};

use async_trait::async_trait;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A shared directory of `MeshNode`s, addressed by name, that stands in for a real network.
#[derive(Clone, Default)]
pub struct LocalTransport {
    nodes: Arc<RwLock<HashMap<NodeName, Arc<MeshNode>>>>,
}

impl LocalTransport {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `node` reachable under its own name.
    pub fn register(&self, node: Arc<MeshNode>) {
        self.nodes.write().expect("local transport lock poisoned").insert(node.self_name(), node);
    }

    fn get(&self, name: &NodeName) -> Result<Arc<MeshNode>, MeshError> {
        self.nodes
            .read()
            .expect("local transport lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| MeshError::Unreachable(name.clone()))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn registry_get(&self, peer: &NodeName) -> Result<HashMap<NodeName, Metadata>, MeshError> {
        Ok(self.get(peer)?.local_registry_get())
    }

    async fn metadata(&self, peer: &NodeName) -> Result<Metadata, MeshError> {
        Ok(self.get(peer)?.local_metadata())
    }

    async fn acceptance_priority(&self, peer: &NodeName, request: &Request) -> Result<Option<i64>, MeshError> {
        Ok(self.get(peer)?.local_acceptance_priority(request))
    }

    async fn push_metadata(&self, peer: &NodeName, from: &NodeName, metadata: Metadata) -> Result<(), MeshError> {
        self.get(peer)?.local_set_peer_metadata(from.clone(), metadata);
        Ok(())
    }

    async fn insert_handling(&self, peer: &NodeName, request: Request) -> Result<(), MeshError> {
        self.get(peer)?.local_insert_handling(request);
        Ok(())
    }

    async fn remove_request(&self, peer: &NodeName, id: RequestId) -> Result<(), MeshError> {
        self.get(peer)?.local_remove_request(id);
        Ok(())
    }

    async fn ping(&self, peer: &NodeName) -> Result<bool, MeshError> {
        Ok(self.get(peer)?.local_ping())
    }

    async fn deliver(&self, origin_node: &NodeName, _caller_handle: RequestId, envelope: Envelope) -> Result<(), MeshError> {
        self.get(origin_node)?.local_deliver(envelope);
        Ok(())
    }
}

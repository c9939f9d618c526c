// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The RPC surface a node exposes to, and consumes from, its peers.
//!
//! Transport is explicitly out of scope: authentication, wire framing, retries and
//! encryption are left to whatever implementation an embedder plugs in. This trait only
//! ever carries [`Request`], [`NodeName`], [`RequestId`], and [`Envelope`] values across
//! its boundary — never closures — so a real implementation can serialize it over a socket.

use crate::{error::MeshError, event::Envelope, node_name::NodeName, request::{Request, RequestId}, value::Metadata};

use async_trait::async_trait;

use std::collections::HashMap;

/// Node-to-node RPC, liveness probing, and process-addressed message delivery.
///
/// Every method is addressed *to* `peer` — implementations route the call across the
/// network (or, for the in-process test harness, directly into the target node's state).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `peer`'s full membership view.
    async fn registry_get(&self, peer: &NodeName) -> Result<HashMap<NodeName, Metadata>, MeshError>;

    /// Fetches `peer`'s self-advertised metadata.
    async fn metadata(&self, peer: &NodeName) -> Result<Metadata, MeshError>;

    /// Asks `peer` to score `request` against its own local state.
    async fn acceptance_priority(&self, peer: &NodeName, request: &Request) -> Result<Option<i64>, MeshError>;

    /// Pushes self-metadata onto `peer`'s registry entry for this node.
    async fn push_metadata(&self, peer: &NodeName, from: &NodeName, metadata: Metadata) -> Result<(), MeshError>;

    /// Inserts `request` directly into `peer`'s handling list — the remote half of delegation.
    async fn insert_handling(&self, peer: &NodeName, request: Request) -> Result<(), MeshError>;

    /// Removes the request identified by `id` from `peer`'s store — used at completion.
    async fn remove_request(&self, peer: &NodeName, id: RequestId) -> Result<(), MeshError>;

    /// Liveness probe; `Ok(false)` and `Err` are treated equivalently by callers (peer
    /// considered unreachable).
    async fn ping(&self, peer: &NodeName) -> Result<bool, MeshError>;

    /// Delivers a terminal envelope to the caller addressed by `(origin_node, caller_handle)`,
    /// possibly on a different node than the executor.
    async fn deliver(
        &self,
        origin_node: &NodeName,
        caller_handle: RequestId,
        envelope: Envelope,
    ) -> Result<(), MeshError>;
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! `MeshNode` ties every component together: the registry, the request store, the
//! capability table, a transport handle, and the resolved configuration.

use crate::{
    capability::CapabilityTable,
    config::MeshConfig,
    error::MeshError,
    event::{Envelope, Outcome},
    node_name::NodeName,
    pending::PendingCalls,
    registry::NodeRegistry,
    request::{Request, RequestId, RequestStore},
    supervisor::Supervisor,
    tasks,
    transport::Transport,
    value::{Metadata, Value},
};

use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Options accepted by [`MeshNode::make_it_so`].
#[derive(Clone, Debug)]
pub struct CallOptions {
    /// How long to wait for a result before returning [`Outcome::Timeout`].
    pub timeout_ms: u64,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self { timeout_ms: DEFAULT_TIMEOUT_MS }
    }
}

/// The state shared between `MeshNode` and its supervised tasks. Cloning a `Shared` is
/// cheap — every field is itself a cheaply-cloneable handle over shared interior state.
pub(crate) struct Shared {
    pub(crate) self_name: NodeName,
    pub(crate) registry: NodeRegistry,
    pub(crate) store: RequestStore,
    pub(crate) capability: CapabilityTable,
    pub(crate) config: MeshConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) pending_calls: PendingCalls,
}

impl Shared {
    /// `acceptancePriority(request)` computed against this node's own state (§4.2.2).
    pub(crate) fn local_acceptance_priority(&self, request: &Request) -> Option<i64> {
        if !self.capability.resolves(request.module(), request.function(), request.arity()) {
            return None;
        }

        let base = self.store.base_busyness();
        match self.config.offset_entry(request.module(), request.function()) {
            None => Some(-base),
            Some(entry) => entry.value().map(|offset| -(base + offset)),
        }
    }

    /// `busynessWeight(request)` computed against this node's own configuration (§4.2.3).
    pub(crate) fn local_busyness_weight(&self, request: &Request) -> Option<i64> {
        if !self.capability.resolves(request.module(), request.function(), request.arity()) {
            return None;
        }

        match self.config.weight_entry(request.module(), request.function()) {
            None => Some(100),
            Some(entry) => entry.value(),
        }
    }

    /// `busyness()` (§4.2): `baseBusyness + Σ weight(r) for r in handling`, resolving each
    /// handling request's weight against this node's own `busyness_weights` config. A
    /// request whose weight comes back `nil` — no longer locally resolvable, or explicitly
    /// `"reject"`ed — still occupies a handling slot, so it contributes `0` rather than
    /// being skipped or turning the whole sum into an error.
    pub(crate) fn busyness(&self) -> i64 {
        self.store.busyness(|r| self.local_busyness_weight(r).unwrap_or(0))
    }

    pub(crate) fn local_metadata(&self) -> Metadata {
        self.registry.get(&self.self_name).unwrap_or_default()
    }
}

/// One participant in the mesh: owns its local state and, once [`MeshNode::spawn`] is
/// called, the four periodic tasks that drive it.
pub struct MeshNode {
    shared: Arc<Shared>,
    supervisor: Supervisor,
}

impl MeshNode {
    /// Builds a node. Register capabilities with [`MeshNode::capability_table`] before
    /// calling [`MeshNode::spawn`].
    pub fn new(self_name: NodeName, config: MeshConfig, transport: Arc<dyn Transport>) -> Self {
        let metadata = config.metadata.clone();
        let shared = Arc::new(Shared {
            self_name: self_name.clone(),
            registry: NodeRegistry::new(self_name, metadata),
            store: RequestStore::default(),
            capability: CapabilityTable::new(),
            config,
            transport,
            pending_calls: PendingCalls::new(),
        });

        Self { shared, supervisor: Supervisor::new() }
    }

    /// This node's identity.
    pub fn self_name(&self) -> NodeName {
        self.shared.self_name.clone()
    }

    /// The capability table, for registering locally-callable functions before spawning.
    pub fn capability_table(&self) -> &CapabilityTable {
        &self.shared.capability
    }

    /// The local request store, exposed for introspection and tests.
    pub fn request_store(&self) -> &RequestStore {
        &self.shared.store
    }

    /// The local membership registry, exposed for introspection and tests.
    pub fn registry(&self) -> &NodeRegistry {
        &self.shared.registry
    }

    /// Starts `PingTask`, `SyncTask`, `AssignTask`, and `HandleTask` under a supervisor
    /// that restarts any of them should its loop ever panic or return.
    pub fn spawn(&mut self) {
        let shared = self.shared.clone();
        self.supervisor.spawn("ping", move || tasks::ping::cycle_forever(shared.clone()));

        let shared = self.shared.clone();
        self.supervisor.spawn("sync", move || tasks::sync::cycle_forever(shared.clone()));

        let shared = self.shared.clone();
        self.supervisor.spawn("assign", move || tasks::assign::cycle_forever(shared.clone()));

        let shared = self.shared.clone();
        self.supervisor.spawn("handle", move || tasks::handle::cycle_forever(shared.clone()));
    }

    /// Aborts every supervised task.
    pub fn shutdown(&self) {
        self.supervisor.shutdown();
    }

    /// Originates a request for `module.function(args)` and awaits its terminal outcome,
    /// synchronous from the caller's perspective.
    pub async fn make_it_so(
        &self,
        module: impl Into<String>,
        function: impl Into<String>,
        args: Vec<Value>,
        opts: CallOptions,
    ) -> Result<Outcome, MeshError> {
        let request = Request::new(self.shared.self_name.clone(), module, function, args);
        let id = request.id();
        let module = request.module().to_string();
        let function = request.function().to_string();

        let receiver = self.shared.pending_calls.register(id);
        self.shared.store.add(request);

        match tokio::time::timeout(Duration::from_millis(opts.timeout_ms), receiver).await {
            Ok(Ok(envelope)) => {
                if let Envelope::Error { error_info, executing_node, .. } = &envelope {
                    log::warn!("{}.{} ({}) failed on {}: {}", module, function, id, executing_node, error_info);
                }
                Ok(envelope.into())
            }
            // Sender dropped without completing: treat the same as a timeout.
            Ok(Err(_)) => {
                log::warn!("{}.{} ({}) abandoned its caller before completing", module, function, id);
                Ok(Outcome::Timeout)
            }
            Err(_) => {
                log::debug!("{}.{} ({}) timed out after {}ms", module, function, id, opts.timeout_ms);
                self.shared.pending_calls.forget(id);
                Ok(Outcome::Timeout)
            }
        }
    }

    // -- Local RPC endpoints, called directly by this node's own tasks for `self`, and by
    // `Transport` implementations (e.g. the in-process test harness) to expose this node's
    // state to peers.

    pub fn local_registry_get(&self) -> std::collections::HashMap<NodeName, Metadata> {
        self.shared.registry.get_all()
    }

    pub fn local_metadata(&self) -> Metadata {
        self.shared.registry.get(&self.shared.self_name).unwrap_or_default()
    }

    pub fn local_set_peer_metadata(&self, name: NodeName, metadata: Metadata) {
        self.shared.registry.set_peer_metadata(name, metadata);
    }

    /// `acceptancePriority(request)` computed against this node's own state (§4.2.2).
    pub fn local_acceptance_priority(&self, request: &Request) -> Option<i64> {
        self.shared.local_acceptance_priority(request)
    }

    /// `busynessWeight(request)` computed against this node's own configuration (§4.2.3).
    pub fn local_busyness_weight(&self, request: &Request) -> Option<i64> {
        self.shared.local_busyness_weight(request)
    }

    /// `busyness()` (§4.2): this node's current load, `baseBusyness` plus the weight of
    /// every handling request resolved against its own `busyness_weights` config.
    pub fn busyness(&self) -> i64 {
        self.shared.busyness()
    }

    pub fn local_insert_handling(&self, request: Request) {
        self.shared.store.insert_handling(request);
    }

    pub fn local_remove_request(&self, id: RequestId) {
        self.shared.store.remove(id);
    }

    pub fn local_ping(&self) -> bool {
        true
    }

    pub fn local_deliver(&self, envelope: Envelope) {
        self.shared.pending_calls.complete(envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BusynessEntry, test_support::LocalTransport};

    use proptest::prelude::*;

    fn node_with_offset(offset: Option<BusynessEntry>, capable: bool) -> MeshNode {
        let mut config = MeshConfig::default();
        if let Some(entry) = offset {
            let mut inner = std::collections::HashMap::new();
            inner.insert("Math".to_string(), entry);
            config.busyness_offsets.insert("Math".to_string(), inner);
        }

        let node = MeshNode::new(NodeName::new("a@h"), config, Arc::new(LocalTransport::new()));
        if capable {
            node.capability_table().register("Math", "square", 1, Arc::new(|args| Ok(args[0].clone())));
        }
        node
    }

    proptest! {
        #[test]
        fn acceptance_priority_is_nil_iff_incapable_or_rejecting(
            capable in any::<bool>(),
            offset in proptest::option::of(-1000i64..1000i64),
            reject in any::<bool>(),
        ) {
            let entry = if reject {
                Some(BusynessEntry::Reject)
            } else {
                offset.map(BusynessEntry::Value)
            };

            let node = node_with_offset(entry.clone(), capable);
            let request = Request::new(NodeName::new("a@h"), "Math", "square", vec![serde_json::json!(1)]);

            let score = node.local_acceptance_priority(&request);
            let should_be_nil = !capable || reject;

            prop_assert_eq!(score.is_none(), should_be_nil);
        }
    }

    fn node_with_weight(weight: Option<BusynessEntry>) -> MeshNode {
        let mut config = MeshConfig::default();
        if let Some(entry) = weight {
            let mut inner = std::collections::HashMap::new();
            inner.insert("Math".to_string(), entry);
            config.busyness_weights.insert("Math".to_string(), inner);
        }

        let node = MeshNode::new(NodeName::new("a@h"), config, Arc::new(LocalTransport::new()));
        node.capability_table().register("Math", "square", 1, Arc::new(|args| Ok(args[0].clone())));
        node
    }

    #[test]
    fn busyness_resolves_all_three_weight_branches() {
        let request = || Request::new(NodeName::new("a@h"), "Math", "square", vec![serde_json::json!(7)]);

        // absent -> default weight 100
        let node = node_with_weight(None);
        node.request_store().base_busyness_increase(Some(10));
        node.local_insert_handling(request());
        assert_eq!(node.busyness(), 10 + 100);

        // explicit value -> that value, verbatim
        let node = node_with_weight(Some(BusynessEntry::Value(42)));
        node.request_store().base_busyness_increase(Some(10));
        node.local_insert_handling(request());
        assert_eq!(node.busyness(), 10 + 42);

        // "reject" -> nil weight; the request still occupies a handling slot, so it
        // contributes 0 rather than being dropped from the sum or erroring.
        let node = node_with_weight(Some(BusynessEntry::Reject));
        node.request_store().base_busyness_increase(Some(10));
        node.local_insert_handling(request());
        assert_eq!(node.busyness(), 10);
    }

    #[tokio::test]
    async fn make_it_so_times_out_when_nothing_resolves() {
        let mut node = MeshNode::new(NodeName::new("a@h"), MeshConfig::default(), Arc::new(LocalTransport::new()));
        node.spawn();

        let outcome = node
            .make_it_so("Nothing", "here", vec![], CallOptions { timeout_ms: 50 })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Timeout);
    }
}

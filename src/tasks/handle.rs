// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The executor-side worker dispatcher: runs each locally-handling request and ships its
//! result back to the originator.

use crate::{event::Envelope, node::Shared, request::Request};

use std::sync::Arc;

pub(crate) async fn cycle_forever(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(shared.config.latencies.handle_interval());
    loop {
        interval.tick().await;
        run_cycle(&shared).await;
    }
}

async fn run_cycle(shared: &Arc<Shared>) {
    let handling = shared.store.get_handling();

    for request in handling {
        let worker_shared = shared.clone();
        let id = request.id();

        // Spawned independently; the host task does not await it.
        tokio::spawn(async move {
            run_worker(&worker_shared, request).await;
        });

        // At-most-once local execution: the request leaves this node's lists the moment
        // its worker is launched, not when the worker finishes.
        shared.store.remove(id);
    }
}

async fn run_worker(shared: &Shared, request: Request) {
    let executing_node = shared.self_name.clone();
    let result = shared.capability.apply(request.module(), request.function(), request.args());

    let envelope = match result {
        Ok(result) => Envelope::Response { id: request.id(), executing_node: executing_node.clone(), result },
        Err(e) => Envelope::Error { request: request.clone(), executing_node: executing_node.clone(), error_info: e.to_string() },
    };

    deliver(shared, request.origin_node(), request.caller_handle(), envelope).await;
    remove_from_originator(shared, request.origin_node(), request.id()).await;
}

async fn deliver(shared: &Shared, origin_node: &crate::node_name::NodeName, caller_handle: crate::request::RequestId, envelope: Envelope) {
    if *origin_node == shared.self_name {
        shared.pending_calls.complete(envelope);
        return;
    }

    if let Err(e) = shared.transport.deliver(origin_node, caller_handle, envelope).await {
        log::warn!("handle: failed to deliver result to {}: {}", origin_node, e);
    }
}

async fn remove_from_originator(shared: &Shared, origin_node: &crate::node_name::NodeName, id: crate::request::RequestId) {
    if *origin_node == shared.self_name {
        shared.store.remove(id);
        return;
    }

    if let Err(e) = shared.transport.remove_request(origin_node, id).await {
        log::warn!("handle: failed to clear {} from originator {}: {}", id, origin_node, e);
    }
}

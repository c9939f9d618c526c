// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The originator-side scheduler: for each pending request, polls every known node's
//! acceptance priority and routes the request to the best-scoring one.

use crate::{node::Shared, request::Request};

use std::sync::Arc;

pub(crate) async fn cycle_forever(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(shared.config.latencies.assign_interval());
    loop {
        interval.tick().await;
        run_cycle(&shared).await;
    }
}

async fn run_cycle(shared: &Shared) {
    let pending = shared.store.get_pending();

    for request in pending {
        assign_one(shared, &request).await;
    }
}

async fn assign_one(shared: &Shared, request: &Request) {
    let candidates = shared.registry.names();

    let mut scores: Vec<(crate::node_name::NodeName, i64)> = Vec::new();
    for candidate in candidates {
        let score = if candidate == shared.self_name {
            shared.local_acceptance_priority(request)
        } else {
            match shared.transport.acceptance_priority(&candidate, request).await {
                Ok(score) => score,
                Err(_) => None,
            }
        };

        if let Some(score) = score {
            scores.push((candidate, score));
        }
    }

    let winner = match scores.into_iter().max_by_key(|(_, score)| *score) {
        Some((winner, _)) => winner,
        // No eligible node this cycle; retry next time.
        None => return,
    };

    if winner == shared.self_name {
        if let Err(e) = shared.store.pick(request.id()) {
            log::warn!("assign: failed to pick {} locally: {}", request.id(), e);
        }
    } else {
        delegate(shared, &winner, request).await;
    }
}

async fn delegate(shared: &Shared, winner: &crate::node_name::NodeName, request: &Request) {
    match shared.transport.insert_handling(winner, request.clone()).await {
        Ok(()) => shared.store.remove_delegated(request.id()),
        Err(e) => log::warn!("assign: failed to delegate {} to {}: {}", request.id(), winner, e),
    }
}

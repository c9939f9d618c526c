// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Liveness probing, metadata exchange, and seed-list persistence.

use crate::{node::Shared, node_name::NodeName, persistence, value::Metadata};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub(crate) async fn cycle_forever(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(shared.config.latencies.ping_interval());
    loop {
        interval.tick().await;
        run_cycle(&shared).await;
    }
}

async fn run_cycle(shared: &Shared) {
    let path = persistence::default_path();
    let persisted = persistence::load_persisted_nodes(&path);

    let mut candidates: HashSet<NodeName> = persisted.iter().cloned().collect();
    candidates.extend(shared.registry.names());
    candidates.extend(shared.config.referral_names());
    candidates.remove(&shared.self_name);

    let mut reachable: Vec<NodeName> = Vec::new();
    for candidate in &candidates {
        if ping_one(shared, candidate).await {
            reachable.push(candidate.clone());
        }
    }

    let mut peers: HashMap<NodeName, Metadata> = HashMap::new();
    for peer in &reachable {
        let metadata = match shared.registry.get(peer) {
            Some(metadata) => metadata,
            None => fetch_metadata(shared, peer).await,
        };
        peers.insert(peer.clone(), metadata);
    }
    shared.registry.replace_all(peers);

    let self_metadata = shared.local_metadata();
    for peer in &reachable {
        if let Err(e) = shared.transport.push_metadata(peer, &shared.self_name, self_metadata.clone()).await {
            log::warn!("failed to push metadata to {}: {}", peer, e);
        }
    }

    let mut sorted_reachable = reachable.clone();
    sorted_reachable.sort();
    let mut sorted_persisted = persisted.clone();
    sorted_persisted.sort();

    if sorted_reachable != sorted_persisted {
        if let Err(e) = persistence::save_persisted_nodes(&path, &sorted_reachable) {
            log::warn!("failed to persist reachable node list: {}", e);
        }
    }
}

async fn ping_one(shared: &Shared, target: &NodeName) -> bool {
    if *target == shared.self_name {
        return true;
    }
    shared.transport.ping(target).await.unwrap_or(false)
}

async fn fetch_metadata(shared: &Shared, target: &NodeName) -> Metadata {
    if *target == shared.self_name {
        return shared.local_metadata();
    }
    shared.transport.metadata(target).await.unwrap_or_default()
}

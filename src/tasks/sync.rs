// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Membership reconciliation: pull each known peer's view of the mesh and merge it in.

use crate::node::Shared;

use std::sync::Arc;

pub(crate) async fn cycle_forever(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(shared.config.latencies.sync_interval());
    loop {
        interval.tick().await;
        run_cycle(&shared).await;
    }
}

async fn run_cycle(shared: &Shared) {
    let peers = shared.registry.names();

    for peer in peers {
        if peer == shared.self_name {
            continue;
        }

        match shared.transport.registry_get(&peer).await {
            Ok(remote_view) => shared.registry.merge(remote_view),
            Err(e) => log::debug!("sync: {} unreachable, skipping this cycle: {}", peer, e),
        }
    }
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::{Request, RequestId};
use crate::error::MeshError;

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

const DEFAULT_BUSYNESS_BUMP: i64 = 100;

struct StoreInner {
    pending: VecDeque<Request>,
    handling: Vec<Request>,
    base_busyness: i64,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            handling: Vec::new(),
            base_busyness: 0,
        }
    }
}

/// The requests this node has originated (`pending`) and the requests it is currently
/// executing on behalf of some originator (`handling`), plus a mutable load bias.
///
/// All operations serialize against a single `RwLock`; none of them perform network I/O
/// while the lock is held — delegation's remote half lives outside this type (see
/// [`crate::node::MeshNode::make_it_so`] and the `AssignTask`), consistent with the rule
/// that store transactions never nest an RPC.
#[derive(Clone, Default)]
pub struct RequestStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl RequestStore {
    fn read(&self) -> RwLockReadGuard<StoreInner> {
        self.inner.read().expect("request store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<StoreInner> {
        self.inner.write().expect("request store lock poisoned")
    }

    /// Prepends `req` to `pending`, first removing any existing entry with the same id.
    pub fn add(&self, req: Request) {
        let mut write = self.write();
        let id = req.id();
        write.pending.retain(|r| r.id() != id);
        write.handling.retain(|r| r.id() != id);
        write.pending.push_front(req);
    }

    /// Removes the request with `id` from both lists. A no-op if absent.
    pub fn remove(&self, id: RequestId) {
        let mut write = self.write();
        write.pending.retain(|r| r.id() != id);
        write.handling.retain(|r| r.id() != id);
    }

    /// Moves the request with `id` from `pending` to `handling`.
    ///
    /// Fails with [`MeshError::NotFound`] if no such request is currently pending — this
    /// signals a lost race (it was already picked up or delegated elsewhere) or an unknown
    /// id, and is never silently ignored.
    pub fn pick(&self, id: RequestId) -> Result<Request, MeshError> {
        let mut write = self.write();
        let index = write
            .pending
            .iter()
            .position(|r| r.id() == id)
            .ok_or(MeshError::NotFound(id))?;
        let req = write.pending.remove(index).expect("index just found");
        write.handling.push(req.clone());
        Ok(req)
    }

    /// Directly inserts `req` into `handling`, skipping `pending` — used by the remote
    /// half of delegation (`Transport::insert_handling`) to push a request onto a peer.
    pub fn insert_handling(&self, req: Request) {
        let mut write = self.write();
        let id = req.id();
        write.handling.retain(|r| r.id() != id);
        write.handling.push(req);
    }

    /// Removes `req` from `pending` and `handling` — the local half of delegation, run
    /// only after the remote `insert_handling` RPC has succeeded.
    pub fn remove_delegated(&self, id: RequestId) {
        self.remove(id);
    }

    /// A read-only snapshot of `pending`, newest first.
    pub fn get_pending(&self) -> Vec<Request> {
        self.read().pending.iter().cloned().collect()
    }

    /// A read-only snapshot of `handling`.
    pub fn get_handling(&self) -> Vec<Request> {
        self.read().handling.clone()
    }

    /// Looks a request up by id in either list.
    pub fn get(&self, id: RequestId) -> Option<Request> {
        let read = self.read();
        read.pending
            .iter()
            .chain(read.handling.iter())
            .find(|r| r.id() == id)
            .cloned()
    }

    /// `baseBusyness + Σ weight(r) for r in handling`, given a weight function.
    pub fn busyness(&self, weight_of: impl Fn(&Request) -> i64) -> i64 {
        let read = self.read();
        read.base_busyness + read.handling.iter().map(weight_of).sum::<i64>()
    }

    /// The current base busyness.
    pub fn base_busyness(&self) -> i64 {
        self.read().base_busyness
    }

    /// Raises the base busyness by `n`, defaulting to 100.
    pub fn base_busyness_increase(&self, n: Option<i64>) {
        self.write().base_busyness += n.unwrap_or(DEFAULT_BUSYNESS_BUMP);
    }

    /// Lowers the base busyness by `n`, defaulting to 100.
    pub fn base_busyness_decrease(&self, n: Option<i64>) {
        self.write().base_busyness -= n.unwrap_or(DEFAULT_BUSYNESS_BUMP);
    }
}

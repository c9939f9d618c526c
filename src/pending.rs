// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The per-node table of callers awaiting a result.
//!
//! `callerHandle` *is* the [`RequestId`] in this port: `make_it_so` registers a
//! `oneshot::Sender<Envelope>` here before publishing its request, and `deliver` looks the
//! sender up by id and completes it. This is how a result crosses back into a caller that
//! may be waiting on a different node than the one that executed the request.

use crate::{event::Envelope, request::RequestId};

use tokio::sync::oneshot;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct PendingCalls {
    inner: Arc<Mutex<HashMap<RequestId, oneshot::Sender<Envelope>>>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `id`, returning the receiving half.
    pub fn register(&self, id: RequestId) -> oneshot::Receiver<Envelope> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().expect("pending calls lock poisoned").insert(id, tx);
        rx
    }

    /// Completes the waiter for `envelope`'s request id, if still registered. A missing
    /// entry means the caller already timed out and abandoned the request; the envelope
    /// is then silently discarded, matching the "expired" lifecycle state.
    pub fn complete(&self, envelope: Envelope) {
        let id = envelope.request_id();
        let sender = self.inner.lock().expect("pending calls lock poisoned").remove(&id);
        if let Some(sender) = sender {
            // The receiver may already be gone (caller timed out and dropped it); that's fine.
            let _ = sender.send(envelope);
        }
    }

    /// Drops a waiter without completing it, used once a caller's own timeout has fired.
    pub fn forget(&self, id: RequestId) {
        self.inner.lock().expect("pending calls lock poisoned").remove(&id);
    }
}

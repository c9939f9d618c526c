// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The node-local registry of callable `(module, function)` handlers.
//!
//! The user-facing macro that synthesizes a call site is out of scope, but it has to end
//! up registering *something* callable on the node that will execute it — this is that
//! something. The out-of-scope macro is assumed to call [`CapabilityTable::register`] once
//! per function it wraps.

use crate::{error::MeshError, value::Value};

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

/// A locally-registered handler.
pub type Handler = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    arity: usize,
    handler: Handler,
}

/// `(module, function) -> handler`, consulted by `acceptancePriority` and `busynessWeight`
/// as the single source of truth for "resolvable locally".
#[derive(Clone, Default)]
pub struct CapabilityTable {
    entries: Arc<RwLock<HashMap<(String, String), Entry>>>,
}

impl CapabilityTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `module.function`. Re-registering the same pair replaces
    /// it — last writer wins, matching the idempotent-upsert texture of the rest of the
    /// system.
    pub fn register(
        &self,
        module: impl Into<String>,
        function: impl Into<String>,
        arity: usize,
        handler: Handler,
    ) {
        self.entries
            .write()
            .expect("capability table lock poisoned")
            .insert((module.into(), function.into()), Entry { arity, handler });
    }

    /// The handler for `module.function/arg_count`, if registered with matching arity.
    pub fn resolve(&self, module: &str, function: &str, arg_count: usize) -> Option<Handler> {
        self.entries
            .read()
            .expect("capability table lock poisoned")
            .get(&(module.to_string(), function.to_string()))
            .filter(|e| e.arity == arg_count)
            .map(|e| e.handler.clone())
    }

    /// Whether `module.function/arg_count` resolves to a registered handler.
    pub fn resolves(&self, module: &str, function: &str, arg_count: usize) -> bool {
        self.resolve(module, function, arg_count).is_some()
    }

    /// Invokes the resolved handler, converting panics and handler-reported errors alike
    /// into [`MeshError::Execution`].
    pub fn apply(&self, module: &str, function: &str, args: &[Value]) -> Result<Value, MeshError> {
        let handler = self.resolve(module, function, args.len()).ok_or_else(|| MeshError::Execution {
            module: module.to_string(),
            function: function.to_string(),
            cause: "not resolvable locally".into(),
        })?;

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler(args)));

        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(cause)) => Err(MeshError::Execution {
                module: module.to_string(),
                function: function.to_string(),
                cause,
            }),
            Err(panic) => {
                let cause = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panicked with a non-string payload".into());

                Err(MeshError::Execution {
                    module: module.to_string(),
                    function: function.to_string(),
                    cause,
                })
            }
        }
    }
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The deferred invocation record routed across the mesh, and its store.

pub(crate) mod store;

pub use store::RequestStore;

use crate::{node_name::NodeName, value::Value};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// A unique, opaque request identity (UUID-shaped, 128 bits of randomness).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(u128);

impl RequestId {
    /// Generates a new, random request id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0))
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self)
    }
}

/// A deferred invocation of `module.function(args)`, routed across the mesh.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    origin_node: NodeName,
    caller_handle: RequestId,
    module: String,
    function: String,
    args: Vec<Value>,
}

impl Request {
    /// Creates a new request originating on `origin_node`.
    ///
    /// The caller handle and the request id are the same value here: a request id
    /// identifies the work, a caller handle identifies who's waiting for it, and in this
    /// port the waiting caller is always the `PendingCalls` entry registered under the
    /// request's own id (see `crate::pending::PendingCalls`).
    pub fn new(origin_node: NodeName, module: impl Into<String>, function: impl Into<String>, args: Vec<Value>) -> Self {
        let id = RequestId::new();
        Self {
            id,
            origin_node,
            caller_handle: id,
            module: module.into(),
            function: function.into(),
            args,
        }
    }

    /// The request's unique id.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The node that created this request and awaits its result.
    pub fn origin_node(&self) -> &NodeName {
        &self.origin_node
    }

    /// The opaque handle identifying the waiting caller on `origin_node`.
    pub fn caller_handle(&self) -> RequestId {
        self.caller_handle
    }

    /// The module name to resolve at the executing node.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The function name to resolve at the executing node.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The ordered arguments; `args.len()` determines arity.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub(crate) fn arity(&self) -> usize {
        self.args.len()
    }
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The error taxonomy of the mesh.

use crate::{node_name::NodeName, request::RequestId};

/// Errors that can occur while operating a mesh node.
#[derive(thiserror::Error, Debug)]
pub enum MeshError {
    /// A request id was looked up in a store but isn't present there.
    ///
    /// Raised by `pick`/`delegate` when the id isn't in `pending`; this is a programming
    /// error (a lost race or a caller operating on stale information), not a routine outcome.
    #[error("request {0} not found in store")]
    NotFound(RequestId),

    /// A peer did not answer a ping or an RPC within the expected time.
    #[error("node {0} is unreachable")]
    Unreachable(NodeName),

    /// `module.function` invocation panicked or returned an application-level error.
    #[error("execution of {module}.{function} failed: {cause}")]
    Execution {
        /// The module name.
        module: String,
        /// The function name.
        function: String,
        /// A stringified cause, safe to hand back to a remote caller.
        cause: String,
    },

    /// Reading or writing the persisted seed list failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The transport could not deliver a message (distinct from a routine `Unreachable`
    /// peer drop — this covers malformed responses, decode failures, and the like).
    #[error("transport error: {0}")]
    Transport(String),
}

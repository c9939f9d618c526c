// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The messages exchanged between an executor and a waiting caller.

use crate::{node_name::NodeName, request::Request, request::RequestId, value::Value};

use serde::{Deserialize, Serialize};

/// Delivered by an executor's `HandleTask` worker to the originator's waiting caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Envelope {
    /// Successful completion.
    Response {
        id: RequestId,
        executing_node: NodeName,
        result: Value,
    },
    /// The executor's `apply` failed.
    Error {
        request: Request,
        executing_node: NodeName,
        error_info: String,
    },
}

impl Envelope {
    /// The id of the request this envelope concludes.
    pub fn request_id(&self) -> RequestId {
        match self {
            Envelope::Response { id, .. } => *id,
            Envelope::Error { request, .. } => request.id(),
        }
    }
}

/// What `make_it_so` resolves to: the caller-visible terminus of a request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The request completed and `result` was computed on `executing_node`.
    Ok { result: Value, executing_node: NodeName },
    /// The executor reported an execution failure.
    Error { executing_node: NodeName, error_info: String },
    /// The caller's receive window elapsed before any envelope arrived.
    Timeout,
}

impl From<Envelope> for Outcome {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Response { executing_node, result, .. } => Outcome::Ok { result, executing_node },
            Envelope::Error { executing_node, error_info, .. } => Outcome::Error { executing_node, error_info },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_envelope_converts_to_ok_outcome() {
        let envelope = Envelope::Response {
            id: RequestId::new(),
            executing_node: NodeName::new("b@h"),
            result: serde_json::json!(49),
        };

        let outcome: Outcome = envelope.into();
        assert_eq!(
            outcome,
            Outcome::Ok { result: serde_json::json!(49), executing_node: NodeName::new("b@h") }
        );
    }
}

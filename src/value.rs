// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The dynamically-typed value used for request arguments, results, and metadata.
//!
//! Arguments and results cross node boundaries through an assumed transport (see the
//! `Transport` trait), so they need a shape that serializes uniformly rather than a fixed
//! Rust type. `serde_json::Value` already is that shape for most RPC-ish crates in this
//! space, so it is reused directly instead of wrapped.

/// An argument, result, or metadata value.
pub type Value = serde_json::Value;

/// An opaque key/value map advertised by a node once per ping cycle.
pub type Metadata = std::collections::HashMap<String, Value>;

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The four periodic tasks a `MeshNode` runs under supervision.

pub(crate) mod assign;
pub(crate) mod handle;
pub(crate) mod ping;
pub(crate) mod sync;

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Mesh configuration.
//!
//! Loading this from a file, environment variables, or a remote config service is
//! explicitly out of scope here — the host process is responsible for producing a
//! `MeshConfig` value however it likes (JSON, TOML, hardcoded) and handing it to
//! [`crate::MeshNode::new`].

use crate::value::Metadata;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A per-function busyness entry: either a fixed integer or an outright rejection
/// (the literal string `"reject"` in configuration).
#[derive(Clone, Debug)]
pub enum BusynessEntry {
    /// A fixed offset or weight.
    Value(i64),
    /// The function is never eligible for the metric this table belongs to.
    Reject,
}

impl BusynessEntry {
    /// Returns the fixed integer, or `None` if this entry is a rejection.
    pub fn value(&self) -> Option<i64> {
        match self {
            BusynessEntry::Value(v) => Some(*v),
            BusynessEntry::Reject => None,
        }
    }
}

impl Serialize for BusynessEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BusynessEntry::Value(v) => serializer.serialize_i64(*v),
            BusynessEntry::Reject => serializer.serialize_str("reject"),
        }
    }
}

impl<'de> Deserialize<'de> for BusynessEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> de::Visitor<'de> for EntryVisitor {
            type Value = BusynessEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer or the string \"reject\"")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(BusynessEntry::Value(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(BusynessEntry::Value(v as i64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == "reject" {
                    Ok(BusynessEntry::Reject)
                } else {
                    Err(de::Error::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

/// `module -> function -> entry`.
pub type BusynessTable = HashMap<String, HashMap<String, BusynessEntry>>;

/// Per-task loop intervals.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskLatencies {
    /// `PingTask` cycle interval, default 1500ms.
    #[serde(default = "default_ping_latency")]
    pub ping: u64,
    /// `SyncTask` cycle interval, default 3000ms.
    #[serde(default = "default_sync_latency")]
    pub sync: u64,
    /// `AssignTask` cycle interval, default 20ms.
    #[serde(default = "default_assign_latency")]
    pub assign_requests: u64,
    /// `HandleTask` cycle interval, default 10ms.
    #[serde(default = "default_handle_latency")]
    pub handle_requests: u64,
}

impl Default for TaskLatencies {
    fn default() -> Self {
        Self {
            ping: default_ping_latency(),
            sync: default_sync_latency(),
            assign_requests: default_assign_latency(),
            handle_requests: default_handle_latency(),
        }
    }
}

impl TaskLatencies {
    pub(crate) fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping)
    }
    pub(crate) fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync)
    }
    pub(crate) fn assign_interval(&self) -> Duration {
        Duration::from_millis(self.assign_requests)
    }
    pub(crate) fn handle_interval(&self) -> Duration {
        Duration::from_millis(self.handle_requests)
    }
}

fn default_ping_latency() -> u64 {
    1500
}
fn default_sync_latency() -> u64 {
    3000
}
fn default_assign_latency() -> u64 {
    20
}
fn default_handle_latency() -> u64 {
    10
}

/// Mesh configuration, owned by the host process and handed to [`crate::MeshNode::new`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Comma-separated seed peer names used to bootstrap and refresh membership.
    #[serde(default)]
    pub referrals: String,
    /// The metadata this node advertises once per ping cycle.
    #[serde(default)]
    pub metadata: Metadata,
    /// `module -> function -> weight|"reject"`, defaults to `100` when absent.
    #[serde(default)]
    pub busyness_weights: BusynessTable,
    /// `module -> function -> offset|"reject"`, defaults to `0` (i.e. `-baseBusyness`) when absent.
    #[serde(default)]
    pub busyness_offsets: BusynessTable,
    /// Per-task loop intervals.
    #[serde(default)]
    pub latencies: TaskLatencies,
}

impl MeshConfig {
    /// Parses the `referrals` field into a list of node names, skipping blanks.
    pub(crate) fn referral_names(&self) -> Vec<crate::node_name::NodeName> {
        self.referrals
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(crate::node_name::NodeName::new)
            .collect()
    }

    pub(crate) fn weight_entry(&self, module: &str, function: &str) -> Option<&BusynessEntry> {
        self.busyness_weights.get(module).and_then(|m| m.get(function))
    }

    pub(crate) fn offset_entry(&self, module: &str, function: &str) -> Option<&BusynessEntry> {
        self.busyness_offsets.get(module).and_then(|m| m.get(function))
    }
}

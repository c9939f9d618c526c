// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Disk persistence of the last known reachable seed list, so `PingTask` has something to
//! union with configured referrals across a restart.

use crate::node_name::NodeName;

use std::path::{Path, PathBuf};

/// The fixed persistence path, relative to the process's current working directory.
pub fn default_path() -> PathBuf {
    PathBuf::from("priv/please/persisted_nodes.dat")
}

/// Loads the persisted node list. Missing, unreadable, or corrupt content degrades to an
/// empty list rather than an error — the file is an optimization, not a source of truth.
pub fn load_persisted_nodes(path: &Path) -> Vec<NodeName> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };

    bincode::deserialize::<Vec<NodeName>>(&bytes).unwrap_or_else(|e| {
        log::warn!("persisted node list at {} is corrupt, ignoring: {}", path.display(), e);
        Vec::new()
    })
}

/// Overwrites the persisted node list, creating the parent directory if missing.
pub fn save_persisted_nodes(path: &Path, nodes: &[NodeName]) -> Result<(), crate::error::MeshError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| crate::error::MeshError::Persistence(e.to_string()))?;
    }

    let bytes = bincode::serialize(nodes).map_err(|e| crate::error::MeshError::Persistence(e.to_string()))?;
    std::fs::write(path, bytes).map_err(|e| crate::error::MeshError::Persistence(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_sorted_list() {
        let dir = tempdir();
        let path = dir.join("persisted_nodes.dat");

        let mut nodes = vec![NodeName::new("b@h"), NodeName::new("a@h")];
        nodes.sort();
        save_persisted_nodes(&path, &nodes).unwrap();

        let loaded = load_persisted_nodes(&path);
        assert_eq!(loaded, nodes);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_file_yields_empty_list() {
        let path = PathBuf::from("priv/please/definitely-does-not-exist.dat");
        assert!(load_persisted_nodes(&path).is_empty());
    }

    #[test]
    fn corrupt_file_yields_empty_list_not_a_panic() {
        let dir = tempdir();
        let path = dir.join("corrupt.dat");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, b"not a valid bincode payload at all, hopefully").unwrap();

        assert!(load_persisted_nodes(&path).is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    fn tempdir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("meshcall-test-{}-{}", std::process::id(), RANDOM_SUFFIX.fetch_add(1, std::sync::atomic::Ordering::Relaxed)));
        dir
    }

    static RANDOM_SUFFIX: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
}

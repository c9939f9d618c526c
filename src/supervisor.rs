// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Restarts a periodic task's future whenever it completes, whether by panic or by
//! returning early — the concrete form of "six long-lived components... restarted
//! independently".

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

const RESTART_BACKOFF: Duration = Duration::from_millis(200);

/// Owns one `JoinHandle` per spawned task, so callers can shut every supervised task down
/// together.
#[derive(Default)]
pub struct Supervisor {
    handles: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Creates a supervisor with no tasks yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `name`, running `make_future()` repeatedly: whenever the produced future
    /// completes (normally or via panic), `name` is logged and respawned after a short
    /// fixed backoff.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, mut make_future: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        log::info!("spawning `{}` under supervision", name);

        let handle = tokio::spawn(async move {
            loop {
                let result = tokio::spawn(make_future()).await;

                match result {
                    Ok(()) => log::warn!("`{}` returned; restarting in {:?}", name, RESTART_BACKOFF),
                    Err(join_err) => {
                        log::warn!("`{}` panicked ({}); restarting in {:?}", name, join_err, RESTART_BACKOFF)
                    }
                }

                tokio::time::sleep(RESTART_BACKOFF).await;
            }
        });

        self.handles.push(handle);
    }

    /// Aborts every supervised task. Used by tests to tear down a `MeshNode` cleanly.
    pub fn shutdown(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn a_panicking_task_is_respawned() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut supervisor = Supervisor::new();

        let runs_clone = runs.clone();
        supervisor.spawn("flaky", move || {
            let runs = runs_clone.clone();
            async move {
                let n = runs.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    panic!("first run always panics");
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(600)).await;
        supervisor.shutdown();

        assert!(runs.load(Ordering::SeqCst) >= 2);
    }
}

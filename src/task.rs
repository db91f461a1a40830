//! Tracked task spawning
//!
//! [`TaskGroup`] counts the tasks it has spawned that are still running and
//! lets a caller wait for all of them. The count is incremented before the
//! task is handed to the runtime and decremented by a drop guard, so a
//! task that panics or is aborted is still accounted for.
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use svckit::task::TaskGroup;
//!
//! let group = TaskGroup::new();
//! for i in 0..3 {
//!     group.spawn(async move { i * 2 });
//! }
//! group.wait().await;
//! assert_eq!(group.active(), 0);
//! # }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct GroupState {
    active: AtomicUsize,
    idle: Notify,
}

/// Cloneable handle; clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct TaskGroup {
    state: Arc<GroupState>,
}

/// Decrements the active count when the task finishes, however it ends.
struct ActiveGuard {
    state: Arc<GroupState>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if self.state.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.idle.notify_waiters();
        }
    }
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self) -> ActiveGuard {
        self.state.active.fetch_add(1, Ordering::AcqRel);
        ActiveGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Spawn `future` on the current tokio runtime as part of this group.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let guard = self.enter();
        tokio::spawn(async move {
            let _guard = guard;
            future.await
        })
    }

    /// Run a blocking closure on the runtime's blocking pool as part of
    /// this group.
    pub fn spawn_blocking<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let guard = self.enter();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            f()
        })
    }

    /// Tasks spawned through this group that have not finished yet.
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::Acquire)
    }

    /// Resolve once every task in the group has finished.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a wakeup between the two is not lost.
            let notified = self.state.idle.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

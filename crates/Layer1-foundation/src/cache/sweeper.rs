//! Background TTL sweeper
//!
//! A single periodic task per store. It is bound to a stop signal so the entry
//! point can end it at shutdown, and it exits on its own once the store is gone.

use super::store::CacheStore;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to a running sweeper task. Dropping it stops the task.
#[must_use = "dropping the handle stops the sweeper"]
#[derive(Debug)]
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the task to stop and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub(crate) fn spawn(store: Weak<CacheStore>, interval: Duration) -> SweeperHandle {
    let (stop, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        // First tick after one full interval, not immediately
        let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let Some(store) = store.upgrade() else {
                break;
            };
            let removed = store.sweep().await;
            if removed > 0 {
                debug!("Periodic sweep: removed {} expired entries", removed);
            }
        }

        debug!("cache sweeper stopped");
    });

    SweeperHandle { stop, task }
}

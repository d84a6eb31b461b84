//! Background expiry watchdog
//!
//! A repeating task that gives the session manager a chance to refresh the
//! access token before it runs out. The task is aborted when the handle is
//! stopped or dropped.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to a running watchdog task
pub struct Watchdog {
    handle: JoinHandle<()>,
}

impl Watchdog {
    /// Run `tick` every `period`, first one full period from now.
    ///
    /// The task ends on its own once `tick` returns `None`.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Option<Fut> + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match tick() {
                    Some(check) => check.await,
                    None => {
                        debug!("Session gone, watchdog exiting");
                        break;
                    }
                }
            }
        });

        debug!("Watchdog started, period {:?}", period);
        Self { handle }
    }

    /// Whether the task is still scheduled
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the task
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

//! Background deletion of pastes nobody reads.
//!
//! The sweeper is a single tokio task that wakes up once per interval and runs
//! [`paste::sweep`]. The first run happens one full interval after start. A failed
//! sweep is logged and the task keeps its schedule.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::controllers::paste::{self, SweepPolicy};
use crate::App;

/// Handle to a running sweeper. Dropping it stops the task.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    pub fn start(app: App, policy: SweepPolicy, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(app, policy, interval, shutdown_rx));

        info!(
            "expiry sweeper started: every {}s, min_opens={}, min_age={}s",
            interval.as_secs(),
            policy.min_opens,
            policy.min_age.as_secs()
        );

        Self { shutdown_tx }
    }

    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            info!("expiry sweeper stopped");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    app: App,
    policy: SweepPolicy,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let Some(first_run) = Instant::now().checked_add(interval) else {
        // interval too long to ever fire
        let _ = shutdown_rx.changed().await;
        return;
    };

    let mut ticker = time::interval_at(first_run, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("expiry sweeper received shutdown signal");
                    return;
                }
                continue;
            }
        }

        debug!("running expiry sweep");
        if let Err(e) = paste::sweep(&app, policy).await {
            error!("expiry sweep failed: {e}");
        }
    }
}

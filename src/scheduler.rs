use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::cycle::CycleRunner;

/// Runs the cycle on a fixed interval until told to stop.
pub struct Poller {
    runner: CycleRunner,
    interval: Duration,
}

impl Poller {
    pub fn new(runner: CycleRunner, interval: Duration) -> Self {
        Self { runner, interval }
    }

    /// First cycle runs immediately. Cycles never overlap; a slow cycle pushes the next
    /// tick back instead of bunching ticks up. Setting `shutdown` to true stops the loop
    /// once any in-flight cycle has finished.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting poller (interval: {:?})", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match self.runner.run().await {
                        Ok(outcome) => info!(
                            status = %outcome.result.status,
                            notified = outcome.notified,
                            persisted = outcome.persisted,
                            "Cycle complete"
                        ),
                        // The next tick retries from scratch.
                        Err(e) => error!("Cycle failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Poller stopped");
    }
}

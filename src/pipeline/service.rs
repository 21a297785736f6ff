//! Outer service loop — run cycles forever with idle/cooldown pacing.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info};

use crate::pipeline::TriageCycle;

/// Long-running service wrapper around [`TriageCycle`].
pub struct TriageService {
    cycle: TriageCycle,
    /// Pause between successful cycles.
    idle_interval: Duration,
    /// Extended pause after a failed cycle.
    cooldown: Duration,
}

impl TriageService {
    pub fn new(cycle: TriageCycle, idle_interval: Duration, cooldown: Duration) -> Self {
        Self {
            cycle,
            idle_interval,
            cooldown,
        }
    }

    /// Run cycles until the process is terminated.
    ///
    /// A failed cycle is logged and retried after the cooldown; it never
    /// takes the service down.
    pub async fn run(self) {
        info!("Starting inbox triage service");

        loop {
            match self.cycle.run_cycle().await {
                Ok(_) => {
                    info!(
                        "Waiting {} seconds before next check",
                        self.idle_interval.as_secs()
                    );
                    sleep(self.idle_interval).await;
                }
                Err(e) => {
                    error!(error = %e, "Cycle failed");
                    info!("Retrying in {} seconds", self.cooldown.as_secs());
                    sleep(self.cooldown).await;
                }
            }
        }
    }
}

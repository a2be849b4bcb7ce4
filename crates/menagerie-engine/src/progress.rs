//! Tick callback that reports progress through `tracing`.

use menagerie_core::{Simulation, TickCallback, TickSummary};
use tracing::{debug, info, warn};

/// Logs a summary line every `every` ticks and warns on failed agents.
#[derive(Debug, Clone, Copy)]
pub struct ProgressLogger {
    every: u64,
}

impl ProgressLogger {
    /// Report every `every` ticks. Zero disables periodic reports.
    pub const fn new(every: u64) -> Self {
        Self { every }
    }

    /// Whether `tick` gets a periodic report.
    pub const fn is_report_tick(&self, tick: u64) -> bool {
        matches!(tick.checked_rem(self.every), Some(0))
    }
}

impl TickCallback for ProgressLogger {
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation) {
        if summary.failures > 0 {
            warn!(tick = summary.tick, failures = summary.failures, "Agents failed this tick");
        }
        if self.is_report_tick(summary.tick) {
            let levels: Vec<u32> = sim.agents().iter().map(|a| a.level).collect();
            info!(
                tick = summary.tick,
                time = summary.time,
                agents = summary.agents,
                resources = summary.resources,
                ?levels,
                "Tick progress"
            );
        } else {
            debug!(
                tick = summary.tick,
                state_changes = summary.state_changes,
                meals_started = summary.meals_started,
                consumptions = summary.consumptions,
                "Tick complete"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_cadence() {
        let logger = ProgressLogger::new(50);
        assert!(logger.is_report_tick(50));
        assert!(logger.is_report_tick(100));
        assert!(!logger.is_report_tick(51));
        assert!(!ProgressLogger::new(0).is_report_tick(50));
    }
}

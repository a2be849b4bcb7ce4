//! Bounded simulation runs.
//!
//! [`run_for`] drives [`Simulation::run_tick`] a fixed number of times with
//! a constant step, reporting each tick to a [`TickCallback`]. The engine
//! binary paces ticks in real time itself but accumulates the same
//! [`RunTotals`].

use tracing::info;

use crate::simulation::{Simulation, TickError, TickSummary};

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _sim: &Simulation) {}
}

/// Totals accumulated over a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunTotals {
    /// Ticks executed.
    pub ticks: u64,
    /// Resources consumed.
    pub consumptions: u64,
    /// Evolutions carried out.
    pub evolutions: u64,
    /// Resources spawned.
    pub resources_spawned: u64,
    /// Failed agent steps.
    pub failures: u64,
    /// The last tick summary, if any tick completed.
    pub last: Option<TickSummary>,
}

impl RunTotals {
    /// Fold one tick into the totals.
    pub fn record(&mut self, summary: &TickSummary) {
        self.ticks = self.ticks.saturating_add(1);
        self.consumptions = self.consumptions.saturating_add(u64::from(summary.consumptions));
        self.evolutions = self.evolutions.saturating_add(u64::from(summary.evolutions));
        self.resources_spawned = self
            .resources_spawned
            .saturating_add(u64::from(summary.resources_spawned));
        self.failures = self.failures.saturating_add(u64::from(summary.failures));
        self.last = Some(*summary);
    }

    /// Log the totals at `info` level.
    pub fn log(&self) {
        info!(
            ticks = self.ticks,
            consumptions = self.consumptions,
            evolutions = self.evolutions,
            resources_spawned = self.resources_spawned,
            failures = self.failures,
            final_agents = self.last.map(|s| s.agents),
            final_resources = self.last.map(|s| s.resources),
            "Simulation ended"
        );
    }
}

/// Run `ticks` ticks of `dt` seconds each.
///
/// # Errors
///
/// Returns the first [`TickError`]; totals up to that point are lost.
pub fn run_for(
    sim: &mut Simulation,
    ticks: u64,
    dt: f32,
    callback: &mut dyn TickCallback,
) -> Result<RunTotals, TickError> {
    let mut totals = RunTotals::default();
    for _ in 0..ticks {
        let summary = sim.run_tick(dt)?;
        totals.record(&summary);
        callback.on_tick(&summary, sim);
    }
    Ok(totals)
}

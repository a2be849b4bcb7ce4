//! Simulation clock.
//!
//! The clock counts ticks and accumulates simulated seconds. Every
//! timestamp in the simulation (state deadlines, cooldowns, continuation
//! deadlines) is a value of [`SimClock::now`].

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The step was negative, NaN, or infinite.
    #[error("invalid time step: {dt}")]
    InvalidDelta {
        /// The rejected step in seconds.
        dt: f32,
    },
}

/// Tick counter and simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimClock {
    /// Ticks completed.
    tick: u64,
    /// Simulated seconds elapsed.
    elapsed: f64,
}

impl SimClock {
    /// A clock at tick 0, time 0.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
        }
    }

    /// Advance by one tick of `dt` seconds. Returns the new tick number.
    ///
    /// A zero step is allowed (it advances the tick but not the time).
    ///
    /// # Errors
    ///
    /// - [`ClockError::InvalidDelta`] if `dt` is negative or not finite.
    /// - [`ClockError::TickOverflow`] if the tick counter would overflow.
    pub fn advance(&mut self, dt: f32) -> Result<u64, ClockError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(ClockError::InvalidDelta { dt });
        }
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.elapsed += f64::from(dt);
        Ok(self.tick)
    }

    /// Ticks completed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed.
    pub const fn now(&self) -> f64 {
        self.elapsed
    }
}

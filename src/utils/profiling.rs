use std::time::{Duration, Instant};

/// Accumulated timing of the world's step phases.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WorldProfile {
    pub collision_time: Duration,
    pub force_solve_time: Duration,
    pub forward_dynamics_time: Duration,

    pub step_count: u64,
    pub contact_count: usize,
}

impl WorldProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_time(&self) -> Duration {
        self.collision_time + self.force_solve_time + self.forward_dynamics_time
    }

    /// Writes the per-phase breakdown to the `debug` log.
    pub fn report(&self) {
        let total_us = self.total_time().as_micros() as f64;
        if total_us < 1.0 {
            return;
        }
        let share = |d: Duration| d.as_micros() as f64 / total_us * 100.0;
        log::debug!(
            "world profile: {} steps, {} contacts in last step, {:.2} ms total",
            self.step_count,
            self.contact_count,
            self.total_time().as_secs_f64() * 1000.0
        );
        log::debug!(
            "  collision detection {:.2} ms ({:.1}%)",
            self.collision_time.as_secs_f64() * 1000.0,
            share(self.collision_time)
        );
        log::debug!(
            "  constraint forces   {:.2} ms ({:.1}%)",
            self.force_solve_time.as_secs_f64() * 1000.0,
            share(self.force_solve_time)
        );
        log::debug!(
            "  forward dynamics    {:.2} ms ({:.1}%)",
            self.forward_dynamics_time.as_secs_f64() * 1000.0,
            share(self.forward_dynamics_time)
        );
    }
}

/// Adds the lifetime of the timer to a duration slot.
pub struct PhaseTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for PhaseTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}

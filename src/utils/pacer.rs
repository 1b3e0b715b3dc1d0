//! Fixed-period cycle pacing.

use std::thread;
use std::time::{Duration, Instant};

/// What happened to the deadline this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Slept until the deadline
    OnTime,
    /// Work ran past the deadline; the schedule was rebased
    Overran,
}

/// Sleeps loops to a fixed cadence.
///
/// The deadline advances by one period per cycle. When a cycle overruns,
/// the schedule is rebased from now instead of accumulating debt, so a
/// single slow cycle never triggers a burst of catch-up cycles.
#[derive(Debug)]
pub struct CyclePacer {
    period: Duration,
    deadline: Instant,
}

impl CyclePacer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: Instant::now() + period,
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until the current deadline, then advance it.
    pub fn wait(&mut self) -> CycleOutcome {
        let now = Instant::now();
        if now >= self.deadline {
            self.deadline = now + self.period;
            CycleOutcome::Overran
        } else {
            thread::sleep(self.deadline - now);
            self.deadline += self.period;
            CycleOutcome::OnTime
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paces_to_period() {
        let period = Duration::from_millis(10);
        let start = Instant::now();
        let mut pacer = CyclePacer::new(period);

        for _ in 0..5 {
            assert_eq!(pacer.wait(), CycleOutcome::OnTime);
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50), "too fast: {:?}", elapsed);
        // Generous upper bound for scheduler jitter
        assert!(elapsed < Duration::from_millis(200), "too slow: {:?}", elapsed);
    }

    #[test]
    fn test_overrun_rebases_without_burst() {
        let period = Duration::from_millis(10);
        let mut pacer = CyclePacer::new(period);

        // Blow well past several deadlines
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pacer.wait(), CycleOutcome::Overran);

        // The next wait sleeps a full period instead of firing
        // immediately to catch up
        let start = Instant::now();
        assert_eq!(pacer.wait(), CycleOutcome::OnTime);
        assert!(start.elapsed() >= Duration::from_millis(8));
    }
}

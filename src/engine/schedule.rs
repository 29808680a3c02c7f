//! Deadline-based repeating timer
//!
//! The engine never spawns callbacks of its own. A driver (the async runner
//! or a test) asks the timer whether a fire is due, so disarming the timer
//! cancels everything at once.

use std::time::{Duration, Instant};

#[derive(Clone, Debug, Default)]
pub struct RepeatingTimer {
    period: Duration,
    next_fire: Option<Instant>,
}

impl RepeatingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)arm so the first fire is one period after `now`
    pub fn arm(&mut self, now: Instant, period: Duration) {
        self.period = period;
        self.next_fire = Some(now + period);
    }

    pub fn disarm(&mut self) {
        self.next_fire = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_fire.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_fire(&self) -> Option<Instant> {
        self.next_fire
    }

    /// Consume a due fire. Fires missed while the driver was late collapse
    /// into one.
    pub fn fire(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_fire else {
            return false;
        };
        if now < due {
            return false;
        }
        let mut next = due + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.next_fire = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_period() {
        let start = Instant::now();
        let mut timer = RepeatingTimer::new();
        timer.arm(start, Duration::from_millis(100));

        assert!(!timer.fire(start + Duration::from_millis(50)));
        assert!(timer.fire(start + Duration::from_millis(100)));
        assert!(!timer.fire(start + Duration::from_millis(150)));
        assert!(timer.fire(start + Duration::from_millis(200)));
    }

    #[test]
    fn test_missed_fires_collapse() {
        let start = Instant::now();
        let mut timer = RepeatingTimer::new();
        timer.arm(start, Duration::from_millis(100));

        assert!(timer.fire(start + Duration::from_millis(1000)));
        assert!(!timer.fire(start + Duration::from_millis(1050)));
        assert_eq!(timer.next_fire(), Some(start + Duration::from_millis(1100)));
    }

    #[test]
    fn test_disarmed_never_fires() {
        let start = Instant::now();
        let mut timer = RepeatingTimer::new();
        timer.arm(start, Duration::from_millis(10));
        assert!(timer.is_armed());
        timer.disarm();
        assert!(!timer.is_armed());
        assert!(!timer.fire(start + Duration::from_secs(10)));
    }
}

//! Timer slots driven by the run's own clock.
//!
//! A [`Timer`] holds at most one pending deadline. Scheduling always replaces
//! whatever was pending, so a slot can never deliver two callbacks for the
//! same logical event.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timer {
    due: Option<Duration>,
    period: Option<Duration>,
}

impl Timer {
    /// Fires once, `delay` after `now`.
    pub fn once(&mut self, now: Duration, delay: Duration) {
        self.due = Some(now + delay);
        self.period = None;
    }

    /// Fires every `period`, first at `now + period`.
    pub fn every(&mut self, now: Duration, period: Duration) {
        self.due = Some(now + period);
        self.period = Some(period);
    }

    pub fn cancel(&mut self) {
        self.due = None;
        self.period = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    pub fn due(&self) -> Option<Duration> {
        self.due
    }

    /// Consumes one elapsed firing. Call in a loop to catch up on periodic
    /// timers that fell behind.
    pub fn fired(&mut self, now: Duration) -> bool {
        match self.due {
            Some(due) if due <= now => {
                self.due = self.period.map(|period| due + period);
                true
            }
            _ => false,
        }
    }
}

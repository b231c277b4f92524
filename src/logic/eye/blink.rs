//! Blink detection + trailing blink rate
//!
//! Both run on the estimator's observed clock (face-present seconds), so a
//! face loss neither completes a blink nor ages the rate window.

use std::collections::VecDeque;

/// Outcome of closing a below-threshold run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosureEnd {
    /// Duration within [min, max]
    Blink(f64),
    /// Shorter than a blink (noise)
    Flicker(f64),
    /// Longer than a blink (looking down, eyes resting)
    Rest(f64),
}

/// Tracks contiguous below-threshold runs
#[derive(Debug, Clone, Default)]
pub struct BlinkDetector {
    closed_since: Option<f64>,
}

impl BlinkDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation. Returns how a run ended, if one ended.
    pub fn observe(&mut self, now: f64, closed: bool, min_secs: f64, max_secs: f64) -> Option<ClosureEnd> {
        match (self.closed_since, closed) {
            (None, true) => {
                self.closed_since = Some(now);
                None
            }
            (Some(start), false) => {
                self.closed_since = None;
                let duration = now - start;
                Some(if duration < min_secs {
                    ClosureEnd::Flicker(duration)
                } else if duration > max_secs {
                    ClosureEnd::Rest(duration)
                } else {
                    ClosureEnd::Blink(duration)
                })
            }
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed_since.is_some()
    }

    /// Drop an open run (face lost mid-closure)
    pub fn abort(&mut self) {
        self.closed_since = None;
    }
}

/// Blinks per minute over a trailing window. Each blink is pushed once and
/// evicted once.
#[derive(Debug, Clone)]
pub struct BlinkRateWindow {
    window_secs: f64,
    blinks: VecDeque<f64>,
}

impl BlinkRateWindow {
    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs,
            blinks: VecDeque::new(),
        }
    }

    pub fn record(&mut self, at: f64) {
        self.blinks.push_back(at);
    }

    pub fn evict(&mut self, now: f64) {
        let cutoff = now - self.window_secs;
        while self.blinks.front().map_or(false, |&t| t <= cutoff) {
            self.blinks.pop_front();
        }
    }

    /// Rate normalized over `min(window, observed)`; `None` before `min_observed`
    pub fn rate(&self, observed: f64, min_observed: f64) -> Option<f32> {
        if observed < min_observed || observed <= 0.0 {
            return None;
        }
        let span = observed.min(self.window_secs);
        Some((self.blinks.len() as f64 * 60.0 / span) as f32)
    }

    pub fn len(&self) -> usize {
        self.blinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blinks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blinks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blink_classification() {
        let mut d = BlinkDetector::new();
        assert_eq!(d.observe(1.0, true, 0.05, 0.5), None);
        assert!(d.is_closed());
        assert!(matches!(
            d.observe(1.2, false, 0.05, 0.5),
            Some(ClosureEnd::Blink(secs)) if (secs - 0.2).abs() < 1e-9
        ));

        d.observe(2.0, true, 0.05, 0.5);
        assert!(matches!(d.observe(3.0, false, 0.05, 0.5), Some(ClosureEnd::Rest(_))));

        d.observe(4.0, true, 0.05, 0.5);
        assert!(matches!(d.observe(4.01, false, 0.05, 0.5), Some(ClosureEnd::Flicker(_))));
    }

    #[test]
    fn test_abort_discards_run() {
        let mut d = BlinkDetector::new();
        d.observe(1.0, true, 0.05, 0.5);
        d.abort();
        assert_eq!(d.observe(1.1, false, 0.05, 0.5), None);
    }

    #[test]
    fn test_rate_window() {
        let mut w = BlinkRateWindow::new(60.0);
        assert_eq!(w.rate(5.0, 10.0), None);

        for i in 0..30 {
            w.record(i as f64 * 4.0);
        }
        w.evict(120.0);
        // Blinks at 64..116 remain
        assert_eq!(w.len(), 14);
        let rate = w.rate(120.0, 10.0).unwrap();
        assert!((rate - 14.0).abs() < 1e-4);

        // Young window normalizes by observed time
        let mut young = BlinkRateWindow::new(60.0);
        young.record(5.0);
        young.record(10.0);
        young.record(15.0);
        assert!((young.rate(20.0, 10.0).unwrap() - 9.0).abs() < 1e-4);
    }
}

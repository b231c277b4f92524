//! Small numeric helpers shared by the estimators.

use std::collections::VecDeque;

/// Clamp to the score range. NaN maps to 0.
pub fn clamp_score(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Clamp to [0, 1]. NaN maps to 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Median of the samples (sorts in place). `None` when empty.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// EMA blend factor for a time step `dt` and time constant `tau`.
pub fn ema_alpha(dt: f64, tau: f64) -> f32 {
    if tau <= 0.0 {
        return 1.0;
    }
    (1.0 - (-dt.max(0.0) / tau).exp()) as f32
}

/// Time-constant exponential smoother. Robust to tick jitter since the blend
/// factor depends on the elapsed time, not on the tick count.
#[derive(Debug, Clone)]
pub struct Smoother {
    tau_secs: f64,
    value: Option<f32>,
}

impl Smoother {
    pub fn new(tau_secs: f64) -> Self {
        Self { tau_secs, value: None }
    }

    pub fn update(&mut self, raw: f32, dt: f64) -> f32 {
        let next = match self.value {
            None => raw,
            Some(prev) => prev + ema_alpha(dt, self.tau_secs) * (raw - prev),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Fraction of time a condition held over a trailing window.
/// Incremental: each sample is added once and evicted once.
#[derive(Debug, Clone)]
pub struct TrailingFraction {
    window_secs: f64,
    samples: VecDeque<(f64, f64, bool)>,
    total: f64,
    flagged: f64,
}

impl TrailingFraction {
    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs,
            samples: VecDeque::new(),
            total: 0.0,
            flagged: 0.0,
        }
    }

    /// Record `dt` seconds ending at `t` during which `flag` held.
    pub fn push(&mut self, t: f64, dt: f64, flag: bool) {
        if dt > 0.0 {
            self.samples.push_back((t, dt, flag));
            self.total += dt;
            if flag {
                self.flagged += dt;
            }
        }

        let cutoff = t - self.window_secs;
        while let Some(&(ts, d, f)) = self.samples.front() {
            if ts > cutoff {
                break;
            }
            self.samples.pop_front();
            self.total -= d;
            if f {
                self.flagged -= d;
            }
        }
        // Float drift guard
        if self.samples.is_empty() || self.total < 1e-9 {
            self.total = 0.0;
        }
        if self.samples.is_empty() || self.flagged < 1e-9 {
            self.flagged = 0.0;
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.total <= 0.0 {
            0.0
        } else {
            clamp_unit((self.flagged / self.total) as f32)
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.total = 0.0;
        self.flagged = 0.0;
    }
}

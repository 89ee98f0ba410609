// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Exponential smoothing and rate estimation for angle channels.

use crate::time::elapsed_ms;

/// Exponentially weighted moving average. The first sample seeds the average.
#[derive(Debug, Clone, Copy)]
pub struct Ewma {
    alpha: f64,
    value: f64,
    initialized: bool,
}

impl Ewma {
    /// `alpha` is the weight of a new sample, clamped into (0, 1]. 1.0 disables smoothing.
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha > 0.0 { alpha.min(1.0) } else { 1.0 };
        Self {
            alpha,
            value: 0.0,
            initialized: false,
        }
    }

    pub fn update(&mut self, sample: f64) -> f64 {
        if !self.initialized {
            self.value = sample;
            self.initialized = true;
        } else {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        }
        self.value
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn reset(&mut self) {
        self.initialized = false;
    }
}

/// One smoothed channel that also tracks the rate of change of its filtered value.
#[derive(Debug, Clone, Copy)]
pub struct FilteredChannel {
    ewma: Ewma,
    instantaneous: f64,
    rate: f64,
    last_ms: Option<u32>,
}

impl FilteredChannel {
    pub fn new(alpha: f64) -> Self {
        Self {
            ewma: Ewma::new(alpha),
            instantaneous: 0.0,
            rate: 0.0,
            last_ms: None,
        }
    }

    /// Add a sample taken at `now_ms`.
    ///
    /// The rate is the change of the filtered value per second since the previous sample. It stays
    /// at its last value when two samples share a timestamp.
    pub fn update(&mut self, sample: f64, now_ms: u32) {
        let previous = self.ewma.value();
        let was_initialized = self.ewma.is_initialized();
        let filtered = self.ewma.update(sample);
        self.instantaneous = sample;

        match self.last_ms {
            Some(last) if was_initialized => {
                let dt_ms = elapsed_ms(now_ms, last);
                if dt_ms > 0 {
                    self.rate = (filtered - previous) * 1000.0 / dt_ms as f64;
                }
            }
            _ => self.rate = 0.0,
        }
        self.last_ms = Some(now_ms);
    }

    /// Most recent unfiltered sample.
    #[inline]
    pub fn instantaneous(&self) -> f64 {
        self.instantaneous
    }

    #[inline]
    pub fn filtered(&self) -> f64 {
        self.ewma.value()
    }

    /// Filtered value change per second.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn reset(&mut self) {
        self.ewma.reset();
        self.rate = 0.0;
        self.last_ms = None;
    }
}

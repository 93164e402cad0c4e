//! Frame-rate meter

use std::time::Duration;

/// Exponential moving average of the instantaneous frame rate
#[derive(Debug, Clone, Copy)]
pub struct FpsMeter {
    smoothing: f64,
    fps: f64,
    last: Option<Duration>,
}

impl FpsMeter {
    /// `smoothing` is the weight kept from the previous estimate (0..1)
    pub fn new(smoothing: f64) -> Self {
        Self {
            smoothing: smoothing.clamp(0.0, 1.0),
            fps: 0.0,
            last: None,
        }
    }

    /// Feed one frame timestamp and return the current estimate
    pub fn update(&mut self, now: Duration) -> f64 {
        let Some(last) = self.last else {
            self.last = Some(now);
            return self.fps;
        };
        let dt = now.saturating_sub(last).as_secs_f64();
        if dt <= 0.0 {
            return self.fps;
        }
        self.fps = self.smoothing * self.fps + (1.0 - self.smoothing) / dt;
        self.last = Some(now);
        self.fps
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn reset(&mut self) {
        self.fps = 0.0;
        self.last = None;
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(0.9)
    }
}

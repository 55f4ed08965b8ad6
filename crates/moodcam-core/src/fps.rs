use std::time::{Duration, Instant};

/// Average frame rate since the meter was started.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    started: Instant,
    frames: u64,
}

impl FpsMeter {
    pub fn start(now: Instant) -> Self {
        Self { started: now, frames: 0 }
    }

    /// Count one frame and return frames-so-far divided by elapsed seconds.
    ///
    /// Reports 0.0 until any wall-clock time has passed.
    pub fn tick(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        self.fps_at(now)
    }

    pub fn fps_at(&self, now: Instant) -> f64 {
        let secs = self.elapsed(now).as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_over_elapsed_time() {
        let t0 = Instant::now();
        let mut meter = FpsMeter::start(t0);
        for i in 1..=30u64 {
            meter.tick(t0 + Duration::from_millis(i * 33));
        }
        let fps = meter.fps_at(t0 + Duration::from_secs(1));
        assert!((fps - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_elapsed_reports_zero() {
        let t0 = Instant::now();
        let mut meter = FpsMeter::start(t0);
        assert_eq!(meter.tick(t0), 0.0);
    }
}

use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant};

/// ~60 frames a second
pub const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Called once per rendered frame, after the display has been handed the
/// image. Implementations decide how (and whether) to wait.
pub trait FramePacer {
    fn frame(&mut self);
}

/// Don't wait at all; runs as fast as the host allows.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

impl FramePacer for NoPacing {
    fn frame(&mut self) {}
}

/// Sleeps out whatever is left of the frame period since the last frame,
/// so the time spent executing counts towards the frame.
pub struct SpinPacer {
    period: Duration,
    sleeper: SpinSleeper,
    last: Option<Instant>,
}

impl SpinPacer {
    pub fn new(period: Duration) -> Self {
        SpinPacer {
            period,
            sleeper: SpinSleeper::default(),
            last: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for SpinPacer {
    fn default() -> Self {
        SpinPacer::new(FRAME_PERIOD)
    }
}

impl FramePacer for SpinPacer {
    fn frame(&mut self) {
        let now = Instant::now();
        let wait = match self.last {
            Some(last) => self.period.saturating_sub(now - last),
            None => self.period,
        };
        if !wait.is_zero() {
            self.sleeper.sleep(wait);
        }
        self.last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_pacer_waits_a_frame() {
        let mut p = SpinPacer::new(Duration::from_millis(5));
        let start = Instant::now();
        p.frame();
        p.frame();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_spin_pacer_counts_work_time() {
        let mut p = SpinPacer::new(Duration::from_millis(5));
        p.frame();
        std::thread::sleep(Duration::from_millis(10));
        let start = Instant::now();
        p.frame();
        // the frame was already over, so no extra sleep
        assert!(start.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn test_no_pacing() {
        let mut p = NoPacing;
        let start = Instant::now();
        for _ in 0..1000 {
            p.frame();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}

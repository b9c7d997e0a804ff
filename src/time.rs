use std::time::{Duration, Instant};

enum Clock {
    Wall { last: Instant },
    Fixed { step: Duration },
}

/// Frame clock. Wall mode measures real time between ticks; fixed mode
/// advances by a constant step, which keeps headless previews deterministic.
pub struct Time {
    clock: Clock,
    elapsed: Duration,
    max_delta: Option<Duration>,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        Self::with_clock(Clock::Wall { last: Instant::now() })
    }

    pub fn fixed(step_seconds: f32) -> Self {
        let step = Duration::from_secs_f32(step_seconds.max(0.0));
        Self::with_clock(Clock::Fixed { step })
    }

    fn with_clock(clock: Clock) -> Self {
        Self { clock, elapsed: Duration::ZERO, max_delta: None, delta: Duration::ZERO }
    }

    /// Clamps every measured delta to `seconds`. Non-positive or non-finite values disable the clamp.
    pub fn with_max_delta(mut self, seconds: f32) -> Self {
        self.max_delta = (seconds > 0.0 && seconds.is_finite()).then(|| Duration::from_secs_f32(seconds));
        self
    }

    pub fn tick(&mut self) {
        let raw = match &mut self.clock {
            Clock::Wall { last } => {
                let now = Instant::now();
                let delta = now - *last;
                *last = now;
                delta
            }
            Clock::Fixed { step } => *step,
        };
        self.delta = match self.max_delta {
            Some(max) if raw > max => {
                log::debug!("Frame delta {:.3}s clamped to {:.3}s", raw.as_secs_f32(), max.as_secs_f32());
                max
            }
            _ => raw,
        };
        self.elapsed += self.delta;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

use std::time::{Duration, Instant};

/// How the per-frame time value is produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSettings {
    /// Multiplier applied to elapsed seconds.
    pub time_scale: f32,
    /// Time reported on the first frame.
    pub start_offset: f32,
    /// Advance by a constant step per frame instead of following the wall clock.
    pub fixed_step: Option<Duration>,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            start_offset: 0.0,
            fixed_step: None,
        }
    }
}

/// Snapshot of the time state supplied to the kernel uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Time value handed to the kernel.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces the time sample for the next frame. Called once per frame.
    fn sample(&mut self) -> TimeSample;
}

/// Scaled seconds since the first sample, following the monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Option<Instant>,
    frame: u64,
    scale: f64,
    offset: f64,
}

impl SystemTimeSource {
    pub fn new(scale: f32, offset: f32) -> Self {
        Self {
            origin: None,
            frame: 0,
            scale: f64::from(scale),
            offset: f64::from(offset),
        }
    }

    fn sample_at(&mut self, now: Instant) -> TimeSample {
        let origin = *self.origin.get_or_insert(now);
        let elapsed = now.saturating_duration_since(origin).as_secs_f64();
        let seconds = (self.offset + elapsed * self.scale) as f32;
        let sample = TimeSample::new(seconds, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = None;
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        self.sample_at(Instant::now())
    }
}

/// Deterministic clock advancing by `step × scale` per frame.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepTimeSource {
    step: f64,
    offset: f64,
    frame: u64,
}

impl FixedStepTimeSource {
    pub fn new(step: Duration, scale: f32, offset: f32) -> Self {
        Self {
            step: step.as_secs_f64() * f64::from(scale),
            offset: f64::from(offset),
            frame: 0,
        }
    }
}

impl TimeSource for FixedStepTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        // Multiply instead of accumulating so long sessions don't drift.
        let seconds = (self.offset + self.step * self.frame as f64) as f32;
        let sample = TimeSample::new(seconds, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

pub fn time_source_for(settings: &ClockSettings) -> BoxedTimeSource {
    match settings.fixed_step {
        Some(step) => Box::new(FixedStepTimeSource::new(
            step,
            settings.time_scale,
            settings.start_offset,
        )),
        None => Box::new(SystemTimeSource::new(
            settings.time_scale,
            settings.start_offset,
        )),
    }
}

/// Per-frame time driver for the window loop; advances exactly once per `tick`.
pub struct FrameClock {
    source: BoxedTimeSource,
}

impl FrameClock {
    pub fn new(settings: &ClockSettings) -> Self {
        Self {
            source: time_source_for(settings),
        }
    }

    pub fn tick(&mut self) -> TimeSample {
        self.source.sample()
    }

    /// Ticks only if `acquire` succeeds, so a dropped frame doesn't consume a
    /// time step.
    pub fn tick_after<F, E>(
        &mut self,
        acquire: impl FnOnce() -> Result<F, E>,
    ) -> Result<(F, TimeSample), E> {
        let frame = acquire()?;
        Ok((frame, self.tick()))
    }

    pub fn reset(&mut self) {
        self.source.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_source_starts_at_offset_and_scales() {
        let mut source = SystemTimeSource::new(2.0, 5.0);
        let start = Instant::now();
        let first = source.sample_at(start);
        assert_eq!(first, TimeSample::new(5.0, 0));
        let second = source.sample_at(start + Duration::from_millis(500));
        assert!((second.seconds - 6.0).abs() < 1e-6);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn system_source_never_goes_backwards() {
        let mut source = SystemTimeSource::new(1.0, 0.0);
        let start = Instant::now();
        let mut previous = source.sample_at(start).seconds;
        for step in 1..20 {
            let sample = source.sample_at(start + Duration::from_millis(step * 16));
            assert!(sample.seconds >= previous);
            previous = sample.seconds;
        }
    }

    #[test]
    fn fixed_step_advances_once_per_sample() {
        let mut source = FixedStepTimeSource::new(Duration::from_millis(250), 1.0, 1.0);
        let samples: Vec<_> = (0..4).map(|_| source.sample()).collect();
        let seconds: Vec<_> = samples.iter().map(|s| s.seconds).collect();
        assert_eq!(seconds, vec![1.0, 1.25, 1.5, 1.75]);
        assert_eq!(samples[3].frame_index, 3);

        source.reset();
        assert_eq!(source.sample(), TimeSample::new(1.0, 0));
    }

    #[test]
    fn fixed_step_honours_time_scale() {
        let mut source = FixedStepTimeSource::new(Duration::from_secs(1), -0.5, 0.0);
        source.sample();
        assert_eq!(source.sample().seconds, -0.5);
    }

    #[test]
    fn settings_pick_source_kind() {
        let settings = ClockSettings {
            fixed_step: Some(Duration::from_millis(100)),
            ..ClockSettings::default()
        };
        let mut source = time_source_for(&settings);
        source.sample();
        assert!((source.sample().seconds - 0.1).abs() < 1e-6);
    }

    #[test]
    fn frame_clock_counts_frames_and_resets() {
        let settings = ClockSettings {
            time_scale: 2.0,
            start_offset: 3.0,
            fixed_step: Some(Duration::from_millis(500)),
        };
        let mut clock = FrameClock::new(&settings);
        assert_eq!(clock.tick(), TimeSample::new(3.0, 0));
        assert_eq!(clock.tick(), TimeSample::new(4.0, 1));
        clock.reset();
        assert_eq!(clock.tick(), TimeSample::new(3.0, 0));
    }

    #[test]
    fn failed_acquire_does_not_advance_the_clock() {
        let settings = ClockSettings {
            fixed_step: Some(Duration::from_millis(250)),
            ..ClockSettings::default()
        };
        let mut clock = FrameClock::new(&settings);

        let lost: Result<((), TimeSample), &str> = clock.tick_after(|| Err("lost"));
        assert_eq!(lost, Err("lost"));
        let timeout: Result<((), TimeSample), &str> = clock.tick_after(|| Err("timeout"));
        assert!(timeout.is_err());

        let (frame, sample) = clock.tick_after(|| Ok::<_, &str>(7)).unwrap();
        assert_eq!(frame, 7);
        assert_eq!(sample, TimeSample::new(0.0, 0));
        let (_, sample) = clock.tick_after(|| Ok::<_, &str>(8)).unwrap();
        assert_eq!(sample, TimeSample::new(0.25, 1));
    }
}

/// Polled linear ramp from `start` to `end` over `duration_ms`, optionally held
/// at `start` for `delay_ms` first. Nothing fires on its own: the owner calls
/// [`Interpolator::advance`] each frame and reads [`Interpolator::value`].
/// Dropping the interpolator cancels it.
#[derive(Clone, Debug, PartialEq)]
pub struct Interpolator {
    start: f64,
    end: f64,
    duration_ms: f64,
    delay_ms: f64,
    // Time since arming, delay included.
    clock_ms: f64,
    frozen: bool,
}

impl Interpolator {
    pub fn new(start: f64, end: f64, duration_ms: f64) -> Self {
        Self {
            start,
            end,
            duration_ms: duration_ms.max(0.0),
            delay_ms: 0.0,
            clock_ms: 0.0,
            frozen: false,
        }
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    #[inline]
    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Time spent on the ramp itself, clamped to `[0, duration_ms]`.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        (self.clock_ms - self.delay_ms).clamp(0.0, self.duration_ms)
    }

    pub fn advance(&mut self, dt_ms: f64) {
        if self.frozen || dt_ms <= 0.0 || !dt_ms.is_finite() {
            return;
        }
        self.clock_ms = (self.clock_ms + dt_ms).min(self.delay_ms + self.duration_ms);
    }

    /// Ramp progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.clock_ms < self.delay_ms {
            return 0.0;
        }
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        self.elapsed_ms() / self.duration_ms
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.start + (self.end - self.start) * self.progress()
    }

    #[inline]
    pub fn is_delaying(&self) -> bool {
        self.clock_ms < self.delay_ms
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.clock_ms >= self.delay_ms + self.duration_ms
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn resume(&mut self) {
        self.frozen = false;
    }
}

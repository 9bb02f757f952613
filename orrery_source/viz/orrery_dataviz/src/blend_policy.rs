/// Domain interval, inclusive start and exclusive end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendWindow {
    pub start: f64,
    pub end: f64,
}

impl BlendWindow {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    // Position inside the window in [0, 1]; empty windows jump straight to 1.
    fn progress(&self, x: f64) -> f64 {
        let width = self.end - self.start;
        if width <= 0.0 {
            return 1.0;
        }
        ((x - self.start) / width).clamp(0.0, 1.0)
    }
}

/// Maps a domain position to a scenario blend ratio (1 = scenario B).
///
/// Ratio is 1 before the good window, ramps to 0 across it, holds 0 until the
/// bad window, ramps back to 1 across it and holds 1 afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendPolicy {
    pub good: BlendWindow,
    pub bad: BlendWindow,
}

impl Default for BlendPolicy {
    fn default() -> Self {
        Self {
            good: BlendWindow::new(2150.0, 2155.0),
            bad: BlendWindow::new(2190.0, 2195.0),
        }
    }
}

impl BlendPolicy {
    pub fn ratio_at(&self, x: f64) -> f64 {
        if x < self.good.start {
            1.0
        } else if x < self.good.end {
            1.0 - self.good.progress(x)
        } else if x < self.bad.start {
            0.0
        } else if x < self.bad.end {
            self.bad.progress(x)
        } else {
            1.0
        }
    }
}

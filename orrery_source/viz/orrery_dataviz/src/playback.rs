use log::debug;
use orrery_animation::Interpolator;
use orrery_state::{StateBus, channels};

use crate::{BlendPolicy, Parameter, ScenarioBlender};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Which of the two curves waits out the stagger delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StaggeredCurve {
    /// The value curve (year and blend) lags the reveal curve.
    #[default]
    Value,
    /// The reveal curve lags the value curve.
    Reveal,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackConfig {
    pub domain_start: f64,
    pub domain_end: f64,
    pub years_per_minute: f64,
    /// Program time (seconds) at which this component's window opens.
    pub start_time: f64,
    /// Length of the window in program seconds.
    pub duration: f64,
    pub stagger_delay_ms: f64,
    pub staggered: StaggeredCurve,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            domain_start: 1850.0,
            domain_end: 2300.0,
            years_per_minute: 25.0,
            start_time: 0.0,
            duration: 18.0 * 60.0,
            stagger_delay_ms: 4000.0,
            staggered: StaggeredCurve::Value,
        }
    }
}

impl PlaybackConfig {
    #[inline]
    pub fn span(&self) -> f64 {
        self.domain_end - self.domain_start
    }

    /// Sets the window length and derives the playback rate so the whole
    /// domain plays out over it.
    pub fn with_duration(mut self, duration: f64) -> Self {
        if duration > 0.0 {
            self.duration = duration;
            self.years_per_minute = self.span() / (duration / 60.0);
        }
        self
    }

    /// Maps program time onto `[0, 1]` of the window (unclamped).
    pub fn normalize_time(&self, t: f64) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (t - self.start_time) / self.duration
    }
}

/// Time-synchronized two-curve playback over the data domain.
///
/// The reveal curve drives what part of the data is shown; the value curve
/// drives the published year and the scenario blend. One of them starts
/// `stagger_delay_ms` late. Both are polled from [`PlaybackEngine::tick`], so
/// `pause` and `stop` take effect immediately.
pub struct PlaybackEngine {
    config: PlaybackConfig,
    policy: BlendPolicy,
    state: PlaybackState,
    reveal: Option<Interpolator>,
    value: Option<Interpolator>,
    position: f64,
    year: i64,
    reveal_year: i64,
    blender: Option<ScenarioBlender>,
    last_time: Option<f64>,
    /// Set when a rewind before the window interrupted playback.
    resume_at_start: bool,
}

impl PlaybackEngine {
    pub fn new(config: PlaybackConfig, policy: BlendPolicy) -> Self {
        Self {
            config,
            policy,
            state: PlaybackState::Stopped,
            reveal: None,
            value: None,
            position: config.domain_start,
            year: config.domain_start.round() as i64,
            reveal_year: config.domain_start.round() as i64,
            blender: None,
            last_time: None,
            resume_at_start: false,
        }
    }

    #[inline]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current value-curve position in domain units.
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn year(&self) -> i64 {
        self.year
    }

    #[inline]
    pub fn reveal_year(&self) -> i64 {
        self.reveal_year
    }

    #[inline]
    pub fn reveal_position(&self) -> Option<f64> {
        self.reveal.as_ref().map(Interpolator::value)
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.reveal.is_some() || self.value.is_some()
    }

    #[inline]
    pub fn blender(&self) -> Option<&ScenarioBlender> {
        self.blender.as_ref()
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        self.blender.is_some()
    }

    /// Installs loaded data and blends it for the current position.
    pub fn set_data(&mut self, blender: ScenarioBlender) {
        self.blender = Some(blender);
        self.apply_blend(self.position);
    }

    /// From `Paused` with armed curves: resume where they froze. Otherwise
    /// re-seek from the current program time.
    pub fn play(&mut self, bus: &StateBus) {
        let resume = self.state == PlaybackState::Paused && self.is_armed();
        self.state = PlaybackState::Playing;
        self.resume_at_start = false;
        if resume {
            for curve in self.reveal.iter_mut().chain(self.value.iter_mut()) {
                curve.resume();
            }
            debug!("[dataviz] resumed at {:.2}", self.position);
            return;
        }

        let t = bus
            .get_f64(channels::TIME)
            .unwrap_or(self.config.start_time);
        self.seek_normalize(self.config.normalize_time(t));
    }

    pub fn pause(&mut self) {
        self.resume_at_start = false;
        if self.state != PlaybackState::Playing || !self.is_armed() {
            return;
        }
        for curve in self.reveal.iter_mut().chain(self.value.iter_mut()) {
            curve.freeze();
        }
        self.state = PlaybackState::Paused;
    }

    pub fn stop(&mut self) {
        self.resume_at_start = false;
        self.state = PlaybackState::Stopped;
        self.reveal = None;
        self.value = None;
    }

    /// Re-arms both curves from `domain_start + v * span` to `domain_end`.
    /// Curves armed while not playing start frozen.
    pub fn seek_normalize(&mut self, v: f64) {
        let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let from = self.config.domain_start + v * self.config.span();
        let to = self.config.domain_end;
        let seconds = if self.config.years_per_minute > 0.0 {
            (to - from) * 60.0 / self.config.years_per_minute
        } else {
            0.0
        };
        let duration_ms = seconds * 1000.0;

        let delay = self.config.stagger_delay_ms;
        let (reveal_delay, value_delay) = match self.config.staggered {
            StaggeredCurve::Value => (0.0, delay),
            StaggeredCurve::Reveal => (delay, 0.0),
        };
        let mut reveal = Interpolator::new(from, to, duration_ms).with_delay(reveal_delay);
        let mut value = Interpolator::new(from, to, duration_ms).with_delay(value_delay);
        if self.state != PlaybackState::Playing {
            reveal.freeze();
            value.freeze();
        }
        self.reveal = Some(reveal);
        self.value = Some(value);

        self.position = from;
        self.year = from.round() as i64;
        self.reveal_year = self.year;
        self.apply_blend(from);
        debug!("[dataviz] seek {v:.3} -> {from:.1} over {seconds:.1}s");
    }

    /// Reacts to a program time sample. With `seek` set, re-seeks to the
    /// matching position, or rewinds and stops if the window has not opened.
    /// Crossing `start_time` from below restarts from the beginning, and
    /// resumes playing if a rewind had interrupted it.
    pub fn on_time(&mut self, t: f64, bus: &StateBus) {
        let start = self.config.start_time;
        if bus.get_bool(channels::SEEK).unwrap_or(false) {
            if t > start {
                self.seek_normalize(self.config.normalize_time(t));
            } else {
                let resume = self.resume_at_start || self.state == PlaybackState::Playing;
                self.position = self.config.domain_start;
                self.year = self.config.domain_start.round() as i64;
                self.stop();
                self.resume_at_start = resume;
            }
        }

        if let Some(last) = self.last_time
            && t > start
            && last < start
        {
            if self.state == PlaybackState::Playing || self.resume_at_start {
                self.resume_at_start = false;
                self.state = PlaybackState::Playing;
                self.seek_normalize(self.config.normalize_time(t));
                debug!("[dataviz] window opened at {t:.1}s; playing");
            } else {
                self.seek_normalize(0.0);
            }
        }
        self.last_time = Some(t);
    }

    /// Advances both curves and publishes `year` plus the per-parameter
    /// values for it. Publishing is skipped until data is loaded.
    pub fn tick(&mut self, dt_ms: f64, bus: &StateBus) {
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.advance(dt_ms);
            self.reveal_year = reveal.value().round() as i64;
        }
        if let Some(value) = self.value.as_mut() {
            value.advance(dt_ms);
            let position = value.value();
            self.position = position;
            self.year = position.round() as i64;
            self.apply_blend(position);
        }
        self.publish(bus);
    }

    fn apply_blend(&mut self, position: f64) {
        let ratio = self.policy.ratio_at(position);
        if let Some(blender) = self.blender.as_mut() {
            blender.set_active_data(ratio);
        }
    }

    fn publish(&self, bus: &StateBus) {
        let Some(blender) = self.blender.as_ref() else {
            return;
        };
        bus.set(channels::YEAR, self.year);

        let offset = self.year as f64 - self.config.domain_start;
        if offset < 0.0 {
            return;
        }
        let index = offset as usize;
        for parameter in Parameter::PUBLISHED {
            if let Some(value) = blender.active().value(parameter, index)
                && value.is_finite()
            {
                bus.set(parameter.as_str(), value);
            }
        }
    }
}

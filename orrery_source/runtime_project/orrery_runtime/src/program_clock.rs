use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use log::info;
use orrery_scene::{Controller, FrameContext};
use orrery_state::{StateBus, Subscription, channels};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockConfig {
    /// Program length in seconds.
    pub duration_s: f64,
    pub autoplay: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            duration_s: 32.0 * 60.0,
            autoplay: true,
        }
    }
}

/// Owner of global program time. Writes `time` (seconds) every frame while
/// playing and follows `playRequested` / `pauseRequested`.
pub struct ProgramClock {
    time_s: f64,
    duration_s: f64,
    playing: Rc<Cell<bool>>,
    subscriptions: Vec<Subscription>,
}

impl ProgramClock {
    pub fn new(bus: &StateBus, config: ClockConfig) -> Self {
        let playing = Rc::new(Cell::new(config.autoplay));

        let on_play = {
            let playing = playing.clone();
            bus.on(channels::PLAY_REQUESTED, move |_| playing.set(true))
        };
        let on_pause = {
            let playing = playing.clone();
            bus.on(channels::PAUSE_REQUESTED, move |_| playing.set(false))
        };
        bus.set(channels::TIME, 0.0);

        Self {
            time_s: 0.0,
            duration_s: config.duration_s.max(0.0),
            playing,
            subscriptions: vec![on_play, on_pause],
        }
    }

    #[inline]
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    #[inline]
    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Scrubs to `t` seconds: writes `seek=true`, `time=t`, `seek=false` so
    /// time consumers re-seek instead of treating the jump as playback.
    pub fn seek_to(&mut self, bus: &StateBus, t: f64) {
        self.time_s = t.clamp(0.0, self.duration_s);
        bus.set(channels::SEEK, true);
        bus.set(channels::TIME, self.time_s);
        bus.set(channels::SEEK, false);
    }

    /// Drops the bus subscriptions.
    pub fn detach(&mut self, bus: &StateBus) {
        for sub in self.subscriptions.drain(..) {
            bus.off(&sub);
        }
    }
}

impl Controller for ProgramClock {
    fn update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        if !self.playing.get() {
            return Ok(());
        }
        self.time_s = (self.time_s + ctx.delta_ms / 1000.0).min(self.duration_s);
        ctx.bus.set(channels::TIME, self.time_s);
        if self.time_s >= self.duration_s {
            self.playing.set(false);
            info!("[clock] program finished at {:.1}s", self.time_s);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use orrery_scene::SceneGraph;
    use orrery_variant::Variant;

    use super::*;

    fn tick(clock: &mut ProgramClock, bus: &StateBus, delta_ms: f64) {
        let mut graph = SceneGraph::new();
        let mut ctx = FrameContext {
            time_ms: 0.0,
            delta_ms,
            graph: &mut graph,
            bus,
        };
        clock.update(&mut ctx).unwrap();
    }

    #[test]
    fn advances_time_while_playing() {
        let bus = StateBus::new();
        let mut clock = ProgramClock::new(&bus, ClockConfig::default());
        assert_eq!(bus.get_f64("time"), Some(0.0));

        tick(&mut clock, &bus, 500.0);
        tick(&mut clock, &bus, 500.0);
        assert_eq!(bus.get_f64("time"), Some(1.0));
    }

    #[test]
    fn pause_and_play_requests() {
        let bus = StateBus::new();
        let mut clock = ProgramClock::new(&bus, ClockConfig::default());

        bus.trigger("pauseRequested");
        tick(&mut clock, &bus, 1000.0);
        assert_eq!(clock.time_s(), 0.0);

        bus.trigger("playRequested");
        tick(&mut clock, &bus, 1000.0);
        assert_eq!(clock.time_s(), 1.0);
    }

    #[test]
    fn stops_at_program_end() {
        let bus = StateBus::new();
        let mut clock = ProgramClock::new(
            &bus,
            ClockConfig {
                duration_s: 2.0,
                autoplay: true,
            },
        );
        tick(&mut clock, &bus, 5000.0);
        assert_eq!(clock.time_s(), 2.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn seek_writes_flag_around_time() {
        let bus = Rc::new(StateBus::new());
        let mut clock = ProgramClock::new(&bus, ClockConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            bus.on("seek", move |v| seen.borrow_mut().push(v.clone()));
        }
        let seek_during_time = Rc::new(Cell::new(None));
        {
            let seek_during_time = seek_during_time.clone();
            let bus_ref = Rc::downgrade(&bus);
            bus.on("time", move |_| {
                if let Some(bus) = bus_ref.upgrade() {
                    seek_during_time.set(bus.get_bool("seek"));
                }
            });
        }

        clock.seek_to(&bus, 90.0);
        assert_eq!(bus.get_f64("time"), Some(90.0));
        assert_eq!(bus.get_bool("seek"), Some(false));
        assert_eq!(*seen.borrow(), vec![Variant::Bool(true), Variant::Bool(false)]);
        assert_eq!(seek_during_time.get(), Some(true));
    }
}

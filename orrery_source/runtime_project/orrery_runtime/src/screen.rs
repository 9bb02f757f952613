use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;
use orrery_nodes::{NodeData, SceneNode, ScreenSurface};
use orrery_scene::{Built, Controller, FactoryContext, FrameContext, Spec};
use orrery_state::{StateBus, Subscription};
use orrery_variant::Variant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MediaPlayback {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Observable state of one screen. Decoding and texture upload happen in the
/// render backend, which reads this.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScreenState {
    pub source: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    /// Media position in seconds.
    pub play_time: f64,
    pub playback: MediaPlayback,
    pub html_updates: u32,
}

impl ScreenState {
    /// Applies one channel payload: objects carry media commands, strings
    /// become overlay text.
    pub fn apply(&mut self, payload: &Variant) {
        match payload {
            Variant::Object(_) => self.apply_props(payload),
            Variant::String(text) => self.set_text(text),
            _ => {}
        }
    }

    fn apply_props(&mut self, props: &Variant) {
        if let Some(url) = props.get("url").and_then(Variant::as_str) {
            self.set_source(url);
        }
        if let Some(html) = props.get("html").and_then(Variant::as_str) {
            self.set_html(html.to_string());
        }
        if let Some(t) = props.get("requestedPlayTime").and_then(Variant::as_f64_lossy) {
            if self.source.is_some() {
                self.play_time = t.max(0.0);
            }
        }
        match props.get("playState").and_then(Variant::as_str) {
            Some("play") => self.play(),
            Some("pause") => self.pause(),
            _ => {}
        }
    }

    /// New source starts playing from the top.
    pub fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.play_time = 0.0;
        self.playback = MediaPlayback::Playing;
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text.as_deref() == Some(text) {
            return;
        }
        self.text = Some(text.to_string());
        self.set_html(format!("<h1>{text}</h1>"));
    }

    fn set_html(&mut self, html: String) {
        self.html = Some(html);
        self.html_updates += 1;
    }

    pub fn play(&mut self) {
        if self.source.is_some() {
            self.playback = MediaPlayback::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.source.is_some() {
            self.playback = MediaPlayback::Paused;
        }
    }
}

/// Listens on the screen's channel and tracks media position per frame.
pub struct ScreenController {
    channel: String,
    state: Rc<RefCell<ScreenState>>,
    bus: Weak<StateBus>,
    subscription: Subscription,
}

impl ScreenController {
    pub fn new(ctx: &FactoryContext, channel: &str, initial_source: Option<&str>) -> Self {
        let state = Rc::new(RefCell::new(ScreenState::default()));
        if let Some(path) = initial_source {
            state.borrow_mut().set_source(path);
        }

        let sink = state.clone();
        let subscription = ctx
            .bus
            .on(channel, move |payload| sink.borrow_mut().apply(payload));
        debug!("[screen] watching channel `{channel}`");

        Self {
            channel: channel.to_string(),
            state,
            bus: Rc::downgrade(&ctx.bus),
            subscription,
        }
    }

    #[inline]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn state(&self) -> ScreenState {
        self.state.borrow().clone()
    }
}

impl Controller for ScreenController {
    fn update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.playback == MediaPlayback::Playing {
            state.play_time += ctx.delta_ms / 1000.0;
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

impl Drop for ScreenController {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.off(&self.subscription);
        }
    }
}

pub(crate) fn build_screen(ctx: &FactoryContext, spec: &Spec) -> anyhow::Result<Built> {
    let name = spec.name().unwrap_or("movieScreen");
    let channel = spec.str_field("channel").unwrap_or(name);

    let mut surface = ScreenSurface::new(channel);
    if let Some(w) = spec.f64_field("width") {
        surface.width = w as f32;
    }
    if let Some(h) = spec.f64_field("height") {
        surface.height = h as f32;
    }

    let source = spec
        .str_field("path")
        .map(|p| ctx.resolve_path(p).to_string_lossy().into_owned());
    let controller = ScreenController::new(ctx, channel, source.as_deref());

    Ok(Built::node(SceneNode::new(NodeData::Screen(surface))).with_controller(controller))
}

#[cfg(test)]
mod tests {
    use orrery_state::StateBus;

    use super::*;

    fn ctx() -> FactoryContext {
        FactoryContext::new(StateBus::shared(), "/show")
    }

    #[test]
    fn object_payload_switches_source_and_play_state() {
        let ctx = ctx();
        let screen = ScreenController::new(&ctx, "mainScreen", None);

        ctx.bus.set(
            "mainScreen",
            Variant::object_from([("url", Variant::from("videos/intro.mp4"))]),
        );
        let state = screen.state();
        assert_eq!(state.source.as_deref(), Some("videos/intro.mp4"));
        assert_eq!(state.playback, MediaPlayback::Playing);

        ctx.bus.set(
            "mainScreen",
            Variant::object_from([
                ("requestedPlayTime", Variant::from(12.0)),
                ("playState", Variant::from("pause")),
            ]),
        );
        let state = screen.state();
        assert_eq!(state.play_time, 12.0);
        assert_eq!(state.playback, MediaPlayback::Paused);
    }

    #[test]
    fn play_commands_need_a_source() {
        let mut state = ScreenState::default();
        state.apply(&Variant::object_from([("playState", "play")]));
        assert_eq!(state.playback, MediaPlayback::Idle);
    }

    #[test]
    fn repeated_text_is_ignored() {
        let mut state = ScreenState::default();
        state.apply(&Variant::from("Year 2100"));
        state.apply(&Variant::from("Year 2100"));
        assert_eq!(state.html.as_deref(), Some("<h1>Year 2100</h1>"));
        assert_eq!(state.html_updates, 1);

        state.apply(&Variant::from("Year 2101"));
        assert_eq!(state.html_updates, 2);
    }

    #[test]
    fn factory_uses_name_as_default_channel() {
        let ctx = ctx();
        let built = build_screen(&ctx, &Spec::new("Screen2").with("name", "wall")).unwrap();
        match &built.node.data {
            NodeData::Screen(surface) => assert_eq!(surface.channel.as_ref(), "wall"),
            other => panic!("unexpected node data {other:?}"),
        }
        assert!(built.controller.is_some());
        assert_eq!(ctx.bus.subscriber_count("wall"), 1);
    }

    #[test]
    fn dropping_the_screen_stops_listening() {
        let ctx = ctx();
        let screen = ScreenController::new(&ctx, "wall", None);
        assert_eq!(ctx.bus.subscriber_count("wall"), 1);
        drop(screen);
        assert_eq!(ctx.bus.subscriber_count("wall"), 0);
        ctx.bus.set("wall", "ignored");
    }

    #[test]
    fn factory_passes_urls_through_and_roots_res_paths() {
        let ctx = ctx();
        let source = |path: &str| {
            let built = build_screen(&ctx, &Spec::new("Screen").with("path", path)).unwrap();
            let controller = built.controller.unwrap();
            let screen = controller.as_any().downcast_ref::<ScreenController>().unwrap();
            screen.state().source
        };
        assert_eq!(source("res://videos/a.mp4").as_deref(), Some("/show/videos/a.mp4"));
        assert_eq!(
            source("https://cdn.example/a.mp4").as_deref(),
            Some("https://cdn.example/a.mp4")
        );
    }

    #[test]
    fn playing_media_advances_with_frames() {
        let ctx = ctx();
        let mut screen = ScreenController::new(&ctx, "s", Some("/show/a.mp4"));
        let mut graph = orrery_scene::SceneGraph::new();
        let mut frame = FrameContext {
            time_ms: 0.0,
            delta_ms: 250.0,
            graph: &mut graph,
            bus: &ctx.bus,
        };
        screen.update(&mut frame).unwrap();
        assert_eq!(screen.state().play_time, 0.25);
    }
}

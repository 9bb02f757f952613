use std::any::Any;
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use log::{info, warn};
use orrery_ids::NodeID;
use orrery_nodes::{NodeData, SceneNode};
use orrery_scene::{Built, Controller, FactoryContext, FrameContext, Spec};
use orrery_state::{StateBus, Subscription, channels};
use orrery_variant::Variant;

use crate::{BlendPolicy, JsonFileSource, PendingFeed, PlaybackConfig, PlaybackEngine, ScenarioBlender};

pub const DEFAULT_DATA_PATH: &str = "res://cmp_data.json";

/// Drives a [`PlaybackEngine`] from program time and spins its anchor node.
pub struct DataVizController {
    engine: Rc<RefCell<PlaybackEngine>>,
    feed: Option<PendingFeed>,
    bus: Weak<StateBus>,
    node: NodeID,
    /// Degrees per second around Y.
    rotation_speed: f64,
    visible: bool,
    subscriptions: Vec<Subscription>,
}

impl DataVizController {
    pub fn new(bus: &Rc<StateBus>, config: PlaybackConfig, feed: PendingFeed) -> Self {
        let engine = Rc::new(RefCell::new(PlaybackEngine::new(config, BlendPolicy::default())));
        let subscriptions = vec![
            Self::subscribe(bus, &engine, channels::TIME, |engine, payload, bus| {
                if let Some(t) = payload.as_f64_lossy() {
                    engine.on_time(t, bus);
                }
            }),
            Self::subscribe(bus, &engine, channels::PLAY_REQUESTED, |engine, _, bus| {
                engine.play(bus)
            }),
            Self::subscribe(bus, &engine, channels::PAUSE_REQUESTED, |engine, _, _| {
                engine.pause()
            }),
        ];

        let mut controller = Self {
            engine,
            feed: Some(feed),
            bus: Rc::downgrade(bus),
            node: NodeID::nil(),
            rotation_speed: 0.0,
            visible: false,
            subscriptions,
        };
        controller.set_visible(true, bus);
        controller
    }

    fn subscribe(
        bus: &Rc<StateBus>,
        engine: &Rc<RefCell<PlaybackEngine>>,
        channel: &'static str,
        handle: impl Fn(&mut PlaybackEngine, &Variant, &StateBus) + 'static,
    ) -> Subscription {
        let engine = Rc::downgrade(engine);
        let weak_bus = Rc::downgrade(bus);
        bus.on(channel, move |payload| {
            let (Some(engine), Some(bus)) = (engine.upgrade(), weak_bus.upgrade()) else {
                return;
            };
            match engine.try_borrow_mut() {
                Ok(mut engine) => handle(&mut engine, payload, &bus),
                Err(_) => warn!("[dataviz] `{channel}` arrived while the engine was busy; dropped"),
            };
        })
    }

    pub fn with_rotation_speed(mut self, degrees_per_second: f64) -> Self {
        self.rotation_speed = degrees_per_second;
        self
    }

    #[inline]
    pub fn engine(&self) -> Ref<'_, PlaybackEngine> {
        self.engine.borrow()
    }

    #[inline]
    pub fn node(&self) -> NodeID {
        self.node
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn rotation_speed(&self) -> f64 {
        self.rotation_speed
    }

    /// Hidden visualizations stop; shown ones play.
    pub fn set_visible(&mut self, visible: bool, bus: &StateBus) {
        self.visible = visible;
        let mut engine = self.engine.borrow_mut();
        if visible {
            engine.play(bus);
        } else {
            engine.stop();
        }
    }

    pub fn detach(&mut self, bus: &StateBus) {
        for sub in self.subscriptions.drain(..) {
            bus.off(&sub);
        }
    }

    fn poll_feed(&mut self) {
        let Some(feed) = self.feed.as_mut() else {
            return;
        };
        let loaded = match feed.poll() {
            Ok(None) if feed.is_pending() => return,
            Ok(None) => None,
            Ok(Some(data)) => match ScenarioBlender::new(data) {
                Ok(blender) => Some(blender),
                Err(err) => {
                    warn!("[dataviz] rejected scenario data: {err}");
                    None
                }
            },
            Err(err) => {
                warn!("[dataviz] data feed failed: {err}");
                None
            }
        };
        self.feed = None;

        if let Some(blender) = loaded {
            info!("[dataviz] {} samples loaded", blender.len());
            self.engine.borrow_mut().set_data(blender);
        }
    }
}

impl Controller for DataVizController {
    fn attach(&mut self, node: NodeID) {
        self.node = node;
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        self.poll_feed();

        if let Some(node) = ctx.graph.get(self.node)
            && node.visible != self.visible
        {
            self.set_visible(node.visible, ctx.bus);
        }

        self.engine.borrow_mut().tick(ctx.delta_ms, ctx.bus);

        if self.rotation_speed != 0.0
            && let Some(node) = ctx.graph.get_mut(self.node)
        {
            let step = (self.rotation_speed.to_radians() * ctx.delta_ms / 1000.0) as f32;
            node.transform.rotation.y = (node.transform.rotation.y + step).rem_euclid(TAU);
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

impl Drop for DataVizController {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            self.detach(&bus);
        }
    }
}

pub(crate) fn playback_config(spec: &Spec) -> PlaybackConfig {
    let mut config = PlaybackConfig::default();
    if let Some(duration) = spec.f64_field("duration") {
        config = config.with_duration(duration);
    }
    if let Some(ypm) = spec.f64_field("yearsPerMinute").filter(|v| *v > 0.0) {
        config.years_per_minute = ypm;
    }
    if let Some(start) = spec.f64_field("startTime") {
        config.start_time = start;
    }
    if let Some(delay) = spec.f64_field("staggerDelayMs").filter(|v| *v >= 0.0) {
        config.stagger_delay_ms = delay;
    }
    config
}

pub(crate) fn build_dataviz(ctx: &FactoryContext, spec: &Spec) -> anyhow::Result<Built> {
    let path = spec
        .str_field("data")
        .or_else(|| spec.str_field("path"))
        .unwrap_or(DEFAULT_DATA_PATH);
    let feed = PendingFeed::spawn(JsonFileSource::new(ctx.resolve_path(path)));

    let mut controller = DataVizController::new(&ctx.bus, playback_config(spec), feed)
        .with_rotation_speed(spec.f64_field("rotationSpeed").unwrap_or(0.0));
    let visible = spec.bool_field("visible").unwrap_or(true);
    if !visible {
        controller.set_visible(false, &ctx.bus);
    }

    let mut fields = BTreeMap::new();
    fields.insert(Arc::<str>::from("data"), Variant::from(path));
    let mut node = SceneNode::new(NodeData::Custom {
        type_tag: Arc::from("DataViz"),
        fields,
    });
    node.visible = visible;

    Ok(Built::node(node).with_controller(controller))
}

use std::any::Any;

use orrery_nodes::{NodeData, SceneNode};
use orrery_runtime::{
    ClockConfig, LoopError, MediaPlayback, NullRenderer, Runtime, RuntimeError, ScreenController,
};
use orrery_scene::{Built, Controller, FrameContext, SceneError};
use orrery_variant::Variant;

const SCENE: &str = r#"[
    {"type": "PointLight", "name": "sun", "position": [0, 100, 0]},
    {"type": "Group", "name": "stage", "rot": [0, 180, 0], "children": [
        {"type": "Screen2", "name": "mainScreen", "path": "res://videos/intro.mp4"},
        {"type": "Screen", "name": "caption", "channel": "captions"}
    ]},
    {"type": "Axes", "parent": "debug", "visible": false}
]"#;

fn runtime() -> Runtime {
    let mut runtime = Runtime::new("/show").unwrap();
    runtime
        .install_clock(ClockConfig {
            duration_s: 60.0,
            autoplay: true,
        })
        .unwrap();
    runtime
}

#[test]
fn scene_loads_and_screens_become_controllers() {
    let mut rt = runtime();
    let doc = Variant::from_json_str(SCENE).unwrap();
    let assembly = rt.load_scene(&doc).unwrap();

    assert_eq!(assembly.roots.len(), 3);
    assert!(assembly.controllers.is_empty());
    assert_eq!(rt.animation.step_count(), 3);
    assert!(rt.graph.node_by_name("debug").unwrap().implicit);

    let stage = rt.graph.find("stage").unwrap();
    assert_eq!(rt.graph.node_by_name("mainScreen").unwrap().parent, stage);
}

#[test]
fn frames_drive_clock_and_screens() {
    let mut rt = runtime();
    rt.load_scene(&Variant::from_json_str(SCENE).unwrap())
        .unwrap();

    let mut renderer = NullRenderer::new();
    for _ in 0..4 {
        rt.frame(250.0, &mut renderer);
    }
    assert_eq!(rt.bus.get_f64("time"), Some(1.0));
    assert_eq!(renderer.frames(), 4);

    rt.bus.set("captions", "Year 2100");
    rt.bus.trigger("pauseRequested");
    rt.frame(250.0, &mut renderer);
    assert_eq!(rt.bus.get_f64("time"), Some(1.0));

    let caption = rt
        .animation
        .controller_as::<ScreenController>("caption")
        .unwrap()
        .state();
    assert_eq!(caption.text.as_deref(), Some("Year 2100"));
    assert_eq!(caption.playback, MediaPlayback::Idle);

    let main = rt
        .animation
        .controller_as::<ScreenController>("mainScreen")
        .unwrap()
        .state();
    assert_eq!(main.source.as_deref(), Some("/show/videos/intro.mp4"));
    assert!((main.play_time - 1.25).abs() < 1e-9);
}

#[test]
fn seek_goes_through_the_clock() {
    let mut rt = runtime();
    assert!(rt.seek_to(30.0));
    assert_eq!(rt.bus.get_f64("time"), Some(30.0));
    assert_eq!(rt.bus.get_bool("seek"), Some(false));
    assert_eq!(rt.clock_mut().unwrap().time_s(), 30.0);
}

struct Faulty;

impl Controller for Faulty {
    fn update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        anyhow::bail!("data missing")
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn faulty_controller_is_isolated() {
    let mut rt = runtime();
    rt.registry_mut()
        .register("Faulty", |_, _| {
            Ok(Built::node(SceneNode::new(NodeData::Group)).with_controller(Faulty))
        })
        .unwrap();
    rt.load_scene(&Variant::from_json_str(r#"{"type": "Faulty", "name": "f"}"#).unwrap())
        .unwrap();

    let mut renderer = NullRenderer::new();
    rt.frame(1000.0, &mut renderer);
    assert_eq!(rt.bus.get_f64("time"), Some(1.0));
    assert_eq!(rt.animation.failures("f"), 1);
    assert_eq!(renderer.frames(), 1);
}

#[test]
fn clock_name_clash_is_a_loop_error() {
    let mut rt = runtime();
    rt.registry_mut()
        .register("Ticker", |_, _| {
            Ok(Built::node(SceneNode::new(NodeData::Group)).with_controller(Faulty))
        })
        .unwrap();
    let err = rt
        .load_scene(&Variant::from_json_str(r#"{"type": "Ticker", "name": "clock"}"#).unwrap())
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Loop(_)));
}

#[test]
fn unknown_type_aborts_load() {
    let mut rt = runtime();
    let err = rt
        .load_scene(&Variant::from_json_str(r#"{"type": "Hologram"}"#).unwrap())
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Scene(SceneError::UnknownType(_))));
}

#[test]
fn controller_name_clash_reverts_the_whole_scene() {
    let mut rt = runtime();
    let doc = Variant::from_json_str(
        r#"[{"type": "Screen", "name": "a"}, {"type": "Screen", "name": "clock"}]"#,
    )
    .unwrap();
    let err = rt.load_scene(&doc).unwrap_err();
    assert!(matches!(
        &err,
        RuntimeError::Loop(LoopError::DuplicateController(name)) if name == "clock"
    ));

    assert_eq!(rt.graph.len(), 1);
    assert_eq!(rt.animation.step_count(), 1);
    assert!(rt.graph.find("a").is_none());
    assert!(rt.graph.find("clock").is_none());
    assert_eq!(rt.bus.subscriber_count("a"), 0);
    assert_eq!(rt.bus.subscriber_count("clock"), 0);

    let retry = Variant::from_json_str(r#"[{"type": "Screen", "name": "a"}]"#).unwrap();
    rt.load_scene(&retry).unwrap();
    assert!(rt.animation.controller_as::<ScreenController>("a").is_some());
    assert_eq!(rt.bus.subscriber_count("a"), 1);
}

#[test]
fn rolled_back_screens_stop_listening() {
    let mut rt = runtime();
    let doc = Variant::from_json_str(
        r#"[{"type": "Group", "name": "g", "children": [
            {"type": "Screen", "name": "ghost"},
            {"type": "Axes", "name": "g"}
        ]}]"#,
    )
    .unwrap();
    let err = rt.load_scene(&doc).unwrap_err();
    assert!(matches!(err, RuntimeError::Scene(SceneError::DuplicateName(ref n)) if n == "g"));

    assert!(rt.graph.find("ghost").is_none());
    assert!(rt.graph.find("g").is_none());
    assert_eq!(rt.bus.subscriber_count("ghost"), 0);
    rt.bus.set("ghost", "nobody home");
}

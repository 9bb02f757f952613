use std::path::PathBuf;
use std::time::{Duration, Instant};

use orrery_dataviz::{DataVizController, Parameter, PlaybackState, ScenarioData};
use orrery_project::{load_presentation_toml, resolve_res_path};
use orrery_runtime::{ClockConfig, NullRenderer, Runtime};
use orrery_variant::Variant;

fn demo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../demos/imaginarium")
}

fn load_demo() -> Runtime {
    let root = demo_root();
    let config = load_presentation_toml(&root).unwrap();
    let scene = std::fs::read_to_string(resolve_res_path(&config.scene, &root)).unwrap();

    let mut rt = Runtime::new(&root).unwrap();
    orrery_dataviz::register_node_types(rt.registry_mut()).unwrap();
    rt.install_clock(ClockConfig {
        duration_s: config.program.duration,
        autoplay: config.program.autoplay,
    })
    .unwrap();
    let assembly = rt.load_scene(&Variant::from_json_str(&scene).unwrap()).unwrap();
    assert!(assembly.issues.is_empty(), "{:?}", assembly.issues);
    rt
}

fn viz(rt: &mut Runtime) -> &mut DataVizController {
    rt.animation.controller_as::<DataVizController>("cmp").unwrap()
}

#[test]
fn demo_scene_assembles() {
    let rt = load_demo();
    let station = rt.graph.find("station").unwrap();
    assert_eq!(rt.graph.node_by_name("mainScreen").unwrap().parent, station);
    for light in ["light1", "light2", "light3", "sun"] {
        assert!(rt.graph.find(light).is_some(), "{light} missing");
    }
    let cmp = rt.graph.find("cmp").unwrap();
    assert!(rt.graph.is_reachable(cmp));
    assert!(!rt.graph.is_visible_in_tree(rt.graph.find("xyz").unwrap()));
}

#[test]
fn dataviz_follows_program_time_once_data_arrives() {
    let mut rt = load_demo();
    let mut renderer = NullRenderer::new();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !viz(&mut rt).engine().has_data() {
        assert!(Instant::now() < deadline, "scenario data never arrived");
        rt.frame(16.0, &mut renderer);
        std::thread::sleep(Duration::from_millis(2));
    }

    // Window opens at 120 s and lasts 1080 s; halfway is 2075.
    assert!(rt.seek_to(120.0 + 540.0));
    rt.frame(16.0, &mut renderer);

    assert_eq!(viz(&mut rt).engine().state(), PlaybackState::Playing);
    assert_eq!(viz(&mut rt).engine().year(), 2075);
    assert_eq!(rt.bus.get_f64("year"), Some(2075.0));

    let raw = std::fs::read_to_string(demo_root().join("res/cmp_data.json")).unwrap();
    let data = ScenarioData::from_json_str(&raw).unwrap();
    // Before the good window the blend sits fully on scenario B.
    let expected = data.scenario_b.value(Parameter::Co2, 2075 - 1850).unwrap();
    assert!((rt.bus.get_f64("co2").unwrap() - expected).abs() < 1e-9);
}

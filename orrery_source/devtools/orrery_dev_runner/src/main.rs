mod runner;

use std::{env, fs, path::Path, path::PathBuf};

use anyhow::Context;
use log::{error, info, warn};
use orrery_project::{create_new_presentation, load_presentation_toml, resolve_res_path};
use orrery_runtime::{ClockConfig, Runtime};
use orrery_variant::Variant;

use crate::runner::HeadlessRunner;

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).cloned()
}

fn current_dir_fallback() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn run(root: &Path, seconds_override: Option<f64>) -> anyhow::Result<()> {
    let config = load_presentation_toml(root)
        .with_context(|| format!("loading presentation at {}", root.display()))?;
    info!("[runner] presentation `{}`", config.name);

    let scene_path = resolve_res_path(&config.scene, root);
    let scene_text = fs::read_to_string(&scene_path)
        .with_context(|| format!("reading scene {}", scene_path.display()))?;
    let document = Variant::from_json_str(&scene_text)
        .with_context(|| format!("parsing scene {}", scene_path.display()))?;

    let mut runtime = Runtime::new(root)?;
    orrery_dataviz::register_node_types(runtime.registry_mut())?;
    runtime.install_clock(ClockConfig {
        duration_s: config.program.duration,
        autoplay: config.program.autoplay,
    })?;

    let assembly = runtime.load_scene(&document)?;
    if !assembly.issues.is_empty() {
        warn!("[runner] scene loaded with {} issue(s)", assembly.issues.len());
    }
    if config.program.start_time > 0.0 {
        runtime.seek_to(config.program.start_time);
    }

    let seconds = seconds_override.unwrap_or(config.runner.seconds);
    let renderer = HeadlessRunner::new()
        .with_fps_cap(config.runner.fps)
        .run(&mut runtime, seconds);

    let stats = runtime.animation.stats();
    info!(
        "[runner] done: {} frames rendered, program time {:.1}s, {} step errors, {} panics",
        renderer.frames(),
        runtime.bus.get_f64("time").unwrap_or(0.0),
        stats.step_errors,
        stats.step_panics
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let root = parse_flag_value(&args, "--path")
        .map(PathBuf::from)
        .unwrap_or_else(current_dir_fallback);

    if let Some(name) = parse_flag_value(&args, "--init") {
        match create_new_presentation(&root, &name) {
            Ok(()) => info!("[runner] created presentation `{name}` at {}", root.display()),
            Err(err) => {
                error!("[runner] {err}");
                std::process::exit(1);
            }
        }
        return;
    }

    let seconds = parse_flag_value(&args, "--seconds").and_then(|s| s.parse::<f64>().ok());
    if let Err(err) = run(&root, seconds) {
        error!("[runner] {err:#}");
        std::process::exit(1);
    }
}

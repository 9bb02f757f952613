use std::time::{Duration, Instant};

use log::info;
use orrery_runtime::{NullRenderer, Runtime};

const DEFAULT_FPS_CAP: f64 = 60.0;
const LOG_INTERVAL_SECONDS: f64 = 2.5;
const SPIN_TAIL_THRESHOLD: Duration = Duration::from_micros(500);

/// Frame-capped loop without a window. Drives the runtime against a
/// [`NullRenderer`] for a fixed wall-clock length.
pub struct HeadlessRunner {
    fps_cap: f64,
}

impl HeadlessRunner {
    pub fn new() -> Self {
        Self {
            fps_cap: DEFAULT_FPS_CAP,
        }
    }

    pub fn with_fps_cap(mut self, fps_cap: f64) -> Self {
        if fps_cap.is_finite() {
            self.fps_cap = fps_cap.max(1.0);
        }
        self
    }

    pub fn run(&self, runtime: &mut Runtime, seconds: f64) -> NullRenderer {
        let mut renderer = NullRenderer::new();
        let target = Duration::from_secs_f64(1.0 / self.fps_cap);
        let run_for = Duration::from_secs_f64(seconds.max(0.0));

        let start = Instant::now();
        let mut last_frame_end = start;
        let mut batch_start = start;
        let mut batch_frames = 0u32;
        let mut batch_work = Duration::ZERO;

        while start.elapsed() < run_for {
            let frame_start = Instant::now();
            let delta = frame_start.duration_since(last_frame_end);

            runtime.frame(delta.as_secs_f64() * 1000.0, &mut renderer);
            let work = frame_start.elapsed();

            if work < target {
                let remaining = target - work;
                if remaining > SPIN_TAIL_THRESHOLD {
                    std::thread::sleep(remaining - SPIN_TAIL_THRESHOLD);
                }
                let deadline = frame_start + target;
                while Instant::now() < deadline {
                    std::hint::spin_loop();
                }
            }

            let frame_end = Instant::now();
            last_frame_end = frame_end;
            batch_frames = batch_frames.saturating_add(1);
            batch_work += work;

            let batch_elapsed = frame_end.duration_since(batch_start);
            if batch_elapsed.as_secs_f64() >= LOG_INTERVAL_SECONDS && batch_frames > 0 {
                let capped_fps = batch_frames as f64 / batch_elapsed.as_secs_f64();
                let avg_work_us = batch_work.as_secs_f64() * 1_000_000.0 / batch_frames as f64;
                let stats = runtime.animation.stats();
                info!(
                    "delta: {:.3}ms | capped_fps: {:.2} | {} frames, {:.1}us avg work | time: {:.1}s | visible: {} | step errors: {} panics: {}",
                    delta.as_secs_f64() * 1000.0,
                    capped_fps,
                    batch_frames,
                    avg_work_us,
                    runtime.bus.get_f64("time").unwrap_or(0.0),
                    renderer.last_visible(),
                    stats.step_errors,
                    stats.step_panics,
                );

                batch_frames = 0;
                batch_work = Duration::ZERO;
                batch_start = frame_end;
            }
        }
        renderer
    }
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

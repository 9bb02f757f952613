use orrery_scene::SceneGraph;

/// Draws the current scene graph. Projection, materials and media decoding
/// live behind this trait.
pub trait RenderBackend {
    fn draw_frame(&mut self, graph: &SceneGraph);
}

/// Camera interaction hook, updated before any frame handler runs.
pub trait CameraRig {
    fn update(&mut self, time_ms: f64, graph: &mut SceneGraph);
}

/// Headless backend: counts frames and visible nodes, draws nothing.
#[derive(Default)]
pub struct NullRenderer {
    frames: u64,
    last_visible: usize,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Visible node count seen by the last frame.
    #[inline]
    pub fn last_visible(&self) -> usize {
        self.last_visible
    }
}

impl RenderBackend for NullRenderer {
    fn draw_frame(&mut self, graph: &SceneGraph) {
        self.frames += 1;
        self.last_visible = graph
            .iter()
            .filter(|(id, _)| graph.is_visible_in_tree(*id))
            .count();
    }
}

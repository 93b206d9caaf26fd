//! Frame driver - per-tick animation update and draw

use log::debug;

use crate::viewer::renderer::ModelRenderer;

/// Drives the renderer once per display-refresh tick. The platform
/// re-registers the callback for the next tick itself; this type keeps the
/// animation timebase and the visibility-bound start/stop lifecycle.
///
/// Ordering contract per tick: animation is applied and bone matrices
/// recomputed before the draw is issued.
pub struct FrameDriver {
    start_nanos: Option<u64>,
    running: bool,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            start_nanos: None,
            running: false,
        }
    }

    /// Resume ticking (the app became visible)
    pub fn start(&mut self) {
        if !self.running {
            debug!("frame_driver_start");
        }
        self.running = true;
    }

    /// Stop ticking and drop the timebase (the app was hidden)
    pub fn stop(&mut self) {
        if self.running {
            debug!("frame_driver_stop");
        }
        self.running = false;
        self.start_nanos = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One display tick. Applies animation track 0 at the elapsed time
    /// when the current model has tracks, recomputes bone matrices, then
    /// issues the draw. With no model loaded the empty lit scene is still
    /// rendered.
    pub fn frame<R: ModelRenderer>(&mut self, frame_time_nanos: u64, renderer: &mut R) {
        if !self.running {
            return;
        }
        let start = *self.start_nanos.get_or_insert(frame_time_nanos);

        if let Some(track_count) = renderer.animator_track_count() {
            if track_count > 0 {
                let elapsed_seconds =
                    frame_time_nanos.saturating_sub(start) as f64 / 1_000_000_000.0;
                renderer.apply_animation(0, elapsed_seconds as f32);
            }
            renderer.update_bone_matrices();
        }

        renderer.render(frame_time_nanos);
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

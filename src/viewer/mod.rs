//! Viewer orchestration: controller, frame driver, renderer contracts and
//! the activity-style `ViewerApp` wiring

pub mod controller;
pub mod environment;
pub mod frame;
pub mod permissions;
pub mod renderer;

use std::path::Path;

use model_fetch::{ModelCache, ModelSource, TransferCoordinator};

use controller::{ModelState, ViewerController};
use environment::{install_environment, AssetCatalog};
use frame::FrameDriver;
use permissions::ViewerHost;
use renderer::{EnvironmentDecoder, ModelRenderer, ViewOptions};

/// Model downloaded by the load-from-URL button when no other URL is given
pub const DEFAULT_MODEL_URL: &str =
    "https://storage.googleapis.com/ar-answers-in-search-models/static/Tiger/model.glb";

/// Ties the pieces together the way the platform activity does: one-time
/// engine init, environment install, fixed startup view options, then the
/// UI event wiring (two buttons, double-tap, frame ticks, visibility).
pub struct ViewerApp<R: ModelRenderer + EnvironmentDecoder, H: ViewerHost> {
    controller: ViewerController<R, H>,
    frame: FrameDriver,
}

impl<R: ModelRenderer + EnvironmentDecoder, H: ViewerHost> ViewerApp<R, H> {
    pub fn new(
        mut renderer: R,
        host: H,
        assets: Box<dyn AssetCatalog>,
        cache_dir: impl AsRef<Path>,
    ) -> Result<Self, String> {
        crate::init();

        install_environment(&mut renderer, assets.as_ref());
        renderer.set_view_options(ViewOptions::all_enabled());

        let coordinator = TransferCoordinator::new(ModelCache::new(cache_dir.as_ref()))?;
        Ok(Self {
            controller: ViewerController::new(renderer, host, assets, coordinator),
            frame: FrameDriver::new(),
        })
    }

    /// Load-local button
    pub fn load_from_file(&mut self) {
        self.controller.request_load_local();
    }

    /// Load-URL button; falls back to the bundled default URL
    pub fn load_from_url(&mut self, url: Option<&str>) {
        self.controller.request_load_url(url.unwrap_or(DEFAULT_MODEL_URL));
    }

    /// Double-tap gesture
    pub fn on_double_tap(&mut self) {
        self.controller.reset();
    }

    /// Display-refresh callback. Completions are drained first so a
    /// finished load becomes visible within the same frame.
    pub fn on_frame(&mut self, frame_time_nanos: u64) {
        self.controller.pump();
        self.frame.frame(frame_time_nanos, self.controller.renderer_mut());
    }

    /// The app became visible
    pub fn on_resume(&mut self) {
        self.frame.start();
    }

    /// The app was hidden
    pub fn on_pause(&mut self) {
        self.frame.stop();
    }

    /// Permission grant/denial callback from the platform
    pub fn on_permission_result(&mut self, request_code: u32, granted: bool) {
        self.controller.on_permission_result(request_code, granted);
    }

    /// Document picker round-trip result
    pub fn on_document_picked(&mut self, source: Option<ModelSource>) {
        self.controller.on_document_picked(source);
    }

    pub fn state(&self) -> ModelState {
        self.controller.state()
    }

    pub fn controller(&self) -> &ViewerController<R, H> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewerController<R, H> {
        &mut self.controller
    }

    /// Releases the fetch pipeline (the app is being destroyed)
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}

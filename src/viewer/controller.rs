//! Viewer controller - permission-gated loads over a single model slot

use log::{debug, error, info, warn};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

use model_fetch::{ModelSource, TransferCoordinator, TransferResult};

use crate::viewer::environment::AssetCatalog;
use crate::viewer::permissions::{
    ViewerHost, LOAD_EXTERNAL_STORAGE, PERMISSION_FOR_DOWNLOAD_FILE,
    PERMISSION_FOR_READ_LOCAL_FILE,
};
use crate::viewer::renderer::ModelRenderer;

/// Lifecycle of the single model slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelState {
    #[serde(rename = "empty")]
    Empty,
    #[serde(rename = "loading")]
    Loading,
    #[serde(rename = "loaded")]
    Loaded,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Empty => write!(f, "empty"),
            ModelState::Loading => write!(f, "loading"),
            ModelState::Loaded => write!(f, "loaded"),
        }
    }
}

/// A load deferred until the storage permission is granted
#[derive(Debug, Clone)]
enum PendingLoad {
    PickLocalFile,
    DownloadUrl(String),
}

impl PendingLoad {
    fn request_code(&self) -> u32 {
        match self {
            PendingLoad::PickLocalFile => PERMISSION_FOR_READ_LOCAL_FILE,
            PendingLoad::DownloadUrl(_) => PERMISSION_FOR_DOWNLOAD_FILE,
        }
    }
}

/// Reacts to user actions, defers loads behind permission grants, submits
/// fetches to the coordinator, and on completion hands the model bytes to
/// the renderer. All methods run on the owning (UI) thread; completions
/// arrive as messages drained by [`ViewerController::pump`].
pub struct ViewerController<R: ModelRenderer, H: ViewerHost> {
    renderer: R,
    host: H,
    assets: Box<dyn AssetCatalog>,
    coordinator: TransferCoordinator,
    results: mpsc::UnboundedReceiver<TransferResult>,
    results_tx: mpsc::UnboundedSender<TransferResult>,
    state: ModelState,
    pending: Option<PendingLoad>,
    active_request: Option<u64>,
    model_shown: bool,
}

impl<R: ModelRenderer, H: ViewerHost> ViewerController<R, H> {
    pub fn new(
        renderer: R,
        host: H,
        assets: Box<dyn AssetCatalog>,
        coordinator: TransferCoordinator,
    ) -> Self {
        let (results_tx, results) = mpsc::unbounded_channel();
        Self {
            renderer,
            host,
            assets,
            coordinator,
            results,
            results_tx,
            state: ModelState::Empty,
            pending: None,
            active_request: None,
            model_shown: false,
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Load-from-file button
    pub fn request_load_local(&mut self) {
        self.check_permission(PendingLoad::PickLocalFile);
    }

    /// Load-from-URL button
    pub fn request_load_url(&mut self, url: impl Into<String>) {
        self.check_permission(PendingLoad::DownloadUrl(url.into()));
    }

    fn check_permission(&mut self, load: PendingLoad) {
        if self.host.has_storage_permission() {
            self.run_load(load);
            return;
        }
        let code = load.request_code();
        self.pending = Some(load);
        if self.host.should_show_rationale() {
            self.host.show_permission_rationale(code);
        } else {
            self.host.request_storage_permission(code);
        }
    }

    /// Permission grant/denial callback from the host. A denial leaves the
    /// slot `Empty` and the app usable without a model.
    pub fn on_permission_result(&mut self, request_code: u32, granted: bool) {
        let pending = match self.pending.take() {
            Some(p) if p.request_code() == request_code => p,
            other => {
                self.pending = other;
                debug!("permission_result_ignored: code={:#x}", request_code);
                return;
            }
        };
        if granted {
            self.run_load(pending);
        } else {
            info!("permission_denied: code={:#x}", request_code);
        }
    }

    fn run_load(&mut self, load: PendingLoad) {
        match load {
            PendingLoad::PickLocalFile => self.host.open_document_picker(LOAD_EXTERNAL_STORAGE),
            PendingLoad::DownloadUrl(url) => self.begin_fetch(ModelSource::RemoteUrl(url)),
        }
    }

    /// Document picker round-trip result; `None` means the picker was
    /// dismissed without a choice
    pub fn on_document_picked(&mut self, source: Option<ModelSource>) {
        match source {
            Some(source) => self.begin_fetch(source),
            None => debug!("document_pick_cancelled"),
        }
    }

    /// A newer submission simply supersedes the previous one; the older
    /// fetch keeps running and its completion is discarded by id.
    fn begin_fetch(&mut self, source: ModelSource) {
        match self.coordinator.submit(source, self.results_tx.clone()) {
            Ok(id) => {
                self.active_request = Some(id);
                self.transition(ModelState::Loading);
            }
            Err(e) => {
                error!("fetch_submit_failed: {}", e);
                self.transition(ModelState::Empty);
            }
        }
    }

    /// Drains completion messages on the controller thread; called once
    /// per frame tick. Each delivered result moves the slot out of
    /// `Loading` exactly once.
    pub fn pump(&mut self) {
        while let Ok(result) = self.results.try_recv() {
            self.handle_result(result);
        }
    }

    fn handle_result(&mut self, result: TransferResult) {
        if self.active_request != Some(result.request_id) {
            warn!("stale_result_discarded: id={}", result.request_id);
            return;
        }
        self.active_request = None;
        match result.outcome {
            Ok(payload) => match payload.into_model_bytes() {
                Ok(bytes) => self.show_model(bytes),
                Err(e) => {
                    error!("model_read_failed: {}", e);
                    self.transition(ModelState::Empty);
                }
            },
            Err(e) => {
                error!("model_fetch_failed: {}", e);
                self.transition(ModelState::Empty);
            }
        }
    }

    fn show_model(&mut self, bytes: Vec<u8>) {
        let byte_count = bytes.len();
        let assets = &self.assets;
        let mut resolver = |name: &str| assets.read_asset(&format!("models/{}", name)).ok();
        match self.renderer.load_model_async(bytes, &mut resolver) {
            Ok(()) => {
                self.renderer.transform_to_unit_cube();
                self.model_shown = true;
                info!("model_loaded: bytes={}", byte_count);
                self.transition(ModelState::Loaded);
            }
            Err(e) => {
                error!("model_decode_failed: {}", e);
                self.transition(ModelState::Empty);
            }
        }
    }

    /// Double-tap: release the displayed model. Keyed to what the renderer
    /// actually holds rather than the fetch state; a failed reload leaves
    /// the slot `Empty` with the previous model still on screen, and that
    /// model must remain releasable. A second reset is a no-op; the
    /// renderer is never asked to destroy an already-empty scene.
    pub fn reset(&mut self) {
        if !self.model_shown {
            debug!("reset_ignored: state={}", self.state);
            return;
        }
        self.renderer.destroy_model();
        self.model_shown = false;
        if self.state == ModelState::Loaded {
            self.transition(ModelState::Empty);
        }
    }

    /// Tears down the fetch pipeline; no further results are delivered.
    pub fn shutdown(&mut self) {
        self.coordinator.stop();
    }

    fn transition(&mut self, next: ModelState) {
        if self.state != next {
            info!("viewer_state: {} -> {}", self.state, next);
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_fetch::ModelCache;
    use std::io::Cursor;
    use std::path::Path;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct RecordingRenderer {
        loads: Vec<usize>,
        unit_cube_calls: usize,
        destroy_calls: usize,
        fail_load: bool,
    }

    impl ModelRenderer for RecordingRenderer {
        fn load_model_async(
            &mut self,
            bytes: Vec<u8>,
            _resolver: crate::viewer::renderer::ResourceResolver<'_>,
        ) -> Result<(), String> {
            if self.fail_load {
                return Err("not a glTF payload".to_string());
            }
            self.loads.push(bytes.len());
            Ok(())
        }

        fn transform_to_unit_cube(&mut self) {
            self.unit_cube_calls += 1;
        }

        fn destroy_model(&mut self) {
            self.destroy_calls += 1;
        }

        fn render(&mut self, _frame_time_nanos: u64) {}

        fn animator_track_count(&self) -> Option<usize> {
            if self.loads.len() > self.destroy_calls {
                Some(0)
            } else {
                None
            }
        }

        fn apply_animation(&mut self, _track: usize, _time_seconds: f32) {}

        fn update_bone_matrices(&mut self) {}

        fn set_view_options(&mut self, _options: crate::viewer::renderer::ViewOptions) {}

        fn set_indirect_light(
            &mut self,
            _light: crate::viewer::renderer::IndirectLightHandle,
            _intensity: f32,
        ) {
        }

        fn set_skybox(&mut self, _skybox: crate::viewer::renderer::SkyboxHandle) {}
    }

    #[derive(Default)]
    struct FakeHost {
        granted: bool,
        rationale: bool,
        requested: Vec<u32>,
        rationale_shown: Vec<u32>,
        picker_opened: Vec<u32>,
    }

    impl ViewerHost for FakeHost {
        fn has_storage_permission(&self) -> bool {
            self.granted
        }

        fn should_show_rationale(&self) -> bool {
            self.rationale
        }

        fn show_permission_rationale(&mut self, request_code: u32) {
            self.rationale_shown.push(request_code);
        }

        fn request_storage_permission(&mut self, request_code: u32) {
            self.requested.push(request_code);
        }

        fn open_document_picker(&mut self, request_code: u32) {
            self.picker_opened.push(request_code);
        }
    }

    struct NoAssets;

    impl AssetCatalog for NoAssets {
        fn read_asset(&self, name: &str) -> Result<Vec<u8>, String> {
            Err(format!("no bundled asset: {}", name))
        }
    }

    type TestController = ViewerController<RecordingRenderer, FakeHost>;

    fn controller(cache_dir: &Path, granted: bool) -> TestController {
        let coordinator = TransferCoordinator::new(ModelCache::new(cache_dir)).unwrap();
        ViewerController::new(
            RecordingRenderer::default(),
            FakeHost {
                granted,
                ..Default::default()
            },
            Box::new(NoAssets),
            coordinator,
        )
    }

    fn pump_until(controller: &mut TestController, done: impl Fn(&TestController) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            controller.pump();
            if done(controller) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("condition not reached before deadline");
    }

    #[test]
    fn model_state_display_matches_expected_strings() {
        assert_eq!(ModelState::Empty.to_string(), "empty");
        assert_eq!(ModelState::Loading.to_string(), "loading");
        assert_eq!(ModelState::Loaded.to_string(), "loaded");
    }

    #[test]
    fn missing_permission_defers_the_load_and_requests() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), false);

        c.request_load_url("https://example.com/models/model.glb");

        assert_eq!(c.state(), ModelState::Empty);
        assert_eq!(c.host().requested, vec![PERMISSION_FOR_DOWNLOAD_FILE]);
        assert!(c.host().rationale_shown.is_empty());
    }

    #[test]
    fn rationale_dialog_precedes_the_request_when_asked_for() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), false);
        c.host.rationale = true;

        c.request_load_local();

        assert_eq!(c.host().rationale_shown, vec![PERMISSION_FOR_READ_LOCAL_FILE]);
        assert!(c.host().requested.is_empty());
    }

    #[test]
    fn denial_clears_the_pending_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), false);

        c.request_load_local();
        c.on_permission_result(PERMISSION_FOR_READ_LOCAL_FILE, false);
        assert_eq!(c.state(), ModelState::Empty);

        // A grant arriving later has nothing to resume
        c.on_permission_result(PERMISSION_FOR_READ_LOCAL_FILE, true);
        assert!(c.host().picker_opened.is_empty());
    }

    #[test]
    fn grant_resumes_the_deferred_local_load_via_the_picker() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), false);

        c.request_load_local();
        c.on_permission_result(PERMISSION_FOR_READ_LOCAL_FILE, true);

        assert_eq!(c.host().picker_opened, vec![LOAD_EXTERNAL_STORAGE]);
        assert_eq!(c.state(), ModelState::Empty);
    }

    #[test]
    fn picked_local_file_loads_into_the_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), true);

        let payload = vec![0x17u8; 512 * 1024];
        c.on_document_picked(Some(ModelSource::LocalHandle(Box::new(Cursor::new(payload)))));
        assert_eq!(c.state(), ModelState::Loading);

        pump_until(&mut c, |c| c.state() == ModelState::Loaded);
        assert_eq!(c.renderer().loads, vec![512 * 1024]);
        assert_eq!(c.renderer().unit_cube_calls, 1);
    }

    #[test]
    fn fetch_failure_returns_the_slot_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), true);

        c.on_document_picked(Some(ModelSource::LocalPath(dir.path().join("absent.glb"))));
        assert_eq!(c.state(), ModelState::Loading);

        pump_until(&mut c, |c| c.state() == ModelState::Empty);
        assert!(c.renderer().loads.is_empty());
    }

    #[test]
    fn renderer_decode_error_is_treated_as_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), true);
        c.renderer_mut().fail_load = true;

        c.on_document_picked(Some(ModelSource::LocalHandle(Box::new(Cursor::new(
            vec![0u8; 64],
        )))));
        pump_until(&mut c, |c| c.state() == ModelState::Empty);
        assert_eq!(c.renderer().unit_cube_calls, 0);
    }

    #[test]
    fn reset_is_a_noop_on_an_empty_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), true);

        c.on_document_picked(Some(ModelSource::LocalHandle(Box::new(Cursor::new(
            vec![0u8; 128],
        )))));
        pump_until(&mut c, |c| c.state() == ModelState::Loaded);

        c.reset();
        assert_eq!(c.state(), ModelState::Empty);
        assert_eq!(c.renderer().destroy_calls, 1);

        c.reset();
        assert_eq!(c.renderer().destroy_calls, 1);
    }

    #[test]
    fn failed_reload_still_releases_the_displayed_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), true);

        c.on_document_picked(Some(ModelSource::LocalHandle(Box::new(Cursor::new(
            vec![0u8; 96],
        )))));
        pump_until(&mut c, |c| c.state() == ModelState::Loaded);

        // Reloading from a missing path fails and the slot goes back to
        // Empty while the first model is still on screen
        c.on_document_picked(Some(ModelSource::LocalPath(dir.path().join("absent.glb"))));
        assert_eq!(c.state(), ModelState::Loading);
        pump_until(&mut c, |c| c.state() == ModelState::Empty);
        assert_eq!(c.renderer().destroy_calls, 0);

        c.reset();
        assert_eq!(c.renderer().destroy_calls, 1);

        c.reset();
        assert_eq!(c.renderer().destroy_calls, 1);
    }

    #[test]
    fn superseded_request_result_is_discarded_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), true);

        c.on_document_picked(Some(ModelSource::LocalHandle(Box::new(Cursor::new(
            vec![0u8; 100],
        )))));
        // Second submission before the first completes supersedes it
        c.on_document_picked(Some(ModelSource::LocalHandle(Box::new(Cursor::new(
            vec![0u8; 200],
        )))));

        pump_until(&mut c, |c| c.state() == ModelState::Loaded);
        assert_eq!(c.renderer().loads, vec![200]);
    }

    #[test]
    fn cancelled_picker_leaves_the_slot_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path(), true);

        c.on_document_picked(None);
        assert_eq!(c.state(), ModelState::Empty);
    }
}

//! glTF/GLB viewer core
//!
//! Thin orchestration around an external real-time rendering engine:
//! permission-gated model loads, an asynchronous fetch pipeline (the
//! `model-fetch` crate), environment lighting setup from bundled assets,
//! and a per-frame animation/render driver. The engine, the model parser,
//! the environment decoder, and the platform permission/UI surface are
//! opaque collaborators expressed as traits.

use lazy_static::lazy_static;
use log::info;
use std::sync::Mutex;

pub mod viewer;

pub use model_fetch::{
    DownloadProgress, FetchedModel, ModelCache, ModelSource, TransferCoordinator, TransferResult,
};
pub use viewer::controller::{ModelState, ViewerController};
pub use viewer::environment::AssetCatalog;
pub use viewer::frame::FrameDriver;
pub use viewer::permissions::ViewerHost;
pub use viewer::renderer::{
    EnvironmentDecoder, IndirectLightHandle, ModelRenderer, ResourceResolver, SkyboxHandle,
    ViewOptions,
};
pub use viewer::{ViewerApp, DEFAULT_MODEL_URL};

lazy_static! {
    static ref ENGINE_READY: Mutex<bool> = Mutex::new(false);
}

/// Process-wide utility-layer initialization. Must run before any renderer
/// object is constructed; safe to call repeatedly and lives for the
/// process lifetime with no teardown.
pub fn init() {
    let mut ready = ENGINE_READY.lock().unwrap();
    if !*ready {
        info!("engine_init: utility layer ready");
        *ready = true;
    }
}

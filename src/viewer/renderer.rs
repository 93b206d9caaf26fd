//! Contracts for the external rendering engine and environment decoder

/// Opaque handle to decoded precomputed environment lighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectLightHandle(pub u64);

/// Opaque handle to a decoded skybox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkyboxHandle(pub u64);

/// Rendering-option toggles, set once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub dynamic_resolution: bool,
    pub ambient_occlusion: bool,
    pub bloom: bool,
}

impl ViewOptions {
    pub fn all_enabled() -> Self {
        Self {
            dynamic_resolution: true,
            ambient_occlusion: true,
            bloom: true,
        }
    }
}

/// Callback the renderer uses to resolve auxiliary resources (textures,
/// buffers) referenced by relative name from the loaded model
pub type ResourceResolver<'a> = &'a mut dyn FnMut(&str) -> Option<Vec<u8>>;

/// The external real-time rendering engine. Frame composition, animation
/// blending and GPU resource management live behind this seam; the core
/// only issues calls from its own thread.
pub trait ModelRenderer {
    /// Hands the raw model bytes to the engine's asynchronous load path.
    /// The engine parses and discards the buffer; content ownership
    /// transfers with the call.
    fn load_model_async(
        &mut self,
        bytes: Vec<u8>,
        resolver: ResourceResolver<'_>,
    ) -> Result<(), String>;

    /// Scales and centers the current model into a unit bounding cube for
    /// consistent camera framing
    fn transform_to_unit_cube(&mut self);

    /// Releases the current model's GPU/CPU resources
    fn destroy_model(&mut self);

    /// Issues one draw for the given frame timestamp; renders the empty
    /// lit scene when no model is present
    fn render(&mut self, frame_time_nanos: u64);

    /// Animation track count of the current model's animator; `None` when
    /// no model (and thus no animator) is present
    fn animator_track_count(&self) -> Option<usize>;

    fn apply_animation(&mut self, track: usize, time_seconds: f32);

    fn update_bone_matrices(&mut self);

    fn set_view_options(&mut self, options: ViewOptions);

    fn set_indirect_light(&mut self, light: IndirectLightHandle, intensity: f32);

    fn set_skybox(&mut self, skybox: SkyboxHandle);
}

/// Decoder for the bundled compressed environment assets
pub trait EnvironmentDecoder {
    fn decode_indirect_light(&mut self, bytes: &[u8]) -> Result<IndirectLightHandle, String>;

    fn decode_skybox(&mut self, bytes: &[u8]) -> Result<SkyboxHandle, String>;
}

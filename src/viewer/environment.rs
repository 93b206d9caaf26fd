//! Scene environment setup from bundled compressed assets

use log::{error, info};

use crate::viewer::renderer::{EnvironmentDecoder, ModelRenderer};

/// Name of the bundled environment
pub const DEFAULT_ENVIRONMENT: &str = "default_env";

/// Indirect light intensity applied at scene setup
pub const INDIRECT_LIGHT_INTENSITY: f32 = 30_000.0;

/// Read-only access to assets bundled with the application package
pub trait AssetCatalog {
    /// Reads a bundled compressed asset fully into memory
    fn read_asset(&self, name: &str) -> Result<Vec<u8>, String>;
}

/// Decodes and installs the indirect light and skybox, once at startup.
/// A failure leaves the scene without that piece of lighting and is only
/// logged; the viewer stays interactive.
pub fn install_environment<R>(renderer: &mut R, assets: &dyn AssetCatalog)
where
    R: ModelRenderer + EnvironmentDecoder,
{
    let ibl = DEFAULT_ENVIRONMENT;

    let light_asset = format!("envs/{}/{}_ibl.ktx", ibl, ibl);
    match assets
        .read_asset(&light_asset)
        .and_then(|bytes| renderer.decode_indirect_light(&bytes))
    {
        Ok(light) => renderer.set_indirect_light(light, INDIRECT_LIGHT_INTENSITY),
        Err(e) => error!("environment_light_failed: {} error={}", light_asset, e),
    }

    let skybox_asset = format!("envs/{}/{}_skybox.ktx", ibl, ibl);
    match assets
        .read_asset(&skybox_asset)
        .and_then(|bytes| renderer.decode_skybox(&bytes))
    {
        Ok(skybox) => renderer.set_skybox(skybox),
        Err(e) => error!("environment_skybox_failed: {} error={}", skybox_asset, e),
    }

    info!("environment_ready: {}", ibl);
}

use vulkanalia::prelude::v1_0::*;

/// How many frames the CPU may record ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

pub const VALIDATION_LAYER: vk::ExtensionName =
    vk::ExtensionName::from_bytes(b"VK_LAYER_KHRONOS_validation");

pub const DEVICE_EXTENSIONS: &[vk::ExtensionName] = &[vk::KHR_SWAPCHAIN_EXTENSION.name];

/// Runtime renderer options, threaded through device-context construction.
/// Validation is a runtime switch rather than a build-time one so a release
/// binary can still be run with the layers on.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub app_name: String,
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "Vulkan Quad".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

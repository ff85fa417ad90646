use super::config::RendererConfig;
use super::instance;
use super::logical_device;
use super::physical_device;
use super::queue_family::QueueFamilyIndices;

use anyhow::{anyhow, Result};
use vulkanalia::loader::{LibloadingLoader, LIBRARY};
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::ExtDebugUtilsExtension;
use vulkanalia::vk::KhrSurfaceExtension;
use vulkanalia::window as vk_window;
use winit::window::Window;

/// Session-lifetime Vulkan objects: instance, surface, adapter, logical
/// device and its queues. Everything else in the renderer is a child of the
/// device and must be gone before this drops.
pub struct DeviceContext {
    _entry: Entry,
    pub instance: Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    pub surface: vk::SurfaceKHR,
    pub physical_device: vk::PhysicalDevice,
    pub queue_indices: QueueFamilyIndices,
    pub device: Device,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
}

impl DeviceContext {
    pub unsafe fn new(window: &Window, config: &RendererConfig) -> Result<Self> {
        let loader = LibloadingLoader::new(LIBRARY)?;
        let entry = Entry::new(loader).map_err(|b| anyhow!("{}", b))?;

        let (instance, messenger) = instance::create(window, &entry, config)?;
        let surface = vk_window::create_surface(&instance, &window, &window)?;

        let physical_device = physical_device::pick(&instance, surface)?;
        let queue_indices = QueueFamilyIndices::get(&instance, surface, physical_device)?;
        let (device, graphics_queue, present_queue) =
            logical_device::create(&instance, physical_device, queue_indices, config)?;

        Ok(Self {
            _entry: entry,
            instance,
            messenger,
            surface,
            physical_device,
            queue_indices,
            device,
            graphics_queue,
            present_queue,
        })
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_device(None);
            self.instance.destroy_surface_khr(self.surface, None);
            if !self.messenger.is_null() {
                self.instance
                    .destroy_debug_utils_messenger_ext(self.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

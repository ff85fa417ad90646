use super::config::{RendererConfig, VALIDATION_LAYER};

use std::collections::HashSet;
use std::ffi::CStr;
use std::ffi::CString;
use std::os::raw::c_void;

use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::ExtDebugUtilsExtension;
use vulkanalia::window as vk_window;
use winit::window::Window;

/// Creates the instance and, when validation is enabled, the debug
/// messenger. A missing layer or a failed messenger downgrades to a warning;
/// only instance creation itself is fatal.
pub unsafe fn create(
    window: &Window,
    entry: &Entry,
    config: &RendererConfig,
) -> Result<(Instance, vk::DebugUtilsMessengerEXT)> {
    let available_extensions = entry.enumerate_instance_extension_properties(None)?;
    debug!("Available instance extensions:");
    for properties in &available_extensions {
        debug!("  {}, V{}", properties.extension_name, properties.spec_version);
    }

    let available_layers = entry
        .enumerate_instance_layer_properties()?
        .iter()
        .map(|l| l.layer_name)
        .collect::<HashSet<_>>();
    debug!("Available layers:");
    for layer_name in &available_layers {
        debug!("  {}", layer_name);
    }

    let mut enable_validation = config.enable_validation;
    if enable_validation && !available_layers.contains(&VALIDATION_LAYER) {
        warn!("Validation layer requested but not supported.");
        enable_validation = false;
    }

    let application_name = CString::new(config.app_name.as_str())?;
    let application_info = vk::ApplicationInfo::builder()
        .application_name(application_name.as_bytes_with_nul())
        .application_version(vk::make_version(1, 0, 0))
        .engine_name(b"vkquad\0")
        .engine_version(vk::make_version(1, 0, 0))
        .api_version(vk::make_version(1, 2, 0));

    let mut extensions = vk_window::get_required_instance_extensions(window)
        .iter()
        .map(|e| e.as_ptr())
        .collect::<Vec<_>>();

    let mut layers = Vec::new();
    if enable_validation {
        extensions.push(vk::EXT_DEBUG_UTILS_EXTENSION.name.as_ptr());
        layers.push(VALIDATION_LAYER.as_ptr());
    }

    let mut info = vk::InstanceCreateInfo::builder()
        .application_info(&application_info)
        .enabled_layer_names(&layers)
        .enabled_extension_names(&extensions);

    let mut debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::all())
        .message_type(vk::DebugUtilsMessageTypeFlagsEXT::all())
        .user_callback(Some(debug_callback));

    if enable_validation {
        info = info.push_next(&mut debug_info);
    }

    let instance = entry.create_instance(&info, None)?;

    let mut messenger = vk::DebugUtilsMessengerEXT::null();
    if enable_validation {
        match instance.create_debug_utils_messenger_ext(&debug_info, None) {
            Ok(handle) => messenger = handle,
            Err(error) => warn!("Failed to create debug messenger: {}", error),
        }
    }

    Ok((instance, messenger))
}

extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    type_: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    let data = unsafe { *data };
    let message = unsafe { CStr::from_ptr(data.message) }.to_string_lossy();

    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        error!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        warn!("({:?}) {}", type_, message);
    } else {
        debug!("({:?}) {}", type_, message);
    }

    vk::FALSE
}

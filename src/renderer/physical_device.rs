use super::config::DEVICE_EXTENSIONS;
use super::error::RendererError;
use super::queue_family::QueueFamilyIndices;
use super::swapchain::SwapchainSupport;

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use log::*;
use vulkanalia::prelude::v1_0::*;

/// What adapter selection looks at, queried once per enumerated device so
/// the accept/reject policy itself is a plain function over values.
#[derive(Clone, Debug)]
pub struct AdapterProfile {
    pub name: String,
    pub discrete: bool,
    pub has_queue_families: bool,
    pub has_required_extensions: bool,
    pub has_surface_support: bool,
}

impl AdapterProfile {
    unsafe fn query(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let properties = instance.get_physical_device_properties(physical_device);

        let has_queue_families =
            QueueFamilyIndices::get(instance, surface, physical_device).is_ok();

        let extensions = instance
            .enumerate_device_extension_properties(physical_device, None)?
            .iter()
            .map(|e| e.extension_name)
            .collect::<HashSet<_>>();
        let has_required_extensions = DEVICE_EXTENSIONS.iter().all(|e| extensions.contains(e));

        let has_surface_support = match SwapchainSupport::get(instance, surface, physical_device) {
            Ok(support) => !support.formats.is_empty() && !support.present_modes.is_empty(),
            Err(_) => false,
        };

        Ok(Self {
            name: properties.device_name.to_string(),
            discrete: properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
            has_queue_families,
            has_required_extensions,
            has_surface_support,
        })
    }

    /// The first unmet hard requirement, or `None` when the adapter is
    /// acceptable.
    pub fn rejection(&self) -> Option<&'static str> {
        if !self.discrete {
            Some("not a discrete GPU")
        } else if !self.has_queue_families {
            Some("missing required queue families")
        } else if !self.has_required_extensions {
            Some("missing required device extensions")
        } else if !self.has_surface_support {
            Some("insufficient swapchain support")
        } else {
            None
        }
    }
}

/// First acceptable adapter wins; ties are broken by enumeration order.
/// Deliberately no scoring.
pub fn select(profiles: &[AdapterProfile]) -> Option<usize> {
    profiles.iter().position(|p| p.rejection().is_none())
}

pub unsafe fn pick(instance: &Instance, surface: vk::SurfaceKHR) -> Result<vk::PhysicalDevice> {
    let devices = instance.enumerate_physical_devices()?;

    let mut profiles = Vec::with_capacity(devices.len());
    for physical_device in &devices {
        profiles.push(AdapterProfile::query(instance, surface, *physical_device)?);
    }

    match select(&profiles) {
        Some(index) => {
            for profile in &profiles[..index] {
                if let Some(reason) = profile.rejection() {
                    warn!("Skipping physical device (`{}`): {}", profile.name, reason);
                }
            }
            info!("Selected physical device (`{}`).", profiles[index].name);
            Ok(devices[index])
        }
        None => {
            for profile in &profiles {
                if let Some(reason) = profile.rejection() {
                    warn!("Skipping physical device (`{}`): {}", profile.name, reason);
                }
            }
            Err(anyhow!(RendererError::NoSuitableDevice))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, discrete: bool) -> AdapterProfile {
        AdapterProfile {
            name: name.to_string(),
            discrete,
            has_queue_families: true,
            has_required_extensions: true,
            has_surface_support: true,
        }
    }

    #[test]
    fn empty_enumeration_selects_nothing() {
        assert_eq!(select(&[]), None);
    }

    #[test]
    fn first_discrete_adapter_wins_over_earlier_integrated() {
        let profiles = [profile("integrated", false), profile("discrete", true)];
        assert_eq!(select(&profiles), Some(1));
    }

    #[test]
    fn enumeration_order_breaks_ties() {
        let profiles = [profile("first", true), profile("second", true)];
        assert_eq!(select(&profiles), Some(0));
    }

    #[test]
    fn every_hard_requirement_rejects() {
        let mut p = profile("gpu", true);
        assert_eq!(p.rejection(), None);

        p.has_queue_families = false;
        assert_eq!(p.rejection(), Some("missing required queue families"));
        p.has_queue_families = true;

        p.has_required_extensions = false;
        assert_eq!(p.rejection(), Some("missing required device extensions"));
        p.has_required_extensions = true;

        p.has_surface_support = false;
        assert_eq!(p.rejection(), Some("insufficient swapchain support"));
        p.has_surface_support = true;

        p.discrete = false;
        assert_eq!(p.rejection(), Some("not a discrete GPU"));
    }
}

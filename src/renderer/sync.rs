use super::config::MAX_FRAMES_IN_FLIGHT;

use anyhow::Result;
use vulkanalia::prelude::v1_0::*;

/// Synchronization primitives for the frame slots: per-slot semaphores and
/// fences, plus one fence alias per swap image recording which slot last
/// submitted against that image.
pub struct FrameSync {
    device: Device,
    pub image_available: Vec<vk::Semaphore>,
    pub render_finished: Vec<vk::Semaphore>,
    pub in_flight_fences: Vec<vk::Fence>,
    pub images_in_flight: Vec<vk::Fence>,
}

impl FrameSync {
    pub unsafe fn new(device: &Device, image_count: usize) -> Result<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::builder();
        // Signaled, so the first wait on each slot passes immediately.
        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);

        let mut image_available = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut render_finished = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut in_flight_fences = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);

        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            image_available.push(device.create_semaphore(&semaphore_info, None)?);
            render_finished.push(device.create_semaphore(&semaphore_info, None)?);
            in_flight_fences.push(device.create_fence(&fence_info, None)?);
        }

        Ok(Self {
            device: device.clone(),
            image_available,
            render_finished,
            in_flight_fences,
            images_in_flight: vec![vk::Fence::null(); image_count],
        })
    }

    /// Clears the image-fence table after swap recreation; the new images
    /// have no outstanding owners.
    pub fn reset_images(&mut self, image_count: usize) {
        self.images_in_flight.clear();
        self.images_in_flight
            .resize(image_count, vk::Fence::null());
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        unsafe {
            // images_in_flight only aliases the frame fences.
            self.in_flight_fences
                .iter()
                .for_each(|f| self.device.destroy_fence(*f, None));
            self.render_finished
                .iter()
                .for_each(|s| self.device.destroy_semaphore(*s, None));
            self.image_available
                .iter()
                .for_each(|s| self.device.destroy_semaphore(*s, None));
        }
    }
}

mod buffer;
mod command_buffer;
mod config;
mod descriptor;
mod device;
mod error;
mod framebuffer;
mod instance;
mod logical_device;
mod physical_device;
mod pipeline;
mod queue_family;
mod shaders;
mod swapchain;
mod sync;
mod ubo;

use std::time::Instant;

use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::KhrSwapchainExtension;
use winit::window::Window;

use buffer::GeometryBuffers;
use command_buffer::CommandSet;
use config::MAX_FRAMES_IN_FLIGHT;
use descriptor::Descriptors;
use device::DeviceContext;
use pipeline::Pipeline;
use swapchain::SwapState;
use sync::FrameSync;
use ubo::UniformBufferObject;

pub use config::RendererConfig;

/// The renderer: one hardcoded quad, spinning with wall-clock time.
///
/// Owns every GPU object of the session. Field order is teardown order:
/// swap-dependent objects first, the device context last.
pub struct Renderer {
    frame: usize,
    resized: bool,
    start: Instant,
    sync: FrameSync,
    commands: CommandSet,
    descriptors: Descriptors,
    geometry: GeometryBuffers,
    pipeline: Pipeline,
    swap: SwapState,
    ctx: DeviceContext,
}

impl Renderer {
    pub fn create(window: &Window, config: RendererConfig) -> Result<Self> {
        unsafe {
            let ctx = DeviceContext::new(window, &config)?;
            let swap = SwapState::new(window, &ctx)?;
            let descriptors = Descriptors::new(&ctx.device)?;
            let pipeline = Pipeline::new(&ctx.device, &swap, descriptors.set_layout)?;
            let geometry = GeometryBuffers::new(&ctx)?;
            descriptors.bind_uniform(geometry.uniform.buffer);
            let mut commands = CommandSet::new(&ctx.device, ctx.queue_indices.graphics)?;
            commands.record(&swap, &pipeline, &geometry, descriptors.set)?;
            let sync = FrameSync::new(&ctx.device, swap.images.len())?;

            Ok(Self {
                frame: 0,
                resized: false,
                start: Instant::now(),
                sync,
                commands,
                descriptors,
                geometry,
                pipeline,
                swap,
                ctx,
            })
        }
    }

    /// Called by the host loop when the window client area changed size.
    pub fn mark_resized(&mut self) {
        self.resized = true;
    }

    pub fn render(&mut self, window: &Window) -> Result<()> {
        unsafe { self.render_frame(window) }
    }

    unsafe fn render_frame(&mut self, window: &Window) -> Result<()> {
        let device = self.ctx.device.clone();
        let in_flight_fence = self.sync.in_flight_fences[self.frame];

        device.wait_for_fences(&[in_flight_fence], true, u64::MAX)?;

        let result = device.acquire_next_image_khr(
            self.swap.swapchain,
            u64::MAX,
            self.sync.image_available[self.frame],
            vk::Fence::null(),
        );

        let (image_index, suboptimal_acquire) = match result {
            Ok((image_index, code)) => (
                image_index as usize,
                code == vk::SuccessCode::SUBOPTIMAL_KHR,
            ),
            Err(vk::ErrorCode::OUT_OF_DATE_KHR) => return self.recreate_swapchain(window),
            Err(error) => {
                error!("Failed to acquire swapchain image: {}", error);
                return Ok(());
            }
        };

        // A previous frame slot may still own this image; its fence must
        // signal before the image's command buffer is submitted again.
        let image_in_flight = self.sync.images_in_flight[image_index];
        if !image_in_flight.is_null() {
            device.wait_for_fences(&[image_in_flight], true, u64::MAX)?;
        }
        self.sync.images_in_flight[image_index] = in_flight_fence;

        let elapsed = self.start.elapsed().as_secs_f32();
        let aspect = self.swap.extent.width as f32 / self.swap.extent.height as f32;
        self.geometry
            .update_uniform(&UniformBufferObject::at(elapsed, aspect))?;

        let wait_semaphores = &[self.sync.image_available[self.frame]];
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[self.commands.buffers[image_index]];
        let signal_semaphores = &[self.sync.render_finished[self.frame]];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        device.reset_fences(&[in_flight_fence])?;

        if let Err(error) =
            device.queue_submit(self.ctx.graphics_queue, &[submit_info], in_flight_fence)
        {
            error!("Failed to submit draw command buffer: {}", error);
            return Ok(());
        }

        let swapchains = &[self.swap.swapchain];
        let image_indices = &[image_index as u32];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(signal_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        let result = device.queue_present_khr(self.ctx.present_queue, &present_info);
        let changed = result == Ok(vk::SuccessCode::SUBOPTIMAL_KHR)
            || result == Err(vk::ErrorCode::OUT_OF_DATE_KHR);

        self.frame = (self.frame + 1) % MAX_FRAMES_IN_FLIGHT;

        if self.resized || changed || suboptimal_acquire {
            self.resized = false;
            self.recreate_swapchain(window)?;
        } else if let Err(error) = result {
            error!("Failed to present swapchain image: {}", error);
        }

        Ok(())
    }

    /// Tears down everything that depends on the swapchain and rebuilds it
    /// against the current window size. The device context is untouched.
    fn recreate_swapchain(&mut self, window: &Window) -> Result<()> {
        unsafe {
            self.ctx.device.device_wait_idle()?;

            self.commands.release_buffers();
            self.pipeline.destroy();
            self.swap.destroy();

            self.swap = SwapState::new(window, &self.ctx)?;
            self.pipeline = Pipeline::new(&self.ctx.device, &self.swap, self.descriptors.set_layout)?;
            self.commands
                .record(&self.swap, &self.pipeline, &self.geometry, self.descriptors.set)?;
            self.sync.reset_images(self.swap.images.len());

            Ok(())
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // No in-flight work may reference the objects that the field drops
        // below are about to destroy.
        if let Err(error) = unsafe { self.ctx.device.device_wait_idle() } {
            error!("Failed to wait for device idle at teardown: {}", error);
        }
    }
}

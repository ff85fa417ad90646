use super::buffer::{GeometryBuffers, QUAD_INDICES};
use super::pipeline::Pipeline;
use super::swapchain::SwapState;

use anyhow::Result;
use vulkanalia::prelude::v1_0::*;

/// The command pool and one pre-recorded command buffer per swap image. The
/// pool outlives swap recreations; the buffers do not.
pub struct CommandSet {
    device: Device,
    pub pool: vk::CommandPool,
    pub buffers: Vec<vk::CommandBuffer>,
}

impl CommandSet {
    pub unsafe fn new(device: &Device, graphics_family: u32) -> Result<Self> {
        let info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::empty())
            .queue_family_index(graphics_family);

        let pool = device.create_command_pool(&info, None)?;

        Ok(Self {
            device: device.clone(),
            pool,
            buffers: Vec::new(),
        })
    }

    /// Records the fixed draw once per swap image. Called at setup and after
    /// every swap recreation; never per frame.
    pub unsafe fn record(
        &mut self,
        swap: &SwapState,
        pipeline: &Pipeline,
        geometry: &GeometryBuffers,
        descriptor_set: vk::DescriptorSet,
    ) -> Result<()> {
        let allocate_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(pipeline.framebuffers.len() as u32);

        self.buffers = self.device.allocate_command_buffers(&allocate_info)?;

        for (i, command_buffer) in self.buffers.iter().enumerate() {
            let info = vk::CommandBufferBeginInfo::builder();
            self.device.begin_command_buffer(*command_buffer, &info)?;

            let render_area = vk::Rect2D::builder()
                .offset(vk::Offset2D::default())
                .extent(swap.extent);

            let color_clear_value = vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.0, 0.0, 0.0, 1.0],
                },
            };

            let clear_values = &[color_clear_value];
            let info = vk::RenderPassBeginInfo::builder()
                .render_pass(pipeline.render_pass)
                .framebuffer(pipeline.framebuffers[i])
                .render_area(render_area)
                .clear_values(clear_values);

            self.device
                .cmd_begin_render_pass(*command_buffer, &info, vk::SubpassContents::INLINE);
            self.device.cmd_bind_pipeline(
                *command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.pipeline,
            );
            self.device.cmd_bind_vertex_buffers(
                *command_buffer,
                0,
                &[geometry.positions.buffer, geometry.colors.buffer],
                &[0, 0],
            );
            self.device.cmd_bind_descriptor_sets(
                *command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.layout,
                0,
                &[descriptor_set],
                &[],
            );
            self.device.cmd_bind_index_buffer(
                *command_buffer,
                geometry.indices.buffer,
                0,
                vk::IndexType::UINT16,
            );
            self.device
                .cmd_draw_indexed(*command_buffer, QUAD_INDICES.len() as u32, 1, 0, 0, 0);
            self.device.cmd_end_render_pass(*command_buffer);

            self.device.end_command_buffer(*command_buffer)?;
        }

        Ok(())
    }

    /// Frees the per-image buffers ahead of swap recreation. The pool stays.
    pub fn release_buffers(&mut self) {
        unsafe {
            self.device.free_command_buffers(self.pool, &self.buffers);
        }
        self.buffers.clear();
    }
}

impl Drop for CommandSet {
    fn drop(&mut self) {
        self.release_buffers();
        unsafe {
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}

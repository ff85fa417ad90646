use super::ubo::UniformBufferObject;

use std::mem::size_of;

use anyhow::Result;
use vulkanalia::prelude::v1_0::*;

/// Descriptor objects for the one uniform buffer the scene uses. The pool is
/// sized to exactly one set with one uniform binding; asking it for more is
/// a programming error, not a runtime case.
pub struct Descriptors {
    device: Device,
    pub set_layout: vk::DescriptorSetLayout,
    pub pool: vk::DescriptorPool,
    pub set: vk::DescriptorSet,
}

impl Descriptors {
    pub unsafe fn new(device: &Device) -> Result<Self> {
        // Layout: one uniform-buffer binding, vertex stage only.

        let ubo_binding = vk::DescriptorSetLayoutBinding::builder()
            .binding(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::VERTEX);

        let bindings = &[ubo_binding];
        let info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(bindings);

        let set_layout = device.create_descriptor_set_layout(&info, None)?;

        // Pool

        let ubo_size = vk::DescriptorPoolSize::builder()
            .type_(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1);

        let pool_sizes = &[ubo_size];
        let info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(pool_sizes)
            .max_sets(1);

        let pool = device.create_descriptor_pool(&info, None)?;

        // Allocate

        let set_layouts = &[set_layout];
        let info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(pool)
            .set_layouts(set_layouts);

        let set = device.allocate_descriptor_sets(&info)?[0];

        Ok(Self {
            device: device.clone(),
            set_layout,
            pool,
            set,
        })
    }

    /// Points the set's binding 0 at the uniform buffer. Done once, after
    /// the buffer exists.
    pub unsafe fn bind_uniform(&self, buffer: vk::Buffer) {
        let info = vk::DescriptorBufferInfo::builder()
            .buffer(buffer)
            .offset(0)
            .range(size_of::<UniformBufferObject>() as u64);

        let buffer_info = &[info];
        let ubo_write = vk::WriteDescriptorSet::builder()
            .dst_set(self.set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(buffer_info);

        self.device
            .update_descriptor_sets(&[ubo_write], &[] as &[vk::CopyDescriptorSet]);
    }
}

impl Drop for Descriptors {
    fn drop(&mut self) {
        unsafe {
            // Destroying the pool releases the set.
            self.device.destroy_descriptor_pool(self.pool, None);
            self.device
                .destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}

use super::device::DeviceContext;
use super::error::RendererError;
use super::ubo::UniformBufferObject;

use std::mem::size_of;
use std::ptr::copy_nonoverlapping as memcpy;

use anyhow::Result;
use lazy_static::lazy_static;
use log::*;
use nalgebra_glm as glm;
use vulkanalia::prelude::v1_0::*;

lazy_static! {
    static ref QUAD_POSITIONS: Vec<glm::Vec2> = vec![
        glm::vec2(-0.5, -0.5),
        glm::vec2(0.5, -0.5),
        glm::vec2(0.5, 0.5),
        glm::vec2(-0.5, 0.5),
    ];
    static ref QUAD_COLORS: Vec<glm::Vec3> = vec![
        glm::vec3(1.0, 0.0, 0.0),
        glm::vec3(0.0, 1.0, 0.0),
        glm::vec3(0.0, 0.0, 1.0),
        glm::vec3(1.0, 1.0, 1.0),
    ];
}

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Positions at binding 0 (two floats per vertex), colors at binding 1
/// (three floats per vertex), each its own per-vertex stream.
pub fn binding_descriptions() -> [vk::VertexInputBindingDescription; 2] {
    [
        vk::VertexInputBindingDescription::builder()
            .binding(0)
            .stride(size_of::<glm::Vec2>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
            .build(),
        vk::VertexInputBindingDescription::builder()
            .binding(1)
            .stride(size_of::<glm::Vec3>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
            .build(),
    ]
}

pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
    [
        vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(0)
            .format(vk::Format::R32G32_SFLOAT)
            .offset(0)
            .build(),
        vk::VertexInputAttributeDescription::builder()
            .binding(1)
            .location(1)
            .format(vk::Format::R32G32B32_SFLOAT)
            .offset(0)
            .build(),
    ]
}

/// Lowest memory-type index whose bit is set in `type_filter` and whose
/// property flags cover `properties`, or `None` when nothing qualifies.
pub fn find_memory_type(
    memory: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> Option<u32> {
    (0..memory.memory_type_count).find(|i| {
        let suitable = (type_filter & (1 << i)) != 0;
        let memory_type = memory.memory_types[*i as usize];
        suitable && memory_type.property_flags.contains(properties)
    })
}

/// A buffer plus its dedicated host-visible allocation.
pub struct DeviceBuffer {
    device: Device,
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl DeviceBuffer {
    pub unsafe fn new(
        instance: &Instance,
        device: &Device,
        physical_device: vk::PhysicalDevice,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
    ) -> Result<Self> {
        // Buffer

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = device.create_buffer(&buffer_info, None)?;

        // Memory

        let requirements = device.get_buffer_memory_requirements(buffer);
        let memory_properties = instance.get_physical_device_memory_properties(physical_device);

        let memory_type_index = match find_memory_type(
            &memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_COHERENT | vk::MemoryPropertyFlags::HOST_VISIBLE,
        ) {
            Some(index) => index,
            None => {
                error!("No compatible memory type for buffer allocation.");
                device.destroy_buffer(buffer, None);
                return Err(RendererError::NoCompatibleMemoryType.into());
            }
        };

        let memory_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = device.allocate_memory(&memory_info, None)?;

        device.bind_buffer_memory(buffer, memory, 0)?;

        Ok(Self {
            device: device.clone(),
            buffer,
            memory,
            size,
        })
    }

    /// Maps, copies `data`, unmaps. Small buffers only; there is no staging
    /// path.
    pub unsafe fn upload<T>(&self, data: &[T]) -> Result<()> {
        let memory =
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())?;

        memcpy(data.as_ptr(), memory.cast(), data.len());

        self.device.unmap_memory(self.memory);

        Ok(())
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.free_memory(self.memory, None);
            self.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// The scene's GPU buffers. Positions, colors and indices are written once
/// at startup; the uniform buffer is rewritten every frame.
pub struct GeometryBuffers {
    pub positions: DeviceBuffer,
    pub colors: DeviceBuffer,
    pub indices: DeviceBuffer,
    pub uniform: DeviceBuffer,
}

impl GeometryBuffers {
    pub unsafe fn new(ctx: &DeviceContext) -> Result<Self> {
        let positions = DeviceBuffer::new(
            &ctx.instance,
            &ctx.device,
            ctx.physical_device,
            (size_of::<glm::Vec2>() * QUAD_POSITIONS.len()) as u64,
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;
        positions.upload(QUAD_POSITIONS.as_slice())?;

        let colors = DeviceBuffer::new(
            &ctx.instance,
            &ctx.device,
            ctx.physical_device,
            (size_of::<glm::Vec3>() * QUAD_COLORS.len()) as u64,
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;
        colors.upload(QUAD_COLORS.as_slice())?;

        let indices = DeviceBuffer::new(
            &ctx.instance,
            &ctx.device,
            ctx.physical_device,
            (size_of::<u16>() * QUAD_INDICES.len()) as u64,
            vk::BufferUsageFlags::INDEX_BUFFER,
        )?;
        indices.upload(&QUAD_INDICES[..])?;

        let uniform = DeviceBuffer::new(
            &ctx.instance,
            &ctx.device,
            ctx.physical_device,
            size_of::<UniformBufferObject>() as u64,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
        )?;

        Ok(Self {
            positions,
            colors,
            indices,
            uniform,
        })
    }

    pub unsafe fn update_uniform(&self, ubo: &UniformBufferObject) -> Result<()> {
        self.uniform.upload(std::slice::from_ref(ubo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut memory = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (i, property_flags) in flags.iter().enumerate() {
            memory.memory_types[i] = vk::MemoryType {
                property_flags: *property_flags,
                heap_index: 0,
            };
        }
        memory
    }

    #[test]
    fn lowest_qualifying_index_wins() {
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        let memory = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL, host, host]);
        assert_eq!(
            find_memory_type(&memory, 0b111, host),
            Some(1)
        );
    }

    #[test]
    fn filter_bit_excludes_otherwise_matching_types() {
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        let memory = memory_properties(&[host, host]);
        // Only index 1 is allowed by the filter.
        assert_eq!(find_memory_type(&memory, 0b10, host), Some(1));
    }

    #[test]
    fn flag_superset_is_required() {
        let memory = memory_properties(&[vk::MemoryPropertyFlags::HOST_VISIBLE]);
        let wanted =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        assert_eq!(find_memory_type(&memory, 0b1, wanted), None);
    }

    #[test]
    fn no_match_yields_none() {
        let memory = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        assert_eq!(
            find_memory_type(&memory, 0b1, vk::MemoryPropertyFlags::HOST_VISIBLE),
            None
        );
    }

    #[test]
    fn quad_indices_address_the_four_vertices() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|i| (*i as usize) < QUAD_POSITIONS.len()));
        assert_eq!(QUAD_POSITIONS.len(), QUAD_COLORS.len());
    }
}

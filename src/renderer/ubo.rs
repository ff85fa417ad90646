use nalgebra_glm as glm;

/// Per-frame transforms, laid out exactly as the vertex shader's uniform
/// block expects.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct UniformBufferObject {
    pub model: glm::Mat4,
    pub view: glm::Mat4,
    pub proj: glm::Mat4,
}

impl UniformBufferObject {
    /// Transforms for a given wall-clock time: the quad spins about +Z at
    /// 90°/s under a fixed camera. Rotation speed is tied to real time, not
    /// frame count.
    pub fn at(elapsed_secs: f32, aspect: f32) -> Self {
        let model = glm::rotate(
            &glm::identity(),
            elapsed_secs * glm::radians(&glm::vec1(90.0))[0],
            &glm::vec3(0.0, 0.0, 1.0),
        );

        let view = glm::look_at(
            &glm::vec3(2.0, 2.0, 2.0),
            &glm::vec3(0.0, 0.0, 0.0),
            &glm::vec3(0.0, 0.0, 1.0),
        );

        let mut proj = glm::perspective(aspect, glm::radians(&glm::vec1(45.0))[0], 0.1, 10.0);

        // glm produces OpenGL clip space; Vulkan's Y axis points down.
        proj[(1, 1)] *= -1.0;

        Self { model, view, proj }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_starts_as_identity() {
        let ubo = UniformBufferObject::at(0.0, 4.0 / 3.0);
        assert!((ubo.model - glm::identity::<f32, 4>()).abs().max() < 1e-6);
    }

    #[test]
    fn model_rotates_a_quarter_turn_per_second() {
        let ubo = UniformBufferObject::at(1.0, 4.0 / 3.0);
        // cos(90°) = 0 on the diagonal, sin(90°) = 1 off it.
        assert!(ubo.model[(0, 0)].abs() < 1e-6);
        assert!((ubo.model[(1, 0)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn projection_y_axis_is_negated() {
        let ubo = UniformBufferObject::at(0.5, 16.0 / 9.0);
        assert!(ubo.proj[(1, 1)] < 0.0);
    }
}

//! Math aliases and Vulkan-convention projection helpers

/// 4x4 column-major matrix
pub type Mat4 = nalgebra::Matrix4<f32>;
/// 3-component vector
pub type Vec3 = nalgebra::Vector3<f32>;
/// 3-component point
pub type Point3 = nalgebra::Point3<f32>;

/// Build a perspective projection for Vulkan clip space.
///
/// `fovy_degrees` is the vertical field of view. The Y axis is flipped
/// relative to the GL convention because Vulkan's framebuffer Y points down.
pub fn perspective_vk(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let mut projection =
        nalgebra::Perspective3::new(aspect, fovy_degrees.to_radians(), near, far).to_homogeneous();
    projection[(1, 1)] *= -1.0;
    projection
}

/// Convert a matrix into the `[[f32; 4]; 4]` layout used in GPU-visible structs
pub fn mat4_to_arrays(matrix: &Mat4) -> [[f32; 4]; 4] {
    (*matrix).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perspective_flips_y() {
        let gl = nalgebra::Perspective3::new(16.0 / 9.0, 70.0f32.to_radians(), 0.1, 200.0)
            .to_homogeneous();
        let vk = perspective_vk(70.0, 16.0 / 9.0, 0.1, 200.0);

        assert_relative_eq!(vk[(0, 0)], gl[(0, 0)]);
        assert_relative_eq!(vk[(1, 1)], -gl[(1, 1)]);
        assert_relative_eq!(vk[(2, 2)], gl[(2, 2)]);
    }

    #[test]
    fn mat4_round_trips_through_arrays() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let arrays = mat4_to_arrays(&m);
        // nalgebra is column-major: arrays[column][row]
        assert_relative_eq!(arrays[3][0], 1.0);
        assert_relative_eq!(arrays[3][1], 2.0);
        assert_relative_eq!(arrays[3][2], 3.0);
        assert_relative_eq!(arrays[0][0], 1.0);
    }
}

use crate::Vector3;
use glam::{EulerRot, Mat4, Quat};

/// Local transform of a scene node. Rotation is XYZ euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
}

impl Transform3D {
    pub const IDENTITY: Self = Self {
        position: Vector3::ZERO,
        rotation: Vector3::ZERO,
        scale: Vector3::ONE,
    };

    #[inline]
    pub const fn new(position: Vector3, rotation: Vector3, scale: Vector3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Convert to a Mat4 for transformations (TRS order)
    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.into(),
            self.rotation_quat(),
            self.position.into(),
        )
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn default_is_identity() {
        assert!(Transform3D::default().is_identity());
        assert_eq!(Transform3D::default().to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn to_mat4_applies_scale_then_translation() {
        let t = Transform3D::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::ZERO,
            Vector3::splat(2.0),
        );
        let p = t.to_mat4().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vec3::new(3.0, 4.0, 5.0));
    }
}

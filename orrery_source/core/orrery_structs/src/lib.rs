mod transform_3d;
mod vector3;

pub use transform_3d::Transform3D;
pub use vector3::Vector3;

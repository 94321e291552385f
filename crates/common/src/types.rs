use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Persistent identifier of an entity, stable across save/load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(pub Uuid);

impl Guid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, used in log lines and inspector output.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_owned()
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque reference to an asset owned by an external resource manager
/// (mesh, material, shader, texture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero id, which never names a real asset.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Rotate so that local -Z faces `target`. Leaves the rotation untouched
    /// when the target coincides with the position. When `forward` is
    /// parallel to `up`, any axis perpendicular to `forward` stands in for it.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() <= f32::EPSILON {
            return;
        }
        let forward = forward.normalize();
        let up = if forward.cross(up).length_squared() <= 1e-6 {
            forward.any_orthonormal_vector()
        } else {
            up
        };
        let view = Mat4::look_at_rh(self.position, target, up);
        self.rotation = Quat::from_mat4(&view.inverse()).normalize();
    }
}

/// A point light. `range` drives the attenuation coefficient written to the
/// lighting buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub range: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            range: 4.0,
        }
    }
}

impl Light {
    pub fn attenuation(&self) -> f32 {
        1.0 / (1.0 + self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_along_up_stays_finite() {
        let mut t = Transform::from_position(Vec3::new(3.0, 4.0, -20.0));
        t.look_at(Vec3::new(3.0, 4.0, 10.0), Vec3::Z);
        assert!(t.rotation.is_finite());
        assert!(t.to_matrix().is_finite());
        let facing = t.rotation * Vec3::NEG_Z;
        assert!(facing.abs_diff_eq(Vec3::Z, 1e-4));

        t.look_at(Vec3::new(3.0, 4.0, -40.0), Vec3::Z);
        assert!(t.rotation.is_finite());
        assert!((t.rotation * Vec3::NEG_Z).abs_diff_eq(Vec3::NEG_Z, 1e-4));
    }

    #[test]
    fn guid_uniqueness() {
        let a = Guid::new();
        let b = Guid::new();
        assert_ne!(a, b);
    }

    #[test]
    fn guid_parses_its_own_display() {
        let id = Guid::new();
        let parsed: Guid = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn transform_matrix_roundtrip() {
        let t = Transform {
            position: Vec3::new(1.0, -2.0, 3.0),
            rotation: Quat::from_rotation_z(0.5),
            scale: Vec3::splat(2.0),
        };
        let back = Transform::from_matrix(&t.to_matrix());
        assert!(back.position.abs_diff_eq(t.position, 1e-5));
        assert!(back.scale.abs_diff_eq(t.scale, 1e-5));
        assert!(back.rotation.abs_diff_eq(t.rotation, 1e-5));
    }

    #[test]
    fn look_at_faces_target() {
        let mut t = Transform::default();
        t.look_at(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        let forward = t.rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::X, 1e-4));
    }

    #[test]
    fn look_at_self_is_noop() {
        let mut t = Transform::default();
        t.look_at(Vec3::ZERO, Vec3::Z);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn light_attenuation_from_range() {
        let light = Light {
            range: 100.0,
            ..Light::default()
        };
        assert!((light.attenuation() - 1.0 / 101.0).abs() < 1e-6);
    }
}

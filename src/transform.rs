//! Live transforms: the mutable per-particle pose updated every frame.
//!
//! Stored as a struct of arrays so the animation loop walks tightly packed
//! positions and rotations without touching anything else.

use crate::layout::Pose;
use crate::particle::ParticleSet;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Quat, Vec3};

/// One instance as consumed by the renderer.
///
/// Layout matches the per-instance vertex attributes in the mesh shader:
/// four `vec4<f32>` model matrix columns, an RGBA colour, then three
/// `vec4<f32>` normal matrix columns (`w` unused).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub normal: [[f32; 4]; 3],
}

impl InstanceRaw {
    pub fn new(model: Mat4, color: Vec3) -> Self {
        let normal = normal_matrix(model);
        Self {
            model: model.to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
            normal: [
                normal.x_axis.extend(0.0).to_array(),
                normal.y_axis.extend(0.0).to_array(),
                normal.z_axis.extend(0.0).to_array(),
            ],
        }
    }
}

/// Inverse transpose of `model`'s upper 3x3, for transforming normals.
///
/// `model` must be a rotation times a per-axis scale (no shear), which is
/// all the scene builds. Then each column divided by its squared length is
/// the matching column of the inverse transpose. A collapsed axis maps to
/// zero instead of infinity.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    let column = |c: Vec3| {
        let len2 = c.length_squared();
        if len2 > 1e-12 {
            c / len2
        } else {
            Vec3::ZERO
        }
    };
    Mat3::from_cols(
        column(model.x_axis.truncate()),
        column(model.y_axis.truncate()),
        column(model.z_axis.truncate()),
    )
}

/// Current pose and scale of every particle in one set.
#[derive(Debug, Clone, Default)]
pub struct TransformBuffer {
    pub(crate) positions: Vec<Vec3>,
    pub(crate) rotations: Vec<Quat>,
    pub(crate) scales: Vec<Vec3>,
}

impl TransformBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// One slot per record, each starting at its scatter pose.
    pub fn seeded(set: &ParticleSet) -> Self {
        let kind = set.kind();
        let records = set.records();
        Self {
            positions: records.iter().map(|r| r.scatter_position).collect(),
            rotations: records.iter().map(|r| r.scatter_rotation).collect(),
            scales: records.iter().map(|r| kind.instance_scale(r.scale)).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn pose(&self, index: usize) -> Pose {
        Pose::new(self.positions[index], self.rotations[index])
    }

    #[inline]
    pub fn scale(&self, index: usize) -> Vec3 {
        self.scales[index]
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    /// Local transform of one slot.
    #[inline]
    pub fn matrix(&self, index: usize) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scales[index],
            self.rotations[index],
            self.positions[index],
        )
    }

    /// Append every slot to `out`, placed by `group` and tinted `color`.
    pub fn write_instances(&self, group: Mat4, color: Vec3, out: &mut Vec<InstanceRaw>) {
        out.reserve(self.len());
        for i in 0..self.len() {
            out.push(InstanceRaw::new(group * self.matrix(i), color));
        }
    }
}

//! Procedural meshes: apple sphere, peel and frame box, photo quad, star.
//!
//! Built on the CPU as plain vertex and index lists, then uploaded once.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Per-vertex data shared by every mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// UV sphere centred on the origin.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Mesh::default();

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let phi = v * PI;
            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let theta = u * TAU;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                mesh.vertices
                    .push(Vertex::new(normal * radius, normal, Vec2::new(u, v)));
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = (ring * stride + seg) as u16;
                let b = a + stride as u16;
                mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    /// Axis-aligned box centred on the origin, one face per side.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Mesh::default();
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u16;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (normal + u * su + v * sv) * h;
                let uv = Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5);
                mesh.vertices.push(Vertex::new(p, normal, uv));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Flat quad in the XY plane facing +Z. Image row 0 maps to the top edge.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let corners = [
            (Vec3::new(-hw, -hh, 0.0), Vec2::new(0.0, 1.0)),
            (Vec3::new(hw, -hh, 0.0), Vec2::new(1.0, 1.0)),
            (Vec3::new(hw, hh, 0.0), Vec2::new(1.0, 0.0)),
            (Vec3::new(-hw, hh, 0.0), Vec2::new(0.0, 0.0)),
        ];
        Mesh {
            vertices: corners
                .iter()
                .map(|&(p, uv)| Vertex::new(p, Vec3::Z, uv))
                .collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Extruded star in the XY plane, `depth` thick along Z.
    pub fn star(points: u32, outer: f32, inner: f32, depth: f32) -> Self {
        let points = points.max(3);
        let rim: Vec<Vec3> = (0..points * 2)
            .map(|i| {
                let r = if i % 2 == 0 { outer } else { inner };
                // First point straight up.
                let angle = PI * 0.5 + i as f32 * PI / points as f32;
                Vec3::new(angle.cos() * r, angle.sin() * r, 0.0)
            })
            .collect();
        let half = Vec3::Z * depth * 0.5;
        let mut mesh = Mesh::default();

        // Front and back caps as fans around a centre vertex.
        for (normal, offset) in [(Vec3::Z, half), (Vec3::NEG_Z, -half)] {
            let centre = mesh.vertices.len() as u16;
            mesh.vertices
                .push(Vertex::new(offset, normal, Vec2::splat(0.5)));
            for p in &rim {
                let uv = Vec2::new(p.x / outer * 0.5 + 0.5, 0.5 - p.y / outer * 0.5);
                mesh.vertices.push(Vertex::new(*p + offset, normal, uv));
            }
            let n = rim.len() as u16;
            for i in 0..n {
                let a = centre + 1 + i;
                let b = centre + 1 + (i + 1) % n;
                if normal.z > 0.0 {
                    mesh.indices.extend_from_slice(&[centre, a, b]);
                } else {
                    mesh.indices.extend_from_slice(&[centre, b, a]);
                }
            }
        }

        // Side walls, flat shaded.
        for i in 0..rim.len() {
            let p0 = rim[i];
            let p1 = rim[(i + 1) % rim.len()];
            let normal = (p1 - p0).cross(Vec3::Z).normalize_or(Vec3::X);
            let base = mesh.vertices.len() as u16;
            for p in [p0 + half, p1 + half, p1 - half, p0 - half] {
                mesh.vertices.push(Vertex::new(p, normal, Vec2::ZERO));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
        mesh
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

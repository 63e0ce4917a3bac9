use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Position and colour buffers produced by one generator call.
///
/// Both buffers hold one `f32` triple per point and always have the same
/// length. The pair cannot be modified once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloudBuffers {
    positions: Vec<f32>,
    colors: Vec<f32>,
}

/// Interleaved vertex layout for surfaces that upload a single vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl PointCloudBuffers {
    pub(crate) fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count * 3),
            colors: Vec::with_capacity(count * 3),
        }
    }

    pub(crate) fn push(&mut self, position: Vec3, color: [f32; 3]) {
        self.positions.extend_from_slice(&position.to_array());
        self.colors.extend_from_slice(&color);
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Flat `x, y, z` triples.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat `r, g, b` triples.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions
            .get(index * 3..index * 3 + 3)
            .map(Vec3::from_slice)
    }

    pub fn color(&self, index: usize) -> Option<[f32; 3]> {
        self.colors
            .get(index * 3..index * 3 + 3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Heap bytes held by both buffers.
    pub fn byte_len(&self) -> usize {
        (self.positions.capacity() + self.colors.capacity()) * std::mem::size_of::<f32>()
    }

    pub fn interleaved(&self) -> Vec<PointVertex> {
        self.positions
            .chunks_exact(3)
            .zip(self.colors.chunks_exact(3))
            .map(|(position, color)| PointVertex {
                position: [position[0], position[1], position[2]],
                color: [color[0], color[1], color[2]],
            })
            .collect()
    }

    /// Axis-aligned bounds of all positions, `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.positions.chunks_exact(3).map(Vec3::from_slice);
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), point| {
            (min.min(point), max.max(point))
        }))
    }
}

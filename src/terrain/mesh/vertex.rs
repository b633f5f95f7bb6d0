// ============================================
// Terrain Vertex - Структура вершины
// ============================================

use std::mem::size_of;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TerrainVertex {
    /// Шаг вершины в буфере (байт)
    pub const STRIDE: usize = size_of::<TerrainVertex>();
    /// Смещения атрибутов: position, normal, uv
    pub const ATTRIBUTE_OFFSETS: [usize; 3] = [0, size_of::<[f32; 3]>(), size_of::<[f32; 6]>()];

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }

    /// Байтовое представление для загрузки в GPU буфер
    pub fn as_bytes(vertices: &[TerrainVertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

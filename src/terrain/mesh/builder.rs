// ============================================
// Mesh Builder - Меш из карты высот с учётом LOD
// ============================================
// Внешнее кольцо карты (бордюр) участвует только в расчёте нормалей
// на краях чанка и в меш не попадает.

use ultraviolet::Vec3;

use super::vertex::TerrainVertex;
use crate::error::MeshError;
use crate::terrain::generation::{HeightCurve, HeightMap};
use crate::terrain::lod::LodLevel;

/// Готовый меш чанка (неизменяемый)
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    triangles: Vec<u32>,
    lod: u32,
    flat_shaded: bool,
}

impl MeshData {
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// Индексы треугольников (по 3 на треугольник)
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn lod(&self) -> u32 {
        self.lod
    }

    pub fn is_flat_shaded(&self) -> bool {
        self.flat_shaded
    }

    /// Границы меша в плоскости XZ: (min, max)
    pub fn bounds(&self) -> ([f32; 2], [f32; 2]) {
        self.positions.iter().fold(
            ([f32::MAX, f32::MAX], [f32::MIN, f32::MIN]),
            |(min, max), p| ([min[0].min(p[0]), min[1].min(p[2])], [max[0].max(p[0]), max[1].max(p[2])]),
        )
    }

    /// Чередующийся буфер вершин для загрузки в GPU
    pub fn to_vertices(&self) -> Vec<TerrainVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((&position, &normal), &uv)| TerrainVertex::new(position, normal, uv))
            .collect()
    }

    /// Индексный буфер в байтах
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}

/// Вершина сетки: в меше или в бордюре
#[derive(Clone, Copy)]
enum Slot {
    Mesh(u32),
    Border(u32),
}

/// Накопитель вершин и треугольников
struct MeshAccumulator {
    positions: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,
    triangles: Vec<u32>,
    border_positions: Vec<Vec3>,
    border_triangles: Vec<[Slot; 3]>,
}

impl MeshAccumulator {
    fn new(vertices_per_line: u32) -> Self {
        let vertex_count = (vertices_per_line * vertices_per_line) as usize;
        let quad_count = ((vertices_per_line - 1) * (vertices_per_line - 1)) as usize;
        Self {
            positions: Vec::with_capacity(vertex_count),
            uvs: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(quad_count * 6),
            border_positions: Vec::with_capacity(vertices_per_line as usize * 4 + 4),
            border_triangles: Vec::with_capacity(vertices_per_line as usize * 8 + 8),
        }
    }

    fn add_vertex(&mut self, position: Vec3, uv: [f32; 2]) -> Slot {
        self.positions.push(position);
        self.uvs.push(uv);
        Slot::Mesh(self.positions.len() as u32 - 1)
    }

    fn add_border_vertex(&mut self, position: Vec3) -> Slot {
        self.border_positions.push(position);
        Slot::Border(self.border_positions.len() as u32 - 1)
    }

    fn add_triangle(&mut self, a: Slot, b: Slot, c: Slot) {
        match (a, b, c) {
            (Slot::Mesh(a), Slot::Mesh(b), Slot::Mesh(c)) => self.triangles.extend_from_slice(&[a, b, c]),
            _ => self.border_triangles.push([a, b, c]),
        }
    }

    fn position(&self, slot: Slot) -> Vec3 {
        match slot {
            Slot::Mesh(i) => self.positions[i as usize],
            Slot::Border(i) => self.border_positions[i as usize],
        }
    }

    fn finish(self, lod: u32, flat_shaded: bool) -> MeshData {
        if flat_shaded {
            self.finish_flat(lod)
        } else {
            self.finish_smooth(lod)
        }
    }

    /// Общие вершины, нормали усреднены по соседним граням (включая бордюр)
    fn finish_smooth(self, lod: u32) -> MeshData {
        let mut normals = vec![Vec3::zero(); self.positions.len()];

        for tri in self.triangles.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let normal = surface_normal(self.positions[a], self.positions[b], self.positions[c]);
            normals[a] += normal;
            normals[b] += normal;
            normals[c] += normal;
        }

        for tri in &self.border_triangles {
            let normal = surface_normal(self.position(tri[0]), self.position(tri[1]), self.position(tri[2]));
            for slot in tri {
                if let Slot::Mesh(i) = *slot {
                    normals[i as usize] += normal;
                }
            }
        }

        MeshData {
            positions: self.positions.iter().map(to_array).collect(),
            normals: normals.into_iter().map(|n| to_array(&normalize_or_up(n))).collect(),
            uvs: self.uvs,
            triangles: self.triangles,
            lod,
            flat_shaded: false,
        }
    }

    /// Вершины дублируются на каждый треугольник, нормаль - нормаль грани
    fn finish_flat(self, lod: u32) -> MeshData {
        let vertex_count = self.triangles.len();
        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for tri in self.triangles.chunks_exact(3) {
            let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let normal = to_array(&surface_normal(
                self.positions[corners[0]],
                self.positions[corners[1]],
                self.positions[corners[2]],
            ));
            for i in corners {
                positions.push(to_array(&self.positions[i]));
                normals.push(normal);
                uvs.push(self.uvs[i]);
            }
        }

        MeshData {
            positions,
            normals,
            uvs,
            triangles: (0..vertex_count as u32).collect(),
            lod,
            flat_shaded: true,
        }
    }
}

#[inline]
fn to_array(v: &Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

#[inline]
fn normalize_or_up(v: Vec3) -> Vec3 {
    if v.mag_sq() > 0.0 {
        v.normalized()
    } else {
        Vec3::unit_y()
    }
}

/// Нормаль треугольника (a, b, c)
#[inline]
fn surface_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    normalize_or_up((b - a).cross(c - a))
}

/// Проверка, что меш с данным LOD строится из этой карты
pub fn validate_mesh_params(height_map: &HeightMap, lod: u32) -> Result<LodLevel, MeshError> {
    let level = LodLevel::new(lod)?;
    let (width, height) = (height_map.width(), height_map.height());
    if width != height {
        return Err(MeshError::NotSquare { width, height });
    }

    let stride = level.stride;
    if !level.tiles(width) {
        return Err(MeshError::StrideMismatch { stride, width });
    }

    // Нужна хотя бы одна ячейка внутри бордюра
    if (width - 1) / stride < 3 {
        return Err(MeshError::HeightMapTooSmall { width, height, stride });
    }
    Ok(level)
}

/// Построение меша чанка
///
/// Высота вершины = `height_multiplier * height_curve(h)`. Карта должна быть
/// квадратной, а шаг LOD должен делить её пролёт без остатка.
pub fn generate_terrain_mesh(
    height_map: &HeightMap,
    height_multiplier: f32,
    height_curve: &HeightCurve,
    lod: u32,
    use_flat_shading: bool,
) -> Result<MeshData, MeshError> {
    let level = validate_mesh_params(height_map, lod)?;
    let width = height_map.width();
    let stride = level.stride;
    let cells = (width - 1) / stride;
    let points_per_line = cells + 1;
    let vertices_per_line = cells - 1;

    // Мировая ширина чанка одинакова для всех LOD
    let span = (width - 3) as f32;
    let top_left_x = -span / 2.0;
    let top_left_z = span / 2.0;
    let inner_span = ((vertices_per_line - 1) * stride) as f32;

    let mut mesh = MeshAccumulator::new(vertices_per_line);
    let mut slots = Vec::with_capacity((points_per_line * points_per_line) as usize);

    for gy in 0..points_per_line {
        for gx in 0..points_per_line {
            let (x, y) = (gx * stride, gy * stride);
            let percent_x = (x as f32 - stride as f32) / inner_span;
            let percent_y = (y as f32 - stride as f32) / inner_span;
            let vertex_height = height_multiplier * height_curve.evaluate(height_map.get(x, y));
            let position = Vec3::new(top_left_x + percent_x * span, vertex_height, top_left_z - percent_y * span);

            let is_border = gx == 0 || gy == 0 || gx == points_per_line - 1 || gy == points_per_line - 1;
            let slot = if is_border {
                mesh.add_border_vertex(position)
            } else {
                mesh.add_vertex(position, [percent_x, percent_y])
            };
            slots.push(slot);
        }
    }

    let at = |gx: u32, gy: u32| slots[(gy * points_per_line + gx) as usize];
    for gy in 0..points_per_line - 1 {
        for gx in 0..points_per_line - 1 {
            let a = at(gx, gy);
            let b = at(gx + 1, gy);
            let c = at(gx, gy + 1);
            let d = at(gx + 1, gy + 1);
            mesh.add_triangle(a, d, c);
            mesh.add_triangle(d, a, b);
        }
    }

    Ok(mesh.finish(lod, use_flat_shading))
}

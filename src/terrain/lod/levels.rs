// ============================================
// LOD Levels - Уровни детализации
// ============================================
// Шаг выборки удваивается с каждым уровнем. Для размеров чанка 95 и 239
// (сетки 97 и 241) все шаги до 16 делят пролёт сетки без остатка.

use crate::error::MeshError;

/// Максимальный поддерживаемый LOD
pub const MAX_LOD: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LodLevel {
    pub lod: u32,
    /// Шаг выборки вершин по сетке высот
    pub stride: u32,
}

impl LodLevel {
    pub const LEVELS: [LodLevel; (MAX_LOD + 1) as usize] = [
        LodLevel { lod: 0, stride: 1 },
        LodLevel { lod: 1, stride: 2 },
        LodLevel { lod: 2, stride: 4 },
        LodLevel { lod: 3, stride: 8 },
        LodLevel { lod: 4, stride: 16 },
    ];

    pub fn new(lod: u32) -> Result<Self, MeshError> {
        Self::LEVELS
            .get(lod as usize)
            .copied()
            .ok_or(MeshError::UnsupportedLod { lod, max: MAX_LOD })
    }

    /// Делит ли шаг пролёт сетки шириной `bordered_width` без остатка
    #[inline]
    pub fn tiles(self, bordered_width: u32) -> bool {
        bordered_width > 0 && (bordered_width - 1) % self.stride == 0
    }

    /// Все уровни, пригодные для чанка размера `chunk_size`
    pub fn supported_for(chunk_size: u32) -> impl Iterator<Item = LodLevel> {
        let bordered = chunk_size + 2;
        Self::LEVELS
            .into_iter()
            .filter(move |level| level.tiles(bordered) && (bordered - 1) / level.stride >= 3)
    }
}

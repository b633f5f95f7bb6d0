// ============================================
// Terrain Chunks - Процедурные чанки рельефа
// ============================================
// Шум -> маска спада -> карта высот -> меш с LOD.
// Генерация идёт в фоновом пуле, результаты забираются в update().

pub mod error;
pub mod terrain;

pub use error::{ConfigError, DispatchError, MeshError, TerrainError};
pub use terrain::{
    GeneratorSettings, HeightCurve, HeightMap, MapData, MeshData, NoiseSettings, NormalizeMode, TerrainManager,
    TerrainSettings,
};

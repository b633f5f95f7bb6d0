// ============================================
// Terrain Module - Генерация чанков рельефа
// ============================================

pub mod config;
pub mod generation;
pub mod cache;
pub mod lod;
pub mod mesh;
pub mod manager;

// Re-exports
pub use config::{DispatcherSettings, GeneratorSettings, NoiseSettings, NormalizeMode, TerrainSettings};
pub use generation::{CurveKey, FalloffShape, HeightCurve, HeightMap};
pub use cache::FalloffCache;
pub use lod::{LodLevel, MAX_LOD};
pub use mesh::{MeshData, TerrainVertex};
pub use manager::{GenerationDispatcher, MapData, ResultQueue, TerrainManager};

// ============================================
// Errors - Ошибки генерации terrain
// ============================================

use thiserror::Error;

/// Ошибки загрузки и проверки настроек
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("height curve needs at least one key")]
    EmptyCurve,

    #[error("height curve key {index} is not finite")]
    NonFiniteCurveKey { index: usize },
}

/// Ошибки построения меша
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("LOD {lod} is not supported (max {max})")]
    UnsupportedLod { lod: u32, max: u32 },

    #[error("stride {stride} does not tile a heightmap of width {width}")]
    StrideMismatch { stride: u32, width: u32 },

    #[error("heightmap {width}x{height} is too small for a mesh at stride {stride}")]
    HeightMapTooSmall { width: u32, height: u32, stride: u32 },

    #[error("heightmap must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },
}

/// Ошибки фоновой диспетчеризации
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    #[error("dispatcher at capacity ({capacity} jobs in flight)")]
    AtCapacity { capacity: usize },
}

/// Общая ошибка crate
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type Result<T, E = TerrainError> = std::result::Result<T, E>;

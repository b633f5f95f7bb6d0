// ============================================
// Terrain Config - Настройки генерации
// ============================================
// Простые неизменяемые снимки настроек. Горячая перезагрузка =
// новый снимок + повторный запрос.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::terrain::generation::{FalloffShape, HeightCurve, MIN_NOISE_SCALE};

/// Порог частоты старшей октавы, после которого выборки заворачиваются
const MAX_FREQUENCY_LOG2: f64 = 24.0;

/// Размер чанка при flat shading (вершины дублируются, меш меньше)
pub const FLAT_SHADED_CHUNK_SIZE: u32 = 95;
/// Размер чанка при smooth shading
pub const SMOOTH_SHADED_CHUNK_SIZE: u32 = 239;

/// Режим нормализации шума
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// По min/max текущего чанка (швы между чанками)
    #[default]
    Local,
    /// По оценке максимальной амплитуды (бесшовно между чанками)
    Global,
}

/// Параметры шума
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub normalize_mode: NormalizeMode,
    /// Базовый период выборки (<= 0 заменяется на epsilon)
    pub scale: f32,
    /// Количество октав (<= 0 даёт плоскую карту)
    pub octaves: i32,
    /// Затухание амплитуды на октаву
    pub persistence: f32,
    /// Рост частоты на октаву
    pub lacunarity: f32,
    pub seed: i32,
    /// Смещение в мировых координатах
    pub offset: [f32; 2],
    /// Доля суммы амплитуд, принимаемая за максимум в Global режиме
    pub global_height_factor: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            normalize_mode: NormalizeMode::Local,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            seed: 0,
            offset: [0.0, 0.0],
            global_height_factor: 0.9,
        }
    }
}

impl NoiseSettings {
    /// Логирует вырожденные значения (генерация всё равно не падает)
    pub fn validate(&self) {
        if self.scale <= 0.0 {
            log::warn!("Noise scale {} is not positive, epsilon will be used", self.scale);
        } else if self.scale < MIN_NOISE_SCALE {
            log::warn!("Noise scale {} is extremely small, samples will wrap", self.scale);
        }
        if self.octaves <= 0 {
            log::warn!("Octave count {} is not positive, heightmaps will be flat", self.octaves);
        }
        if !(self.persistence > 0.0 && self.persistence <= 1.0) {
            log::warn!("Persistence {} is outside (0, 1]", self.persistence);
        }
        if self.lacunarity < 1.0 {
            log::warn!("Lacunarity {} is below 1", self.lacunarity);
        }
        if self.top_octave_frequency_log2() > MAX_FREQUENCY_LOG2 {
            log::warn!(
                "Lacunarity {} over {} octaves gives extreme frequencies, high octaves will wrap or be skipped",
                self.lacunarity,
                self.octaves
            );
        }
        if self.global_height_factor <= 0.0 {
            log::warn!("Global height factor {} is not positive", self.global_height_factor);
        }
    }

    /// log2 частоты последней октавы (0 для вырожденных настроек)
    pub fn top_octave_frequency_log2(&self) -> f64 {
        if self.octaves <= 1 || !(self.lacunarity > 1.0) {
            return 0.0;
        }
        (self.octaves - 1) as f64 * (self.lacunarity as f64).log2()
    }
}

/// Параметры рельефа и меша
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub use_flat_shading: bool,
    pub use_falloff: bool,
    /// Масштаб мира (используется материалом для границ высот)
    pub uniform_scale: f32,
    pub mesh_height_multiplier: f32,
    pub mesh_height_curve: HeightCurve,
    pub falloff: FalloffShape,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            use_flat_shading: false,
            use_falloff: false,
            uniform_scale: 2.5,
            mesh_height_multiplier: 30.0,
            mesh_height_curve: HeightCurve::linear(),
            falloff: FalloffShape::default(),
        }
    }
}

impl TerrainSettings {
    /// Размер стороны чанка (в вершинах меша при LOD 0)
    pub fn chunk_size(&self) -> u32 {
        if self.use_flat_shading {
            FLAT_SHADED_CHUNK_SIZE
        } else {
            SMOOTH_SHADED_CHUNK_SIZE
        }
    }

    /// Минимальная мировая высота меша
    pub fn min_height(&self) -> f32 {
        self.uniform_scale * self.mesh_height_multiplier * self.mesh_height_curve.evaluate(0.0)
    }

    /// Максимальная мировая высота меша
    pub fn max_height(&self) -> f32 {
        self.uniform_scale * self.mesh_height_multiplier * self.mesh_height_curve.evaluate(1.0)
    }
}

/// Параметры фонового пула
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Количество рабочих потоков (0 = по числу ядер)
    pub worker_threads: usize,
    /// Максимум задач в работе; сверх лимита запросы отклоняются
    pub capacity: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            capacity: 64,
        }
    }
}

/// Полный набор настроек генератора
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub terrain: TerrainSettings,
    pub noise: NoiseSettings,
    pub dispatcher: DispatcherSettings,
}

impl GeneratorSettings {
    /// Загрузить настройки из JSON строки
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: GeneratorSettings = serde_json::from_str(json)?;
        settings.noise.validate();
        Ok(settings)
    }

    /// Загрузить настройки из файла
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }
}

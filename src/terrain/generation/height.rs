// ============================================
// Height Map Builder - Шум + маска спада
// ============================================

use super::heightmap::HeightMap;
use super::noise::generate_noise_map;
use crate::terrain::config::{NoiseSettings, TerrainSettings};

/// Размер карты высот с бордюром для чанка `chunk_size`
#[inline]
pub fn bordered_size(chunk_size: u32) -> u32 {
    chunk_size + 2
}

/// Вычитает маску спада и зажимает в `[0, 1]`
///
/// Повторное применение к уже обработанной карте ничего не меняет.
/// Размеры маски и карты должны совпадать, иначе карта остаётся как есть.
pub fn apply_falloff(map: &mut HeightMap, falloff: &HeightMap) {
    if map.falloff_applied() {
        return;
    }
    if map.width() != falloff.width() || map.height() != falloff.height() {
        log::warn!(
            "Falloff map {}x{} does not match heightmap {}x{}, skipping",
            falloff.width(),
            falloff.height(),
            map.width(),
            map.height()
        );
        return;
    }

    for (v, f) in map.values_mut().iter_mut().zip(falloff.values()) {
        *v = (*v - f).clamp(0.0, 1.0);
    }
    map.mark_falloff_applied();
}

/// Генерация карты высот чанка с центром `centre`
///
/// `falloff` передаётся готовым (кэш живёт у владельца); он используется
/// только если в настройках включён спад.
pub fn generate_height_map(
    centre: [f32; 2],
    terrain: &TerrainSettings,
    noise: &NoiseSettings,
    falloff: Option<&HeightMap>,
) -> HeightMap {
    let size = bordered_size(terrain.chunk_size());
    let sample_centre = [centre[0] + noise.offset[0], centre[1] + noise.offset[1]];
    let mut map = generate_noise_map(size, size, noise, sample_centre);

    if terrain.use_falloff {
        match falloff {
            Some(falloff) => apply_falloff(&mut map, falloff),
            None => log::warn!("Falloff enabled but no falloff map supplied"),
        }
    }

    map
}

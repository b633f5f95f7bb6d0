// ============================================
// Noise Map - Многооктавный шум для карты высот
// ============================================

use ::noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::heightmap::HeightMap;
use crate::terrain::config::{NoiseSettings, NormalizeMode};

/// Минимальный масштаб шума (защита от деления на ноль)
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Диапазон случайных смещений октав
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Период заворачивания координат выборки (кратен периоду решётки Perlin)
const SAMPLE_WRAP_PERIOD: f64 = (1u64 << 24) as f64;

/// Координата выборки, безопасная для `Perlin::get`
///
/// Решётка перестановок периодична, поэтому сдвиг на кратное периоду
/// не меняет поле. Нечисловые координаты дают `None`.
#[inline]
fn wrap_sample(v: f64) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    if v.abs() < SAMPLE_WRAP_PERIOD {
        Some(v)
    } else {
        Some(v.rem_euclid(SAMPLE_WRAP_PERIOD))
    }
}

/// Смещения октав и оценка максимальной амплитуды
struct Octaves {
    offsets: Vec<[f64; 2]>,
    max_possible_height: f64,
}

impl Octaves {
    fn new(settings: &NoiseSettings, octaves: usize, sample_centre: [f32; 2]) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed as i64 as u64);
        let mut amplitude = 1.0f64;
        let mut max_possible_height = 0.0f64;

        let offsets = (0..octaves)
            .map(|_| {
                let x = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 + sample_centre[0] as f64;
                let y = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 - sample_centre[1] as f64;
                max_possible_height += amplitude;
                amplitude *= settings.persistence as f64;
                [x, y]
            })
            .collect();

        Self { offsets, max_possible_height }
    }
}

/// Генерация карты шума `width x height` с центром выборки `sample_centre`
///
/// Значения нормализованы в `[0, 1]`. При `octaves <= 0` возвращается плоская
/// карта нулей, при `scale <= 0` используется [`MIN_NOISE_SCALE`].
pub fn generate_noise_map(width: u32, height: u32, settings: &NoiseSettings, sample_centre: [f32; 2]) -> HeightMap {
    if settings.octaves <= 0 {
        log::warn!("Octave count {} is not positive, returning a flat map", settings.octaves);
        return HeightMap::filled(width, height, 0.0);
    }
    if width == 0 || height == 0 {
        return HeightMap::filled(width, height, 0.0);
    }

    let scale = if settings.scale > 0.0 { settings.scale as f64 } else { MIN_NOISE_SCALE as f64 };
    let octaves = Octaves::new(settings, settings.octaves as usize, sample_centre);
    let perlin = Perlin::new(settings.seed as u32);
    let persistence = settings.persistence as f64;
    let lacunarity = settings.lacunarity as f64;

    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let mut map = HeightMap::filled(width, height, 0.0);

    // Строки независимы - считаем параллельно, результат детерминирован
    map.values_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let mut amplitude = 1.0f64;
                let mut frequency = 1.0f64;
                let mut noise_height = 0.0f64;

                for offset in &octaves.offsets {
                    let sample_x = wrap_sample((x as f64 - half_width + offset[0]) / scale * frequency);
                    let sample_y = wrap_sample((y as f64 - half_height + offset[1]) / scale * frequency);
                    // Частота ушла в бесконечность: старшие октавы не вносят вклада
                    let (Some(sample_x), Some(sample_y)) = (sample_x, sample_y) else { break };

                    noise_height += perlin.get([sample_x, sample_y]) * amplitude;
                    amplitude *= persistence;
                    frequency *= lacunarity;
                }

                *cell = noise_height as f32;
            }
        });

    match settings.normalize_mode {
        NormalizeMode::Local => normalize_local(&mut map),
        NormalizeMode::Global => {
            normalize_global(&mut map, octaves.max_possible_height as f32, settings.global_height_factor)
        }
    }

    map
}

/// Растягивает карту на `[0, 1]` по собственным min/max
fn normalize_local(map: &mut HeightMap) {
    let Some((min, max)) = map.min_max() else { return };
    let range = max - min;

    for v in map.values_mut() {
        *v = if range > 0.0 { ((*v - min) / range).clamp(0.0, 1.0) } else { 0.0 };
    }
}

/// Нормализует каждое значение по оценке максимальной амплитуды
///
/// `[-estimate, estimate]` переходит в `[0, 1]`, выбросы зажимаются.
fn normalize_global(map: &mut HeightMap, max_possible_height: f32, factor: f32) {
    let estimate = if factor > 0.0 { max_possible_height * factor } else { max_possible_height };
    if !(estimate > 0.0) {
        map.values_mut().fill(0.0);
        return;
    }

    for v in map.values_mut() {
        *v = ((*v / estimate + 1.0) * 0.5).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: NormalizeMode) -> NoiseSettings {
        NoiseSettings {
            normalize_mode: mode,
            scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 1234,
            offset: [0.0, 0.0],
            global_height_factor: 0.9,
        }
    }

    #[test]
    fn test_values_in_unit_range_both_modes() {
        for mode in [NormalizeMode::Local, NormalizeMode::Global] {
            let map = generate_noise_map(33, 21, &settings(mode), [12.0, -40.0]);
            assert_eq!(map.values().len(), 33 * 21);
            for &v in map.values() {
                assert!((0.0..=1.0).contains(&v), "{:?} produced {}", mode, v);
            }
        }
    }

    #[test]
    fn test_local_mode_spans_unit_range() {
        let map = generate_noise_map(48, 48, &settings(NormalizeMode::Local), [0.0, 0.0]);
        let (min, max) = map.min_max().unwrap();
        assert_eq!(min, 0.0);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        for mode in [NormalizeMode::Local, NormalizeMode::Global] {
            let a = generate_noise_map(40, 40, &settings(mode), [3.0, 5.0]);
            let b = generate_noise_map(40, 40, &settings(mode), [3.0, 5.0]);
            let a_bits: Vec<u32> = a.values().iter().map(|v| v.to_bits()).collect();
            let b_bits: Vec<u32> = b.values().iter().map(|v| v.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_noise_map(24, 24, &settings(NormalizeMode::Local), [0.0, 0.0]);
        let mut other = settings(NormalizeMode::Local);
        other.seed = 4321;
        let b = generate_noise_map(24, 24, &other, [0.0, 0.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_non_positive_octaves_give_flat_map() {
        for octaves in [0, -3] {
            let mut s = settings(NormalizeMode::Local);
            s.octaves = octaves;
            let map = generate_noise_map(10, 10, &s, [0.0, 0.0]);
            assert!(map.values().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_non_positive_scale_is_clamped() {
        for scale in [0.0, -5.0] {
            let mut s = settings(NormalizeMode::Global);
            s.scale = scale;
            let map = generate_noise_map(16, 16, &s, [0.0, 0.0]);
            assert!(map.values().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_global_mode_is_continuous_across_chunks() {
        let s = settings(NormalizeMode::Global);
        let a = generate_noise_map(16, 16, &s, [0.0, 0.0]);
        let b = generate_noise_map(16, 16, &s, [4.0, 0.0]);
        for y in 0..16 {
            for x in 0..12 {
                assert!((a.get(x + 4, y) - b.get(x, y)).abs() < 1e-6);
            }
        }
    }

    #[test]
    #[allow(overflowing_literals)]
    fn test_extreme_sampling_stays_finite() {
        let cases = [(1e-20, 2.0), (50.0, 2.0), (50.0, 1e200)];
        for mode in [NormalizeMode::Local, NormalizeMode::Global] {
            for (scale, lacunarity) in cases {
                let mut s = settings(mode);
                s.scale = scale;
                s.lacunarity = lacunarity;
                s.octaves = 64;
                let map = generate_noise_map(12, 12, &s, [37.0, -11.0]);
                assert!(
                    map.values().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)),
                    "scale {} lacunarity {} in {:?}",
                    scale,
                    lacunarity,
                    mode
                );
            }
        }
    }

    #[test]
    fn test_wrapped_sample_keeps_small_coordinates() {
        assert_eq!(wrap_sample(-1234.5), Some(-1234.5));
        let wrapped = wrap_sample(4.9952e24).unwrap();
        assert!((0.0..SAMPLE_WRAP_PERIOD).contains(&wrapped));
        assert_eq!(wrap_sample(f64::INFINITY), None);
        assert_eq!(wrap_sample(f64::NAN), None);
    }

    #[test]
    fn test_zero_sized_map() {
        let map = generate_noise_map(0, 8, &settings(NormalizeMode::Local), [0.0, 0.0]);
        assert!(map.values().is_empty());
    }
}

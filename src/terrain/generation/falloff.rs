// ============================================
// Falloff Map - Радиальная маска спада (острова)
// ============================================

use serde::{Deserialize, Serialize};

use super::heightmap::HeightMap;

/// Форма кривой спада: `v^a / (v^a + (b - b*v)^a)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalloffShape {
    /// Крутизна перехода
    pub steepness: f32,
    /// Сдвиг перехода к краю
    pub shift: f32,
}

impl Default for FalloffShape {
    fn default() -> Self {
        Self { steepness: 3.0, shift: 2.2 }
    }
}

impl FalloffShape {
    /// Значение спада для нормализованного расстояния `v` в `[0, 1]`
    #[inline]
    pub fn evaluate(&self, v: f32) -> f32 {
        let v = v.clamp(0.0, 1.0);
        let a = v.powf(self.steepness);
        let b = (self.shift - self.shift * v).powf(self.steepness);
        if a + b <= 0.0 {
            return 0.0;
        }
        (a / (a + b)).clamp(0.0, 1.0)
    }
}

/// Маска спада `size x size`: ~0 в центре, 1 на границе
pub fn generate_falloff_map(size: u32, shape: &FalloffShape) -> HeightMap {
    HeightMap::from_fn(size, size, |i, j| {
        let x = i as f32 / size as f32 * 2.0 - 1.0;
        let y = j as f32 / size as f32 * 2.0 - 1.0;
        shape.evaluate(x.abs().max(y.abs()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_in_unit_range() {
        let map = generate_falloff_map(41, &FalloffShape::default());
        assert!(map.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_center_low_border_high() {
        let map = generate_falloff_map(41, &FalloffShape::default());
        assert!(map.get(20, 20) < 0.01);
        assert!(map.get(0, 20) > 0.99);
        assert!(map.get(20, 0) > 0.99);
        assert!(map.get(0, 0) > 0.99);
    }

    #[test]
    fn test_monotonic_from_center() {
        let shape = FalloffShape::default();
        let mut previous = shape.evaluate(0.0);
        for step in 1..=100 {
            let value = shape.evaluate(step as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
        assert_eq!(shape.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_symmetric() {
        let map = generate_falloff_map(32, &FalloffShape::default());
        assert_eq!(map.get(1, 5), map.get(5, 1));
    }
}

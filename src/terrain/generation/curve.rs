// ============================================
// Height Curve - Кривая отклика высоты
// ============================================

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Ключ кривой
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Кусочно-линейная кривая `[0,1] -> [0,1]`
///
/// Ключи отсортированы по `time`. За пределами диапазона ключей значение
/// зажимается крайним ключом.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct HeightCurve {
    keys: Vec<CurveKey>,
}

impl HeightCurve {
    /// Тождественная кривая
    pub fn linear() -> Self {
        Self { keys: vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)] }
    }

    /// Постоянная кривая
    pub fn constant(value: f32) -> Self {
        Self { keys: vec![CurveKey::new(0.0, value)] }
    }

    pub fn from_keys(mut keys: Vec<CurveKey>) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::EmptyCurve);
        }
        if let Some(index) = keys.iter().position(|k| !k.time.is_finite() || !k.value.is_finite()) {
            return Err(ConfigError::NonFiniteCurveKey { index });
        }
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Значение кривой в точке `t` (NaN даёт значение первого ключа)
    pub fn evaluate(&self, t: f32) -> f32 {
        let first = self.keys[0];
        let last = self.keys[self.keys.len() - 1];
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // Первый ключ строго правее t (существует, т.к. t < last.time)
        let upper = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.time) / span)
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl TryFrom<Vec<CurveKey>> for HeightCurve {
    type Error = ConfigError;

    fn try_from(keys: Vec<CurveKey>) -> Result<Self, Self::Error> {
        Self::from_keys(keys)
    }
}

impl From<HeightCurve> for Vec<CurveKey> {
    fn from(curve: HeightCurve) -> Self {
        curve.keys
    }
}

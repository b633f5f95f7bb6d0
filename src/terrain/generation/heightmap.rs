// ============================================
// Height Map - Сетка нормализованных высот
// ============================================

use ndshape::{RuntimeShape, Shape};

/// 2D сетка значений (row-major, x меняется быстрее)
///
/// Для чанка размера `size` сетка имеет размер `(size + 2) x (size + 2)`:
/// внешнее кольцо нужно только для нормалей на краях меша.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
    falloff_applied: bool,
}

impl HeightMap {
    /// Сетка, заполненная одним значением
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value; width as usize * height as usize],
            falloff_applied: false,
        }
    }

    /// Сетка из готовых значений (row-major)
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        if values.len() != width as usize * height as usize {
            return None;
        }
        Some(Self { width, height, values, falloff_applied: false })
    }

    /// Сетка, заполненная функцией от координат
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f32) -> Self {
        let shape = RuntimeShape::<u32, 2>::new([width, height]);
        let values = (0..shape.size())
            .map(|i| {
                let [x, y] = shape.delinearize(i);
                f(x, y)
            })
            .collect();
        Self { width, height, values, falloff_applied: false }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn shape(&self) -> RuntimeShape<u32, 2> {
        RuntimeShape::<u32, 2>::new([self.width, self.height])
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[self.shape().linearize([x, y]) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        let i = self.shape().linearize([x, y]) as usize;
        self.values[i] = value;
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Минимум и максимум сетки (None для пустой)
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v))))
    }

    /// Была ли уже применена маска спада
    pub fn falloff_applied(&self) -> bool {
        self.falloff_applied
    }

    pub(crate) fn mark_falloff_applied(&mut self) {
        self.falloff_applied = true;
    }
}

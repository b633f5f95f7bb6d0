// ============================================
// Falloff Cache - Кэш масок спада по размеру
// ============================================
// Живёт только в потоке-владельце; рабочие потоки получают Arc.

use std::collections::HashMap;
use std::sync::Arc;

use crate::terrain::generation::{generate_falloff_map, FalloffShape, HeightMap};

/// Кэш масок спада: один экземпляр на каждый размер сетки
pub struct FalloffCache {
    maps: HashMap<u32, Arc<HeightMap>>,
    shape: FalloffShape,
}

impl FalloffCache {
    pub fn new(shape: FalloffShape) -> Self {
        Self { maps: HashMap::new(), shape }
    }

    /// Маска для размера `size`; генерируется только при промахе
    pub fn get_or_generate(&mut self, size: u32) -> Arc<HeightMap> {
        let shape = self.shape;
        self.maps
            .entry(size)
            .or_insert_with(|| {
                log::debug!("Generating falloff map {}x{}", size, size);
                Arc::new(generate_falloff_map(size, &shape))
            })
            .clone()
    }

    /// Сменить форму спада (сбрасывает кэш при изменении)
    pub fn set_shape(&mut self, shape: FalloffShape) {
        if self.shape != shape {
            self.shape = shape;
            self.invalidate();
        }
    }

    /// Сбросить все маски (после изменения настроек)
    pub fn invalidate(&mut self) {
        if !self.maps.is_empty() {
            log::debug!("Invalidating {} cached falloff map(s)", self.maps.len());
        }
        self.maps.clear();
    }

    pub fn contains(&self, size: u32) -> bool {
        self.maps.contains_key(&size)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl Default for FalloffCache {
    fn default() -> Self {
        Self::new(FalloffShape::default())
    }
}

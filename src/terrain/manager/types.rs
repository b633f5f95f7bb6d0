use std::sync::Arc;

use crate::error::MeshError;
use crate::terrain::config::GeneratorSettings;
use crate::terrain::generation::{generate_height_map, HeightMap};
use crate::terrain::mesh::{generate_terrain_mesh, MeshData};

/// Карта высот чанка (неизменяемая, дёшево клонируется)
#[derive(Clone, Debug, PartialEq)]
pub struct MapData {
    height_map: Arc<HeightMap>,
}

impl MapData {
    pub fn new(height_map: HeightMap) -> Self {
        Self { height_map: Arc::new(height_map) }
    }

    pub fn height_map(&self) -> &HeightMap {
        &self.height_map
    }
}

/// Запрос на карту высот: центр + снимок настроек + готовая маска спада
pub(super) struct MapRequest {
    pub centre: [f32; 2],
    pub settings: Arc<GeneratorSettings>,
    pub falloff: Option<Arc<HeightMap>>,
}

impl MapRequest {
    pub fn run(self) -> MapData {
        MapData::new(generate_height_map(
            self.centre,
            &self.settings.terrain,
            &self.settings.noise,
            self.falloff.as_deref(),
        ))
    }
}

/// Запрос на меш: карта + LOD + снимок настроек
pub(super) struct MeshRequest {
    pub map: MapData,
    pub lod: u32,
    pub settings: Arc<GeneratorSettings>,
}

impl MeshRequest {
    pub fn run(self) -> Result<MeshData, MeshError> {
        let terrain = &self.settings.terrain;
        generate_terrain_mesh(
            self.map.height_map(),
            terrain.mesh_height_multiplier,
            &terrain.mesh_height_curve,
            self.lod,
            terrain.use_flat_shading,
        )
    }
}

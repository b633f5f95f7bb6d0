// ============================================
// Terrain Preview - Генерация одного чанка из консоли
// ============================================
// terrain_preview [settings.json]
// Запрашивает карту высот, затем меши всех поддерживаемых LOD,
// и печатает статистику через log (RUST_LOG=info).

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use terrain_chunks::terrain::LodLevel;
use terrain_chunks::{GeneratorSettings, MapData, MeshData, TerrainError, TerrainManager};

const TIMEOUT: Duration = Duration::from_secs(60);

fn load_settings() -> Result<GeneratorSettings, TerrainError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading settings from {}", path);
            Ok(GeneratorSettings::load_from_file(&path)?)
        }
        None => Ok(GeneratorSettings::default()),
    }
}

/// Крутит update, пока `done` не вернёт true или не истечёт таймаут
fn pump_until(manager: &mut TerrainManager, mut done: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while !done() {
        if started.elapsed() > TIMEOUT {
            return false;
        }
        manager.update();
        thread::sleep(Duration::from_millis(2));
    }
    true
}

fn log_mesh(mesh: &MeshData) {
    let (min, max) = mesh.bounds();
    log::info!(
        "LOD {}: {} vertices, {} triangles, {} shading, bounds [{:.1}, {:.1}]..[{:.1}, {:.1}]",
        mesh.lod(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        if mesh.is_flat_shaded() { "flat" } else { "smooth" },
        min[0],
        min[1],
        max[0],
        max[1],
    );
}

fn run() -> Result<(), TerrainError> {
    let settings = load_settings()?;
    let mut manager = TerrainManager::new(settings)?;
    let chunk_size = manager.chunk_size();
    let terrain = &manager.settings().terrain;
    log::info!(
        "Chunk size {} (height range {:.1}..{:.1})",
        chunk_size,
        terrain.min_height(),
        terrain.max_height()
    );

    let map_slot: Arc<Mutex<Option<MapData>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&map_slot);
    let started = Instant::now();
    manager.request_map_data([0.0, 0.0], move |map| {
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(map);
        }
    })?;

    let map_ready = pump_until(&mut manager, || map_slot.lock().map(|s| s.is_some()).unwrap_or(false));
    let map = match map_slot.lock().ok().and_then(|mut s| s.take()) {
        Some(map) if map_ready => map,
        _ => {
            log::error!("Height map did not arrive within {:?}", TIMEOUT);
            return Ok(());
        }
    };
    let (lo, hi) = map.height_map().min_max().unwrap_or((0.0, 0.0));
    log::info!(
        "Height map {}x{} in {:?}, values {:.3}..{:.3}, falloff {}",
        map.height_map().width(),
        map.height_map().height(),
        started.elapsed(),
        lo,
        hi,
        map.height_map().falloff_applied(),
    );

    let meshes: Arc<Mutex<Vec<MeshData>>> = Arc::new(Mutex::new(Vec::new()));
    let mut requested = 0;
    for level in LodLevel::supported_for(chunk_size) {
        let meshes = Arc::clone(&meshes);
        manager.request_mesh_data(&map, level.lod, move |mesh| {
            if let Ok(mut meshes) = meshes.lock() {
                meshes.push(mesh);
            }
        })?;
        requested += 1;
    }

    let complete = pump_until(&mut manager, || meshes.lock().map(|m| m.len() >= requested).unwrap_or(true));
    if !complete {
        log::warn!("Only part of the {} mesh(es) arrived before timeout", requested);
    }

    if let Ok(mut meshes) = meshes.lock() {
        meshes.sort_by_key(MeshData::lod);
        meshes.iter().for_each(log_mesh);
    }
    log::info!("Done in {:?}", started.elapsed());
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("Terrain preview failed: {}", e);
        std::process::exit(1);
    }
}

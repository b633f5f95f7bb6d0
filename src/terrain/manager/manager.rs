use std::sync::Arc;

use super::dispatcher::GenerationDispatcher;
use super::queue::ResultQueue;
use super::types::{MapData, MapRequest, MeshRequest};
use crate::error::{MeshError, TerrainError};
use crate::terrain::cache::FalloffCache;
use crate::terrain::config::GeneratorSettings;
use crate::terrain::generation::{bordered_size, HeightMap};
use crate::terrain::mesh::{validate_mesh_params, MeshData};

/// Асинхронный менеджер генерации чанков
///
/// Настройки, кэш масок спада и вызов обработчиков принадлежат потоку,
/// который владеет менеджером. Обработчики вызываются только из
/// [`TerrainManager::update`], его нужно вызывать раз в кадр.
pub struct TerrainManager {
    settings: Arc<GeneratorSettings>,
    dispatcher: GenerationDispatcher,
    falloff_cache: FalloffCache,
    map_results: Arc<ResultQueue<MapData>>,
    mesh_results: Arc<ResultQueue<Result<MeshData, MeshError>>>,
}

impl TerrainManager {
    pub fn new(settings: GeneratorSettings) -> Result<Self, TerrainError> {
        settings.noise.validate();
        let dispatcher = GenerationDispatcher::new(&settings.dispatcher)?;
        let falloff_cache = FalloffCache::new(settings.terrain.falloff);

        Ok(Self {
            settings: Arc::new(settings),
            dispatcher,
            falloff_cache,
            map_results: Arc::new(ResultQueue::new()),
            mesh_results: Arc::new(ResultQueue::new()),
        })
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Установить новый снимок настроек
    ///
    /// Уже запущенные задачи доработают со старым снимком. Кэш масок спада
    /// сбрасывается. Параметры пула применяются только при создании менеджера.
    pub fn apply_settings(&mut self, settings: GeneratorSettings) {
        settings.noise.validate();
        if settings.dispatcher != self.settings.dispatcher {
            log::warn!("Dispatcher settings changed; they take effect on the next manager");
        }
        self.falloff_cache.set_shape(settings.terrain.falloff);
        self.falloff_cache.invalidate();
        self.settings = Arc::new(settings);
    }

    /// Размер стороны чанка для текущих настроек
    pub fn chunk_size(&self) -> u32 {
        self.settings.terrain.chunk_size()
    }

    /// Маска спада для текущего размера чанка (только если спад включён)
    fn falloff_for_current_size(&mut self) -> Option<Arc<HeightMap>> {
        if !self.settings.terrain.use_falloff {
            return None;
        }
        Some(self.falloff_cache.get_or_generate(bordered_size(self.chunk_size())))
    }

    fn map_request(&mut self, centre: [f32; 2]) -> MapRequest {
        MapRequest {
            centre,
            settings: Arc::clone(&self.settings),
            falloff: self.falloff_for_current_size(),
        }
    }

    /// Запросить карту высот чанка с центром `centre`
    pub fn request_map_data<F>(&mut self, centre: [f32; 2], callback: F) -> Result<(), TerrainError>
    where
        F: FnOnce(MapData) + Send + 'static,
    {
        let request = self.map_request(centre);
        self.dispatcher.submit(&self.map_results, move || request.run(), Box::new(callback))?;
        Ok(())
    }

    /// Запросить меш для карты `map` на уровне `lod`
    ///
    /// Несовместимые LOD и размер карты отклоняются сразу, до постановки задачи.
    pub fn request_mesh_data<F>(&self, map: &MapData, lod: u32, callback: F) -> Result<(), TerrainError>
    where
        F: FnOnce(MeshData) + Send + 'static,
    {
        validate_mesh_params(map.height_map(), lod)?;

        let request = MeshRequest {
            map: map.clone(),
            lod,
            settings: Arc::clone(&self.settings),
        };
        let on_complete = Box::new(move |result: Result<MeshData, MeshError>| match result {
            Ok(mesh) => callback(mesh),
            Err(e) => log::error!("Mesh generation failed for LOD {}: {}", lod, e),
        });
        self.dispatcher.submit(&self.mesh_results, move || request.run(), on_complete)?;
        Ok(())
    }

    /// Синхронная генерация карты высот (превью, первый чанк)
    pub fn generate_map_data_now(&mut self, centre: [f32; 2]) -> MapData {
        self.map_request(centre).run()
    }

    /// Синхронная генерация меша
    pub fn generate_mesh_data_now(&self, map: &MapData, lod: u32) -> Result<MeshData, MeshError> {
        MeshRequest {
            map: map.clone(),
            lod,
            settings: Arc::clone(&self.settings),
        }
        .run()
    }

    /// Вызвать обработчики готовых результатов (раз в кадр)
    ///
    /// Очереди карт и мешей разбираются независимо. Возвращает число
    /// вызванных обработчиков.
    pub fn update(&mut self) -> usize {
        let maps = self.map_results.drain();
        let meshes = self.mesh_results.drain();
        if maps + meshes > 0 {
            log::debug!("Delivered {} map(s) and {} mesh(es)", maps, meshes);
        }
        maps + meshes
    }

    /// Результаты, ожидающие следующего `update`
    pub fn pending_results(&self) -> usize {
        self.map_results.len() + self.mesh_results.len()
    }

    /// Задачи, ещё выполняющиеся в фоне
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    pub fn falloff_cache(&self) -> &FalloffCache {
        &self.falloff_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::config::{DispatcherSettings, NoiseSettings, TerrainSettings};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    fn settings(use_falloff: bool, octaves: i32) -> GeneratorSettings {
        GeneratorSettings {
            terrain: TerrainSettings { use_flat_shading: true, use_falloff, ..Default::default() },
            noise: NoiseSettings { octaves, ..Default::default() },
            dispatcher: DispatcherSettings { worker_threads: 2, capacity: 16 },
        }
    }

    fn manager(settings: GeneratorSettings) -> TerrainManager {
        let _ = env_logger::builder().is_test(true).try_init();
        TerrainManager::new(settings).unwrap()
    }

    /// Крутит update, пока не сработает `expected` обработчиков
    fn pump(manager: &mut TerrainManager, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut fired = 0;
        while fired < expected {
            assert!(Instant::now() < deadline, "only {} of {} callbacks fired", fired, expected);
            fired += manager.update();
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_flat_noise_scenario() {
        let mut manager = manager(settings(false, 0));
        let map_slot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&map_slot);
        manager.request_map_data([0.0, 0.0], move |map| *slot.lock().unwrap() = Some(map)).unwrap();
        pump(&mut manager, 1);

        let map = map_slot.lock().unwrap().take().unwrap();
        let first = map.height_map().values()[0];
        assert!(map.height_map().values().iter().all(|&v| v == first));
        assert_eq!(map.height_map().width(), manager.chunk_size() + 2);

        let mesh_slot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&mesh_slot);
        manager.request_mesh_data(&map, 0, move |mesh| *slot.lock().unwrap() = Some(mesh)).unwrap();
        pump(&mut manager, 1);

        let mesh = mesh_slot.lock().unwrap().take().unwrap();
        let size = manager.chunk_size() as usize;
        assert_eq!(mesh.triangle_count(), (size - 1) * (size - 1) * 2);
        let height = mesh.positions()[0][1];
        assert!(mesh.positions().iter().all(|p| p[1] == height));
    }

    #[test]
    fn test_callbacks_run_on_owning_thread() {
        let mut manager = manager(settings(false, 3));
        let owner = thread::current().id();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let seen = Arc::clone(&seen);
            manager
                .request_map_data([i as f32 * 95.0, 0.0], move |_| seen.lock().unwrap().push(thread::current().id()))
                .unwrap();
        }
        pump(&mut manager, 4);
        assert!(seen.lock().unwrap().iter().all(|id| *id == owner));
    }

    #[test]
    fn test_no_callbacks_without_update() {
        let mut manager = manager(settings(false, 2));
        manager.request_map_data([0.0, 0.0], |_| panic!("must not run before update")).unwrap();
        let deadline = Instant::now() + Duration::from_secs(30);
        while manager.in_flight() > 0 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(manager.pending_results(), 1);
    }

    #[test]
    fn test_async_matches_sync_generation() {
        let mut manager = manager(settings(true, 4));
        let expected = manager.generate_map_data_now([12.0, -3.0]);
        let slot = Arc::new(Mutex::new(None));
        let target = Arc::clone(&slot);
        manager.request_map_data([12.0, -3.0], move |map| *target.lock().unwrap() = Some(map)).unwrap();
        pump(&mut manager, 1);
        assert_eq!(slot.lock().unwrap().take(), Some(expected));
    }

    #[test]
    fn test_falloff_cache_follows_settings() {
        let mut manager = manager(settings(true, 3));
        let map = manager.generate_map_data_now([0.0, 0.0]);
        assert!(map.height_map().falloff_applied());
        assert!(manager.falloff_cache().contains(97));

        let mut smooth = settings(true, 3);
        smooth.terrain.use_flat_shading = false;
        manager.apply_settings(smooth);
        assert!(manager.falloff_cache().is_empty());
        assert_eq!(manager.chunk_size(), 239);

        manager.generate_map_data_now([0.0, 0.0]);
        assert!(manager.falloff_cache().contains(241));
        assert!(!manager.falloff_cache().contains(97));
    }

    #[test]
    fn test_falloff_not_generated_when_disabled() {
        let mut manager = manager(settings(false, 3));
        let map = manager.generate_map_data_now([0.0, 0.0]);
        assert!(!map.height_map().falloff_applied());
        assert!(manager.falloff_cache().is_empty());
    }

    #[test]
    fn test_invalid_lod_rejected_before_dispatch() {
        let mut manager = manager(settings(false, 3));
        let map = manager.generate_map_data_now([0.0, 0.0]);
        let result = manager.request_mesh_data(&map, 7, |_| {});
        assert!(matches!(result, Err(TerrainError::Mesh(MeshError::UnsupportedLod { lod: 7, .. }))));
        assert_eq!(manager.in_flight(), 0);
    }

    #[test]
    fn test_queues_drain_separately() {
        let mut manager = manager(settings(false, 3));
        for _ in 0..2 {
            manager.map_results.push(Box::new(|_: MapData| {}), MapData::new(HeightMap::filled(3, 3, 0.0)));
        }
        let mesh_fired = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&mesh_fired);
        manager.mesh_results.push(
            Box::new(move |_: Result<MeshData, MeshError>| *counter.lock().unwrap() += 1),
            Err(MeshError::NotSquare { width: 3, height: 4 }),
        );

        assert_eq!(manager.mesh_results.drain(), 1);
        assert_eq!(*mesh_fired.lock().unwrap(), 1);
        assert_eq!(manager.map_results.len(), 2);

        assert_eq!(manager.map_results.drain(), 2);
        assert!(manager.mesh_results.is_empty());
        assert_eq!(manager.update(), 0);
    }

    #[test]
    fn test_mesh_and_map_queues_are_independent() {
        let mut manager = manager(settings(false, 3));
        let map = manager.generate_map_data_now([0.0, 0.0]);
        let lods = Arc::new(Mutex::new(Vec::new()));
        for lod in [0, 2, 4] {
            let lods = Arc::clone(&lods);
            manager.request_mesh_data(&map, lod, move |mesh| lods.lock().unwrap().push(mesh.lod())).unwrap();
        }
        manager.request_map_data([95.0, 0.0], |_| {}).unwrap();
        pump(&mut manager, 4);

        let mut lods = lods.lock().unwrap().clone();
        lods.sort_unstable();
        assert_eq!(lods, vec![0, 2, 4]);
    }
}

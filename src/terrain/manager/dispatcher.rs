// ============================================
// Generation Dispatcher - Фоновое выполнение задач
// ============================================
// Ограниченный пул потоков вместо потока на каждый запрос.
// Сверх лимита задач запросы отклоняются (backpressure).

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::queue::{Callback, ResultQueue};
use crate::error::DispatchError;
use crate::terrain::config::DispatcherSettings;

/// Уменьшает счётчик задач при завершении (в том числе при панике)
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}

/// Пул фоновых задач генерации
pub struct GenerationDispatcher {
    pool: ThreadPool,
    in_flight: Arc<AtomicUsize>,
    capacity: usize,
}

impl GenerationDispatcher {
    pub fn new(settings: &DispatcherSettings) -> Result<Self, DispatchError> {
        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|i| format!("terrain-worker-{}", i))
            .panic_handler(|payload| {
                log::error!("Terrain job panicked, result dropped: {}", panic_message(payload.as_ref()));
            });
        if settings.worker_threads > 0 {
            builder = builder.num_threads(settings.worker_threads);
        }
        let pool = builder.build()?;

        log::info!(
            "Terrain dispatcher started: {} worker(s), capacity {}",
            pool.current_num_threads(),
            settings.capacity.max(1)
        );

        Ok(Self {
            pool,
            in_flight: Arc::new(AtomicUsize::new(0)),
            capacity: settings.capacity.max(1),
        })
    }

    /// Запустить `job` в фоне; результат вместе с `on_complete` попадёт в `queue`
    ///
    /// Задача всегда выполняется до конца, отмены нет. Если лимит задач
    /// исчерпан, запрос отклоняется с [`DispatchError::AtCapacity`].
    pub fn submit<T, J>(&self, queue: &Arc<ResultQueue<T>>, job: J, on_complete: Callback<T>) -> Result<(), DispatchError>
    where
        T: Send + 'static,
        J: FnOnce() -> T + Send + 'static,
    {
        let capacity = self.capacity;
        let reserved = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < capacity).then_some(n + 1));
        if reserved.is_err() {
            log::warn!("Terrain dispatcher at capacity ({} jobs in flight), request rejected", capacity);
            return Err(DispatchError::AtCapacity { capacity });
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let queue = Arc::clone(queue);
        self.pool.spawn(move || {
            // Счётчик уменьшается только после постановки результата в очередь
            let _guard = guard;
            let result = job();
            queue.push(on_complete, result);
        });
        Ok(())
    }

    /// Задач в работе (ещё не попавших в очередь результатов)
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

// ============================================
// Result Queue - Очередь готовых результатов
// ============================================
// Рабочие потоки добавляют (callback, result), поток-владелец
// забирает всё накопленное за один вызов drain().

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Обработчик результата (вызывается в потоке-владельце)
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

type Entry<T> = (Callback<T>, T);

/// Снимок очереди на время `drain`
///
/// Если обработчик паникует, невызванные записи возвращаются в начало
/// очереди в исходном порядке.
struct Batch<'a, T> {
    queue: &'a ResultQueue<T>,
    entries: VecDeque<Entry<T>>,
}

impl<T> Drop for Batch<'_, T> {
    fn drop(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        log::error!("Result callback panicked, {} result(s) requeued", self.entries.len());
        let mut pending = self.queue.lock();
        while let Some(entry) = self.entries.pop_back() {
            pending.push_front(entry);
        }
    }
}

/// Потокобезопасная FIFO очередь результатов
///
/// Если `drain` не вызывается, очередь растёт без ограничений:
/// вызывать его раз в цикл обновления - обязанность владельца.
pub struct ResultQueue<T> {
    entries: Mutex<VecDeque<Entry<T>>>,
}

impl<T> ResultQueue<T> {
    pub fn new() -> Self {
        Self { entries: Mutex::new(VecDeque::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Entry<T>>> {
        // Отравление игнорируем: вставка и извлечение не оставляют очередь в частичном состоянии
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Добавить результат (блокировка только на время вставки)
    pub fn push(&self, callback: Callback<T>, result: T) {
        self.lock().push_back((callback, result));
    }

    /// Количество ожидающих результатов
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Вызвать обработчики для всех результатов, накопленных к этому моменту
    ///
    /// Результаты, добавленные во время вызова обработчиков, остаются
    /// до следующего `drain`. Возвращает число вызванных обработчиков.
    /// Паника обработчика пробрасывается вызывающему, остальные результаты
    /// снимка остаются в очереди.
    pub fn drain(&self) -> usize {
        let mut batch = Batch { queue: self, entries: std::mem::take(&mut *self.lock()) };
        let mut count = 0;
        while let Some((callback, result)) = batch.entries.pop_front() {
            count += 1;
            callback(result);
        }
        count
    }
}

impl<T> Default for ResultQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_in_fifo_order() {
        let queue = ResultQueue::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let seen = Arc::clone(&seen);
            queue.push(Box::new(move |v: i32| seen.lock().unwrap().push(v)), i);
        }
        assert_eq!(queue.drain(), 5);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_results_pushed_during_drain_are_deferred() {
        let queue: Arc<ResultQueue<u32>> = Arc::new(ResultQueue::new());
        let requeue = Arc::clone(&queue);
        queue.push(
            Box::new(move |v: u32| {
                requeue.push(Box::new(|_: u32| {}), v + 1);
            }),
            1,
        );
        queue.push(Box::new(|_: u32| {}), 2);

        assert_eq!(queue.drain(), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain(), 1);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_panicking_callback_keeps_rest_of_batch() {
        let queue: ResultQueue<u32> = ResultQueue::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 1..=4u32 {
            let seen = Arc::clone(&seen);
            queue.push(
                Box::new(move |v: u32| {
                    if v == 2 {
                        panic!("callback failed");
                    }
                    seen.lock().unwrap().push(v);
                }),
                i,
            );
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| queue.drain()));
        assert!(result.is_err());
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.drain(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 3, 4]);
    }

    #[test]
    fn test_concurrent_push() {
        let queue: Arc<ResultQueue<usize>> = Arc::new(ResultQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..100 {
                        queue.push(Box::new(|_: usize| {}), t * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 800);
        assert_eq!(queue.drain(), 800);
    }
}

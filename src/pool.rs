use super::{
    errors::{PoolError, PoolResult},
    guarded::Guarded,
    model::{PoolMetrics, TaskFailure},
    queue::BlockingQueue,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};


pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct Job {
    id: u64,
    task: Task,
}


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "fixed-pool".to_owned(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    pub fn cpu_bound() -> Self {
        Self::default()
    }

    pub fn io_bound() -> Self {
        Self::new(num_cpus::get() * 2) // потоки часто спят в I/O
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}


/// Состояние, общее для пула и его воркеров
struct Shared {
    queue: BlockingQueue<Job>,
    next_id: AtomicU64,
    active: AtomicUsize,
    submitted: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
    stopped: AtomicBool,
    pending: Mutex<usize>,
    all_done: Condvar,
    failures: Guarded<Vec<TaskFailure>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: BlockingQueue::new(),
            next_id: AtomicU64::new(0),
            active: AtomicUsize::new(0),
            submitted: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            panicked: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            pending: Mutex::new(0),
            all_done: Condvar::new(),
            failures: Guarded::default(),
        }
    }

    fn worker_loop(&self, worker: usize) {
        tracing::debug!(worker, "worker started");
        // None означает: очередь отменена и пуста
        while let Some(job) = self.queue.pop(true) {
            self.run(worker, job);
        }
        tracing::debug!(worker, "worker terminated");
    }

    fn run(&self, worker: usize, job: Job) {
        let Job { id, task } = job;

        self.active.fetch_add(1, Ordering::Relaxed);
        let outcome = panic::catch_unwind(AssertUnwindSafe(task));
        self.active.fetch_sub(1, Ordering::Relaxed);

        match outcome {
            Ok(()) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                self.panicked.fetch_add(1, Ordering::Relaxed);
                let message = panic_message(payload.as_ref());
                tracing::warn!(worker, task_id = id, %message, "task panicked, worker continues");
                self.failures.apply(|failures| {
                    failures.push(TaskFailure {
                        task_id: id,
                        worker,
                        message,
                    })
                });
            }
        }

        self.finish(1);
    }

    #[inline]
    fn lock_pending(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, count: usize) {
        let mut pending = self.lock_pending();
        *pending = pending.saturating_sub(count);
        if *pending == 0 {
            self.all_done.notify_all();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}


/// Пул фиксированного размера поверх одной общей `BlockingQueue`.
///
/// Потоки запускаются в конструкторе и живут до `stop()` (или drop).
/// Остановка кооперативная: уже поставленные задачи дорабатываются.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    config: Config,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> PoolResult<Self> {
        Self::with_config(Config::new(num_threads))
    }

    /// Размер пула равен числу логических CPU
    pub fn with_default_threads() -> PoolResult<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> PoolResult<Self> {
        if config.num_threads == 0 {
            return Err(PoolError::NoWorkers);
        }

        let shared = Arc::new(Shared::new());
        let mut workers = Vec::with_capacity(config.num_threads);

        for index in 0..config.num_threads {
            let mut builder = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index));
            if let Some(bytes) = config.stack_size {
                builder = builder.stack_size(bytes);
            }

            let worker_shared = Arc::clone(&shared);
            match builder.spawn(move || worker_shared.worker_loop(index)) {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    shared.queue.cancel();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(PoolError::Spawn { index, source });
                }
            }
        }

        tracing::debug!(threads = config.num_threads, prefix = %config.thread_name_prefix, "thread pool started");

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            config,
        })
    }

    /// Ставит задачу в очередь и сразу возвращается. Очередь не ограничена
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_boxed(Box::new(task));
    }

    pub fn submit_boxed(&self, task: Task) {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.submitted.fetch_add(1, Ordering::Relaxed);
        *self.shared.lock_pending() += 1;
        self.shared.queue.push(Job { id, task });
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.config.num_threads
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Ждёт завершения всех отправленных к этому моменту задач, не останавливая пул.
    /// После `stop()` возвращается сразу
    pub fn join(&self) {
        let mut pending = self.shared.lock_pending();
        while *pending > 0 && !self.is_stopped() {
            pending = self
                .shared
                .all_done
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Отменяет очередь и дожидается выхода всех воркеров.
    ///
    /// Воркеры сначала дорабатывают всё, что уже лежит в очереди.
    /// Повторный вызов безопасен; конкурентный вызов ждёт первого.
    /// Исключение: при вызове из задачи пула свой воркер не джойнится и может
    /// дорабатывать очередь уже после того, как `is_stopped()` вернул `true`.
    pub fn stop(&self) {
        self.shared.queue.cancel();

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut detached = false;
        let current = thread::current().id();

        for handle in workers.drain(..) {
            // stop() из задачи самого пула: свой поток не джойним
            if handle.thread().id() == current {
                detached = true;
                continue;
            }
            if let Err(payload) = handle.join() {
                tracing::error!(message = %panic_message(payload.as_ref()), "worker thread panicked outside of a task");
            }
        }

        if !detached {
            let mut discarded = 0;
            while self.shared.queue.pop(false).is_some() {
                discarded += 1;
            }
            if discarded > 0 {
                tracing::warn!(discarded, "tasks submitted after stop were discarded");
                self.shared.finish(discarded);
            }
        }

        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!(threads = self.size(), "thread pool stopped");
        }

        let _pending = self.shared.lock_pending();
        self.shared.all_done.notify_all();
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.size(),
            active_tasks: self.shared.active.load(Ordering::Relaxed),
            queued_tasks: self.shared.queue.len(),
            submitted_tasks: self.shared.submitted.load(Ordering::Relaxed),
            completed_tasks: self.shared.completed.load(Ordering::Relaxed),
            panicked_tasks: self.shared.panicked.load(Ordering::Relaxed),
        }
    }

    /// Снимок записей о запаниковавших задачах
    pub fn failures(&self) -> Vec<TaskFailure> {
        self.shared.failures.get()
    }

    pub fn take_failures(&self) -> Vec<TaskFailure> {
        self.shared.failures.take()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

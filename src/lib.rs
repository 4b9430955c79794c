//! Пул потоков фиксированного размера поверх блокирующей очереди
//!
//! # Features
//! - Фиксированное число OS-потоков, создаются в конструкторе
//! - FIFO-очередь без ограничения размера, `submit` никогда не блокирует
//! - Кооперативная остановка: очередь дорабатывается до конца
//! - Паники задач перехватываются, воркер продолжает работу
//! - `Guarded<T>` для безопасной агрегации результатов из задач
//! - Метрики и журнал упавших задач

pub mod errors;
pub mod guarded;
pub mod model;
pub mod pool;
pub mod queue;

pub use errors::{PoolError, PoolResult};
pub use guarded::Guarded;
pub use model::{PoolMetrics, TaskFailure};
pub use pool::{Config, Task, ThreadPool};
pub use queue::BlockingQueue;

use std::io;
use thiserror::Error;


/// Ошибки создания пула. Сами задачи ошибок наружу не возвращают
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("thread pool requires at least one worker thread")]
    NoWorkers,

    #[error("failed to spawn worker thread #{index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },
}

pub type PoolResult<T> = Result<T, PoolError>;

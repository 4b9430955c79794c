use fixed_pool::{Guarded, ThreadPool};
use std::{sync::Arc, time::Instant};
use tracing_subscriber::EnvFilter;


#[derive(Debug, Clone, Default)]
struct Accumulator {
    sum: u64,
    count: usize,
}

const CHUNKS: usize = 80;
const CHUNK_LEN: usize = 1_000_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let now = Instant::now();
    let pool = ThreadPool::with_default_threads()?;
    let values: Arc<Vec<u64>> = Arc::new(vec![1; CHUNKS * CHUNK_LEN]);
    let acc = Arc::new(Guarded::new(Accumulator::default()));

    for chunk in 0..CHUNKS {
        let values = Arc::clone(&values);
        let acc = Arc::clone(&acc);
        pool.submit(move || {
            let lower = chunk * CHUNK_LEN;
            let sum: u64 = values[lower..lower + CHUNK_LEN].iter().sum();
            acc.apply(|a| {
                a.sum += sum;
                a.count += 1;
            });
        });
    }

    pool.stop();

    let total = acc.get();
    tracing::info!(
        threads = pool.size(),
        chunks = total.count,
        sum = total.sum,
        elapsed = ?now.elapsed(),
        "chunked sum finished"
    );
    Ok(())
}

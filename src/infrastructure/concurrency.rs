/// Thread pool setup for batch runs.
/// Files are fixed independently, so the pool is only sized, never shared state.

use anyhow::{Context, Result};

/// Worker count: the requested number, or half the cores (at least one) so an
/// editor running alongside stays responsive.
pub fn worker_count(requested: Option<usize>) -> usize {
    match requested {
        Some(jobs) if jobs > 0 => jobs,
        _ => std::cmp::max(1, num_cpus::get() / 2),
    }
}

/// Initialize the global rayon thread pool.
pub fn init_thread_pool(requested: Option<usize>) -> Result<usize> {
    let workers = worker_count(requested);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("ctorprops-worker-{i}"))
        .build_global()
        .context("Failed to initialize the global thread pool")?;

    tracing::debug!(
        workers,
        cores = num_cpus::get(),
        "initialized thread pool"
    );

    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_job_count_wins() {
        assert_eq!(worker_count(Some(3)), 3);
    }

    #[test]
    fn default_reserves_half_the_cores() {
        let workers = worker_count(None);
        assert!(workers >= 1);
        assert!(workers <= num_cpus::get());
        assert_eq!(worker_count(Some(0)), workers);
    }
}

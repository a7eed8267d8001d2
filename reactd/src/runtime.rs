use crate::config::RuntimeConfig;
use anyhow::Result;
use tokio::runtime::Runtime;

/// Build the Tokio runtime that hosts signal handling.
pub fn create_runtime(config: &RuntimeConfig) -> Result<Runtime> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .max_blocking_threads(config.max_blocking_threads)
        .thread_name(config.thread_name.clone())
        .thread_stack_size(config.thread_stack_size)
        .enable_all()
        .build()?;

    Ok(rt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_from_default_config() {
        let rt = create_runtime(&RuntimeConfig::default()).unwrap();
        let value = rt.block_on(async { 40 + 2 });
        assert_eq!(value, 42);
    }
}

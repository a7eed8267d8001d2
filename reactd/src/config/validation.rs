//! Configuration validation utilities.
//!
//! Cross-section sanity checks that cannot be expressed by a single
//! section's `validate`.

use super::ServerConfig;

/// Check that resource limits make sense together.
///
/// Returns warnings only; none of these conditions stop the server.
pub fn resource_warnings(config: &ServerConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let reactor = &config.global.reactor;

    // Each session holds one descriptor; every worker also holds its listener.
    let wanted = reactor
        .workers
        .saturating_mul(reactor.max_sessions_per_worker.saturating_add(1));
    if let Some(limit) = open_file_limit() {
        if wanted as u64 > limit {
            warnings.push(format!(
                "reactor.workers ({}) * max_sessions_per_worker ({}) needs ~{} descriptors \
                 but the open file limit is {}",
                reactor.workers, reactor.max_sessions_per_worker, wanted, limit
            ));
        }
    }

    if reactor.workers > num_cpus::get() * 2 {
        warnings.push(format!(
            "reactor.workers ({}) is more than twice the number of CPUs ({})",
            reactor.workers,
            num_cpus::get()
        ));
    }

    warnings
}

/// Soft `RLIMIT_NOFILE`, or `None` if it is unlimited or cannot be read.
fn open_file_limit() -> Option<u64> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `rlim` is a valid, writable rlimit for the duration of the call.
    let ret = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
    if ret != 0 || rlim.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    Some(rlim.rlim_cur as u64)
}

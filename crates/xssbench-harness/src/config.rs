//! Runtime configuration, grounded on `page_handler::config::ValorConfig`:
//! a plain struct with a `from_env()` constructor reading `XSSBENCH_*`
//! environment variables with numeric parsing and sane fallbacks, plus an
//! explicit constructor for programmatic/CLI-flag use. CLI flags override
//! the environment the same way `--timeout-ms` is described in §6/§9 as an
//! override of an adaptive default.

use std::env;

use crate::page_controller::TimeoutBudget;

/// Runtime configuration for one harness run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Number of concurrent workers (`--workers`).
    pub workers: usize,
    /// Per-case timeout budgets (`--timeout-ms` overrides `navigation_ms`).
    pub timeout: TimeoutBudget,
    /// Recycle a worker's page after this many cases, per §4.8 isolation
    /// item (d), regardless of outcome.
    pub page_recycle_every: u32,
    /// Explicit path to a Chrome/Chromium executable, or `None` to let
    /// `chromiumoxide` discover one on `PATH`.
    pub chrome_executable: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl RunConfig {
    /// Explicit constructor for CLI-flag construction; `workers` is clamped
    /// to at least 1 the way `ValorConfig::new` clamps `frame_budget_ms`.
    #[must_use]
    pub fn new(workers: usize, timeout: TimeoutBudget, page_recycle_every: u32) -> Self {
        Self {
            workers: workers.max(1),
            timeout,
            page_recycle_every: page_recycle_every.max(1),
            chrome_executable: env::var("CHROME_BIN").ok(),
            viewport_width: 1024,
            viewport_height: 768,
        }
    }

    /// Loads configuration from the environment:
    /// - `XSSBENCH_WORKERS` (default: 4)
    /// - `XSSBENCH_NAV_TIMEOUT_MS` (default: 800)
    /// - `XSSBENCH_PROBE_TIMEOUT_MS` (default: 300)
    /// - `XSSBENCH_PAGE_RECYCLE_EVERY` (default: 50)
    /// - `CHROME_BIN` (no default; `chromiumoxide` discovers a browser if
    ///   unset, matching the teacher's `find_chrome_executable` fallback)
    #[must_use]
    pub fn from_env() -> Self {
        let workers = env::var("XSSBENCH_WORKERS").ok().and_then(|val| val.parse().ok()).unwrap_or(4).max(1);
        let navigation_ms =
            env::var("XSSBENCH_NAV_TIMEOUT_MS").ok().and_then(|val| val.parse().ok()).unwrap_or(800);
        let probe_ms =
            env::var("XSSBENCH_PROBE_TIMEOUT_MS").ok().and_then(|val| val.parse().ok()).unwrap_or(300);
        let page_recycle_every =
            env::var("XSSBENCH_PAGE_RECYCLE_EVERY").ok().and_then(|val| val.parse().ok()).unwrap_or(50).max(1);
        Self {
            workers,
            timeout: TimeoutBudget { navigation_ms, probe_ms },
            page_recycle_every,
            chrome_executable: env::var("CHROME_BIN").ok(),
            viewport_width: 1024,
            viewport_height: 768,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(4, TimeoutBudget::default(), 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_are_clamped_to_at_least_one() {
        let config = RunConfig::new(0, TimeoutBudget::default(), 10);
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn default_matches_documented_fallbacks() {
        let config = RunConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.timeout.navigation_ms, 800);
        assert_eq!(config.page_recycle_every, 50);
    }
}

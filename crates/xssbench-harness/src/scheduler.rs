//! Scheduler (C9): worker pool over `(vector, context, sanitizer)` cases,
//! one browser per engine, one long-lived `PageController` per worker.
//! Grounded on the teacher's fixture-sweep shape in
//! `crates/valor/tests/chromium_compare/fixture_runner.rs` (`process_fixture`
//! over a shared `Browser`, one page per unit of work, always closed) and
//! generalized from "one page per fixture" to "one page reused across many
//! cases, recycled on a schedule" per §4.8/§5.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use xssbench_adapters::SanitizerAdapter;
use xssbench_core::outcome::AdapterStatus;
use xssbench_core::{CaseInput, CaseResult, Policy, Signals, Vector};

use crate::artifact::RunArtifact;
use crate::classifier;
use crate::config::RunConfig;
use crate::engine::{self, EngineKind};
use crate::page_controller::{PageController, TimeoutBudget};

/// Expands every vector into one `CaseInput` per `(context, sanitizer)`
/// pair, for every sanitizer id supplied. Shared by the real scheduler and
/// the `--dry-run` CLI path, which only needs the matrix, never a browser.
#[must_use]
pub fn expand_case_matrix(vectors: &[Vector], sanitizer_ids: &[String]) -> Vec<CaseInput> {
    vectors.iter().flat_map(|vector| vector.expand_cases(sanitizer_ids)).collect()
}

/// A single timestamp string, RFC 3339-ish but dependency-free: the
/// scheduler has no runtime clock crate in its dependency graph, so callers
/// supply timestamps (matching the same constraint that keeps `Date.now()`
/// out of deterministic test fixtures).
pub type Timestamp = String;

struct SharedState {
    queue: Mutex<VecDeque<CaseInput>>,
    results: Mutex<Vec<CaseResult>>,
    retried: Mutex<HashSet<CaseInput>>,
    vectors_by_id: HashMap<String, Vector>,
    sanitizers: HashMap<String, Arc<dyn SanitizerAdapter>>,
    policy: Policy,
}

impl SharedState {
    fn pop_case(&self) -> Option<CaseInput> {
        self.queue.lock().map(|mut queue| queue.pop_front()).unwrap_or(None)
    }

    fn requeue_once(&self, case: CaseInput) -> bool {
        let already_retried = {
            let mut retried = self.retried.lock().unwrap_or_else(|poison| poison.into_inner());
            !retried.insert(case.clone())
        };
        if already_retried {
            return false;
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(case);
        }
        true
    }

    fn record(&self, result: CaseResult) {
        if let Ok(mut results) = self.results.lock() {
            results.push(result);
        }
    }
}

/// Runs the full case matrix for one engine and returns the aggregated
/// run artifact. `started_at`/`finished_at` are supplied by the caller
/// (the harness has no wall-clock dependency of its own; see `Timestamp`).
///
/// # Errors
///
/// Returns an error if the engine cannot be launched at all (unsupported
/// engine, missing binary). Per-case failures never propagate here — they
/// become `error` outcomes in the artifact, per §7's recovery policy.
pub async fn run_engine(
    engine_kind: EngineKind,
    vectors: &[Vector],
    sanitizers: Vec<Arc<dyn SanitizerAdapter>>,
    policy: Policy,
    config: &RunConfig,
    started_at: Timestamp,
    finished_at_fn: impl FnOnce() -> Timestamp,
) -> anyhow::Result<RunArtifact> {
    let sanitizer_ids: Vec<String> = sanitizers.iter().map(|adapter| adapter.id().to_string()).collect();
    let cases = expand_case_matrix(vectors, &sanitizer_ids);

    let launched = engine::launch(
        engine_kind,
        config.chrome_executable.as_deref(),
        config.viewport_width,
        config.viewport_height,
    )
    .await?;

    let vectors_by_id = vectors.iter().map(|vector| (vector.id.clone(), vector.clone())).collect();
    let sanitizers_by_id =
        sanitizers.into_iter().map(|adapter| (adapter.id().to_string(), adapter)).collect();

    let shared = Arc::new(SharedState {
        queue: Mutex::new(cases.into_iter().collect()),
        results: Mutex::new(Vec::new()),
        retried: Mutex::new(HashSet::new()),
        vectors_by_id,
        sanitizers: sanitizers_by_id,
        policy,
    });

    let browser = launched.browser.clone();
    let mut workers = Vec::with_capacity(config.workers);
    for _ in 0..config.workers {
        let shared = Arc::clone(&shared);
        let browser = browser.clone();
        let timeout = config.timeout;
        let recycle_every = config.page_recycle_every;
        workers.push(tokio::spawn(async move {
            worker_loop(shared, browser, timeout, recycle_every).await;
        }));
    }
    for worker in workers {
        drop(worker.await);
    }

    let results = Arc::try_unwrap(shared)
        .map(|state| state.results.into_inner().unwrap_or_default())
        .unwrap_or_default();

    Ok(RunArtifact::build(
        engine_kind.as_str().to_string(),
        launched.version,
        started_at,
        finished_at_fn(),
        results,
    ))
}

/// One worker's whole lifetime: owns a `PageController`, pulls cases from
/// the shared queue until it is drained. Per §5: the worker is the unit of
/// cooperative single-threaded logic; the only cross-worker contention is
/// the queue pop and the result push, both held only for the duration of a
/// `Vec`/`VecDeque` operation, never across a browser round-trip.
async fn worker_loop(
    shared: Arc<SharedState>,
    browser: chromiumoxide::browser::Browser,
    base_timeout: TimeoutBudget,
    recycle_every: u32,
) {
    let Ok(mut controller) = PageController::attach(&browser).await else {
        return;
    };
    let mut cases_since_recycle: u32 = 0;
    let mut timeout = base_timeout;
    let mut consecutive_timeouts: u32 = 0;

    while let Some(case) = shared.pop_case() {
        let Some(vector) = shared.vectors_by_id.get(&case.vector_id) else {
            continue;
        };
        let Some(adapter) = shared.sanitizers.get(&case.sanitizer_id) else {
            continue;
        };

        let sanitized = adapter.sanitize(&vector.payload_html, &shared.policy);

        let result = match sanitized.clean_html() {
            Some(clean_html) => {
                let outcome = controller
                    .run_case(case.context, clean_html, &vector.expected_tags, timeout)
                    .await;

                // §7 BrowserContextCrash: the page's context is gone, not
                // merely slow. Recycle and give the case one more try on a
                // fresh page before recording it as `error`.
                if outcome.context_crashed && shared.requeue_once(case.clone()) {
                    let Ok(fresh) = recycle_page(controller, &browser).await else { return };
                    controller = fresh;
                    cases_since_recycle = 0;
                    continue;
                }

                // Adaptive timeout (§9): lengthen after repeated timeouts,
                // reset once a case comes in comfortably under budget.
                if outcome.duration_ms >= timeout.navigation_ms {
                    consecutive_timeouts += 1;
                    if consecutive_timeouts >= 2 {
                        timeout.navigation_ms = (timeout.navigation_ms * 2).min(8_000);
                        timeout.probe_ms = (timeout.probe_ms * 2).min(3_000);
                    }
                } else {
                    consecutive_timeouts = 0;
                    timeout = base_timeout;
                }

                let classified = if outcome.context_crashed {
                    xssbench_core::Outcome::Error
                } else {
                    classifier::classify(&outcome.signals)
                };
                CaseResult {
                    case_input: case.clone(),
                    outcome: classified,
                    lossy: outcome.lossy,
                    signals: outcome.signals,
                    duration_ms: outcome.duration_ms,
                }
            }
            None => {
                let adapter_status = match &sanitized {
                    xssbench_adapters::SanitizedOutput::UnsupportedConfig { .. } => {
                        AdapterStatus::UnsupportedConfig
                    }
                    xssbench_adapters::SanitizedOutput::AdapterError { .. } => AdapterStatus::AdapterError,
                    xssbench_adapters::SanitizedOutput::Ok { .. } => AdapterStatus::Ok,
                };
                let signals = Signals { adapter_status, ..Signals::default() };
                CaseResult {
                    case_input: case.clone(),
                    outcome: classifier::classify(&signals),
                    lossy: None,
                    signals,
                    duration_ms: 0,
                }
            }
        };

        cases_since_recycle += 1;
        let must_recycle = result.outcome == xssbench_core::Outcome::Error
            || cases_since_recycle >= recycle_every;

        shared.record(result);

        if must_recycle {
            cases_since_recycle = 0;
            if let Ok(fresh) = recycle_page(controller, &browser).await {
                controller = fresh;
            } else {
                return;
            }
        }
    }
}

/// §4.8 isolation item (d): close and reopen the worker's page every K
/// cases or after any `error` outcome, so no hidden carry-over survives
/// even if every other isolation mechanism somehow failed.
async fn recycle_page(
    controller: PageController,
    browser: &chromiumoxide::browser::Browser,
) -> anyhow::Result<PageController> {
    drop(controller.close().await);
    Ok(PageController::attach(browser).await?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "test assertions, not library code")]

    use super::*;
    use xssbench_core::vector::ContextSet;
    use xssbench_core::{PayloadContext, TagSpec};

    fn vector(id: &str, contexts: ContextSet) -> Vector {
        Vector {
            id: id.into(),
            description: String::new(),
            payload_html: "<p>hi</p>".into(),
            payload_context: contexts,
            expected_tags: vec![TagSpec::parse("p").expect("valid")],
            sanitizer_allow_tags: None,
        }
    }

    #[test]
    fn case_matrix_has_one_entry_per_context_per_sanitizer() {
        let vectors = vec![
            vector("v1", ContextSet::One(PayloadContext::Html)),
            vector("v2", ContextSet::Many(vec![PayloadContext::Html, PayloadContext::HtmlOuter])),
        ];
        let sanitizer_ids = vec!["noop".to_string(), "strict-stub".to_string()];
        let matrix = expand_case_matrix(&vectors, &sanitizer_ids);
        // v1: 1 context * 2 sanitizers = 2; v2: 2 contexts * 2 sanitizers = 4
        assert_eq!(matrix.len(), 6);
    }
}

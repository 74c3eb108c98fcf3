//! Page Controller (C6): owns one page in one browser context and runs it
//! through the per-case lifecycle of §4.4 — compose, install guard,
//! navigate, probe, collect, check fidelity, classify. Grounded on the
//! teacher's `setup_page_for_fixture`/`navigate_and_prepare_page`
//! (`crates/valor/tests/chromium_compare/{common,browser}.rs`): create a
//! page once, drive it through many fixtures, never tearing it down between
//! them except on the recycle schedule the caller (the scheduler) owns.

use std::time::{Duration, Instant};

use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use serde::Deserialize;
use serde_json::Value;

use xssbench_core::outcome::{AdapterStatus, DangerousUrlHit};
use xssbench_core::template::{self, PayloadContext};
use xssbench_core::{Signals, TagSpec};

use crate::document;
use crate::network_guard::NetworkGuard;

const PROBE_DANGEROUS_URL_JS: &str = include_str!("js/probe_dangerous_url.js");
const PROBE_EVENTS_JS: &str = include_str!("js/probe_events.js");
const PROBE_FORMS_JS: &str = include_str!("js/probe_forms.js");
const PRELUDE_JS: &str = include_str!("js/prelude.js");

/// Per-case wall-clock budgets (§4.4 step 4-5, §9 "adaptive timeout").
/// Adaptivity is implemented as a simple doubling: the scheduler lengthens
/// `navigation_ms` for a worker after repeated timeouts within the same
/// vector family and resets it between families (see `scheduler.rs`).
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBudget {
    pub navigation_ms: u64,
    pub probe_ms: u64,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self { navigation_ms: 800, probe_ms: 300 }
    }
}

/// What one page run produced, before the case's `(vector, context,
/// sanitizer)` identity is known to this module (the caller attaches it).
#[derive(Debug, Clone)]
pub struct PageRunOutcome {
    pub signals: Signals,
    pub lossy: Option<bool>,
    pub duration_ms: u64,
    /// Set when navigation itself returned a CDP error rather than timing
    /// out or succeeding — the page's browser context is presumed crashed
    /// (§7 `BrowserContextCrash`). The scheduler recycles the page and
    /// re-enqueues the case once before giving up and recording `error`.
    pub context_crashed: bool,
}

#[derive(Debug, Deserialize)]
struct RawDangerousHit {
    tag: String,
    attr: String,
    raw_value: String,
}

#[derive(Debug, Deserialize, Default)]
struct MarkerState {
    executed: bool,
    details: Option<String>,
}

pub struct PageController {
    page: Page,
}

impl PageController {
    /// Opens a new page on `browser` and installs the prelude as a
    /// context-level init script so every frame — including `srcdoc`
    /// subdocuments and nested `iframe`s — receives it before any page
    /// script runs (§4.1, §9 "cross-frame instrumentation"). Installed once
    /// per page lifetime; it survives navigations because CDP's
    /// `addScriptToEvaluateOnNewDocument` re-applies on every new document.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be created or the init script
    /// cannot be installed.
    pub async fn attach(browser: &Browser) -> Result<Self, chromiumoxide::error::CdpError> {
        let page = browser.new_page("about:blank").await?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(PRELUDE_JS)).await?;
        Ok(Self { page })
    }

    /// Closes the underlying page. Called by the scheduler's recycle policy
    /// (every K cases, or unconditionally after an `error` outcome) to
    /// guarantee no hidden state survives into the next case (§4.8).
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be closed.
    pub async fn close(self) -> Result<(), chromiumoxide::error::CdpError> {
        self.page.close().await
    }

    /// Runs one case to completion: reset, compose, guard, navigate, probe,
    /// collect, fidelity-check. `sanitized_html` is already known-`Ok`
    /// output from the adapter — the caller short-circuits `skip`/`error`
    /// adapter outcomes before ever reaching the browser (§4.3).
    pub async fn run_case(
        &mut self,
        context: PayloadContext,
        sanitized_html: &str,
        expected_tags: &[TagSpec],
        budget: TimeoutBudget,
    ) -> PageRunOutcome {
        let start = Instant::now();
        self.reset().await;

        let injection = template::resolve(context, sanitized_html);
        let document_html = document::compose(&injection);
        let data_url = document::to_data_url(&document_html);

        let guard = NetworkGuard::install(&self.page, data_url.clone()).await.ok();

        let navigated = tokio::time::timeout(
            Duration::from_millis(budget.navigation_ms),
            self.page.goto(&data_url),
        )
        .await;
        let timed_out_on_navigation = navigated.is_err();
        let context_crashed = matches!(navigated, Ok(Err(_)));

        let mut dangerous_hits = self.run_dangerous_url_probe(budget).await;
        self.run_events_probe(budget).await;
        self.run_forms_probe(budget).await;
        let more_hits = self.run_dangerous_url_probe(budget).await;
        for hit in more_hits {
            if dangerous_hits.len() >= 5 {
                break;
            }
            if !dangerous_hits.contains(&hit) {
                dangerous_hits.push(hit);
            }
        }
        dangerous_hits.truncate(5);

        let marker = self.read_marker().await;
        let navigation_occurred = self.page.url().await.ok().flatten().is_some_and(|url| url != data_url);

        let attempts = match guard {
            Some(guard) => guard.detach(&self.page).await,
            None => crate::network_guard::NetworkAttempts::default(),
        };

        let lossy = if context.is_fragment_context() {
            Some(self.compute_lossy(injection.slot, expected_tags).await)
        } else {
            None
        };

        let signals = Signals {
            dialog_fired: marker.executed,
            dialog_details: marker.details,
            external_script_attempted: attempts.any_script_attempt(),
            external_script_url: attempts.first_script_url(),
            non_script_external_attempt: attempts.any_non_script_attempt(),
            non_script_url: attempts.first_non_script_url(),
            dangerous_url_hits: dangerous_hits,
            navigation_occurred: navigation_occurred && !timed_out_on_navigation,
            adapter_status: AdapterStatus::Ok,
        };

        PageRunOutcome {
            signals,
            lossy,
            duration_ms: start.elapsed().as_millis() as u64,
            context_crashed,
        }
    }

    /// §4.4 step 1: purge any pending timers left by the previous case so
    /// payloads cannot defer work into the next one. Best-effort — if the
    /// marker object does not exist yet (first case on a fresh page) there
    /// is nothing to clean up.
    async fn reset(&self) {
        drop(
            self.page
                .evaluate("if (window.__xssbench) { window.__xssbench.cleanup(); }")
                .await,
        );
    }

    async fn run_dangerous_url_probe(&self, budget: TimeoutBudget) -> Vec<DangerousUrlHit> {
        let script = format!("{PROBE_DANGEROUS_URL_JS}\nwindow.__xssbenchProbeDangerousUrl();");
        let result = tokio::time::timeout(Duration::from_millis(budget.probe_ms), self.page.evaluate(script)).await;
        let Ok(Ok(evaluation)) = result else {
            return Vec::new();
        };
        let Some(value) = evaluation.value() else {
            return Vec::new();
        };
        parse_hits(value)
    }

    async fn run_events_probe(&self, budget: TimeoutBudget) {
        let script = format!("{PROBE_EVENTS_JS}\nwindow.__xssbenchProbeEvents();");
        drop(tokio::time::timeout(Duration::from_millis(budget.probe_ms), self.page.evaluate(script)).await);
    }

    async fn run_forms_probe(&self, budget: TimeoutBudget) {
        let script = format!("{PROBE_FORMS_JS}\nwindow.__xssbenchProbeForms();");
        drop(tokio::time::timeout(Duration::from_millis(budget.probe_ms), self.page.evaluate(script)).await);
    }

    async fn read_marker(&self) -> MarkerState {
        let script = "window.__xssbench ? { executed: window.__xssbench.executed, details: window.__xssbench.details } : { executed: false, details: null }";
        let Ok(evaluation) = self.page.evaluate(script).await else {
            return MarkerState::default();
        };
        evaluation
            .into_value::<MarkerState>()
            .unwrap_or_default()
    }

    /// §4.4 step 7: reads the serialized DOM of `slot`'s injection site and
    /// hands it to the fidelity checker. Only called for fragment contexts,
    /// each of which lands in a different slot (`Html`/`OnerrorAttr` in
    /// `#root`, `HtmlHead`/`HtmlOuter` in their own comment-bracketed
    /// spans — see `document::injection_site_script`). A page that cannot
    /// even report its own markup back is treated as lossy — there is no
    /// weaker-but-still-meaningful verdict to fall back to.
    async fn compute_lossy(&self, slot: template::Slot, expected_tags: &[TagSpec]) -> bool {
        let script = document::injection_site_script(slot);
        let Ok(evaluation) = self.page.evaluate(script).await else {
            return true;
        };
        let html = evaluation.value().and_then(Value::as_str).unwrap_or_default();
        xssbench_fidelity::is_lossy(html, expected_tags)
    }
}

fn parse_hits(value: &Value) -> Vec<DangerousUrlHit> {
    let Ok(raw_hits) = serde_json::from_value::<Vec<RawDangerousHit>>(value.clone()) else {
        return Vec::new();
    };
    raw_hits
        .into_iter()
        .map(|hit| DangerousUrlHit { tag: hit.tag, attr: hit.attr, raw_value: hit.raw_value })
        .collect()
}

//! Network Guard (C7): intercepts every request the page initiates and
//! aborts everything except the single same-origin document load this case
//! is actually testing (§4.6). Grounded on the teacher's CDP usage in
//! `crates/valor/tests/chromium_compare/chrome.rs` (raw `chromiumoxide`
//! protocol calls rather than a higher-level wrapper), adapted from a
//! screenshot-capture use of the protocol to a request-interception one.

use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, DisableParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::page::Page;
use futures::StreamExt as _;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// One aborted request, recorded the way §4.6 requires: the URL, which
/// resource-type bucket it falls in, and whether a script initiated it.
///
/// `initiator_is_script` is approximated from `resource_type` alone:
/// `Fetch.requestPaused` does not carry the `Network.requestWillBeSent`
/// initiator chain, and listening on a second CDP domain per case just to
/// recover it was judged not worth the added round-trip — see the Open
/// Question note in `DESIGN.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedRequest {
    pub url: String,
    pub resource_type: String,
    pub initiator_is_script: bool,
}

/// Everything the Network Guard observed during one case.
#[derive(Debug, Clone, Default)]
pub struct NetworkAttempts {
    pub blocked: Vec<BlockedRequest>,
}

impl NetworkAttempts {
    #[must_use]
    pub fn any_script_attempt(&self) -> bool {
        self.blocked.iter().any(|req| req.resource_type == "script")
    }

    #[must_use]
    pub fn any_non_script_attempt(&self) -> bool {
        self.blocked.iter().any(|req| req.resource_type != "script")
    }

    #[must_use]
    pub fn first_script_url(&self) -> Option<String> {
        self.blocked
            .iter()
            .find(|req| req.resource_type == "script")
            .map(|req| req.url.clone())
    }

    #[must_use]
    pub fn first_non_script_url(&self) -> Option<String> {
        self.blocked
            .iter()
            .find(|req| req.resource_type != "script")
            .map(|req| req.url.clone())
    }
}

/// A live guard attached to one page for the duration of one case. Dropping
/// or calling [`NetworkGuard::detach`] stops the background interception
/// task so the next case can install a fresh one (§4.8 isolation item c).
pub struct NetworkGuard {
    records: Arc<Mutex<Vec<BlockedRequest>>>,
    listener_task: JoinHandle<()>,
}

impl NetworkGuard {
    /// Enables `Fetch` interception on `page` and installs the guard policy:
    /// the exact `permitted_url` (the data: URL this case navigated to) is
    /// allowed through; every other request is aborted and recorded.
    ///
    /// Must be called before navigation so early resources in the initial
    /// HTML (e.g. a `<script src>` present verbatim in unsanitized output)
    /// are caught (§4.6 last bullet).
    ///
    /// # Errors
    ///
    /// Returns an error if the `Fetch` domain cannot be enabled or the event
    /// stream cannot be subscribed.
    pub async fn install(page: &Page, permitted_url: String) -> Result<Self, chromiumoxide::error::CdpError> {
        page.execute(EnableParams::default()).await?;

        let mut events = page.event_listener::<EventRequestPaused>().await?;
        let records: Arc<Mutex<Vec<BlockedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let records_for_task = Arc::clone(&records);
        let page_for_task = page.clone();

        let listener_task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let request_id = event.request_id.clone();
                let url = event.request.url.clone();
                let resource_type = event.resource_type;

                if url == permitted_url && matches!(resource_type, ResourceType::Document) {
                    let continue_params = ContinueRequestParams::new(request_id);
                    drop(page_for_task.execute(continue_params).await);
                    continue;
                }

                let resource_label = resource_type_label(resource_type);
                if let Ok(mut guard) = records_for_task.lock() {
                    guard.push(BlockedRequest {
                        url,
                        resource_type: resource_label.to_string(),
                        initiator_is_script: resource_label == "script",
                    });
                }

                let fail_params = FailRequestParams::new(request_id, ErrorReason::Aborted);
                drop(page_for_task.execute(fail_params).await);
            }
        });

        Ok(Self { records, listener_task })
    }

    /// Stops the background listener and disables `Fetch` interception so
    /// the next case starts from a clean slate.
    pub async fn detach(self, page: &Page) -> NetworkAttempts {
        self.listener_task.abort();
        drop(page.execute(DisableParams::default()).await);
        let blocked = self.records.lock().map(|guard| guard.clone()).unwrap_or_default();
        NetworkAttempts { blocked }
    }
}

/// Maps the CDP resource-type enum to the lowercase labels §4.6 groups by.
/// Everything that is not `script` or `document` contributes to
/// `non_script_external_attempt`; the open question of exactly which of
/// those labels matter (prefetch vs beacon, etc.) is resolved by treating
/// all of them uniformly, per the policy note in `DESIGN.md`.
fn resource_type_label(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Document => "document",
        ResourceType::Stylesheet => "stylesheet",
        ResourceType::Image => "image",
        ResourceType::Media => "media",
        ResourceType::Font => "font",
        ResourceType::Script => "script",
        ResourceType::TextTrack => "texttrack",
        ResourceType::Xhr => "xhr",
        ResourceType::Fetch => "fetch",
        ResourceType::EventSource => "eventsource",
        ResourceType::WebSocket => "websocket",
        ResourceType::Manifest => "manifest",
        ResourceType::SignedExchange => "signedexchange",
        ResourceType::Ping => "ping",
        ResourceType::CspViolationReport => "cspviolationreport",
        ResourceType::Preflight => "preflight",
        ResourceType::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked(url: &str, resource_type: &str) -> BlockedRequest {
        BlockedRequest {
            url: url.to_string(),
            resource_type: resource_type.to_string(),
            initiator_is_script: resource_type == "script",
        }
    }

    #[test]
    fn script_attempts_are_distinguished_from_non_script() {
        let attempts = NetworkAttempts {
            blocked: vec![blocked("https://evil/a.js", "script"), blocked("https://evil/x.png", "image")],
        };
        assert!(attempts.any_script_attempt());
        assert!(attempts.any_non_script_attempt());
        assert_eq!(attempts.first_script_url().as_deref(), Some("https://evil/a.js"));
    }

    #[test]
    fn no_blocked_requests_means_no_attempts() {
        let attempts = NetworkAttempts::default();
        assert!(!attempts.any_script_attempt());
        assert!(!attempts.any_non_script_attempt());
    }
}

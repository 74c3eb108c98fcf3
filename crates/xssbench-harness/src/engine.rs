//! Browser engine selection and launch. Grounded on the teacher's
//! `find_chrome_executable`/`BrowserConfig::builder()` pair in
//! `crates/valor/tests/chromium_compare/chrome.rs`: locate a real browser
//! binary (or trust `CHROME_BIN`), launch it headless, and keep the
//! handler task alive for the life of the run.

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt as _;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// The engines §6 names. `chromiumoxide` only speaks the Chrome DevTools
/// Protocol, so only `Chromium` is actually launchable by this crate;
/// `Firefox`/`Webkit` are represented so `--browser` can name them and the
/// CLI can report "not available in this environment" instead of silently
/// ignoring the flag, but they carry no driver here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Chromium,
    Firefox,
    Webkit,
}

impl EngineKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }

    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Chromium)
    }
}

/// A launched browser plus the background task forwarding its CDP event
/// stream, matching `BrowserWithHandler` in the teacher's test harness.
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub version: String,
    _handler_task: JoinHandle<()>,
}

/// Launches a headless Chromium instance.
///
/// # Errors
///
/// Returns an error if `engine` is not `Chromium`, the browser binary
/// cannot be found/launched, or the initial version handshake fails.
pub async fn launch(
    engine: EngineKind,
    chrome_executable: Option<&str>,
    viewport_width: u32,
    viewport_height: u32,
) -> anyhow::Result<LaunchedBrowser> {
    if !engine.is_supported() {
        anyhow::bail!(
            "engine {:?} is not available: this harness drives Chromium over CDP only",
            engine.as_str()
        );
    }

    let mut builder = BrowserConfig::builder().window_size(viewport_width, viewport_height);
    if let Some(executable) = chrome_executable {
        builder = builder.chrome_executable(executable);
    }
    let config = builder
        .build()
        .map_err(|err| anyhow::anyhow!("failed to build browser config: {err}"))?;

    let (browser, mut handler) = Browser::launch(config).await?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                log::debug!("browser handler error: {err}");
            }
        }
    });

    let version = browser
        .version()
        .await
        .map(|info| info.product)
        .unwrap_or_else(|_| "unknown".to_string());

    Ok(LaunchedBrowser { browser, version, _handler_task: handler_task })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_chromium_is_supported() {
        assert!(EngineKind::Chromium.is_supported());
        assert!(!EngineKind::Firefox.is_supported());
        assert!(!EngineKind::Webkit.is_supported());
    }
}

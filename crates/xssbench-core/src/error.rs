//! Typed error taxonomy. The original harness this crate's lineage descends
//! from (`valor`) propagates everything through `anyhow::Error`; that is
//! still the right choice at the binary boundary, but the scheduler (C9)
//! and classifier (C8) need to branch on error *kind* — a `SkipConfig`
//! failure and a hard adapter crash must become different outcomes, not two
//! strings that happen to differ. `HarnessError` is that typed seam.

use thiserror::Error;

/// Every way the harness can fail, mapped 1:1 to the error taxonomy table.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Raised while loading a vector file: malformed JSON, wrong `schema`
    /// tag, or a vector that violates the `expected_tags` context invariant.
    #[error("vector schema error: {0}")]
    VectorSchemaError(String),

    /// The adapter cannot represent the requested policy for this vector
    /// (e.g. the underlying library panics on the combination). Maps to
    /// case outcome `skip`, never aborts the run.
    #[error("sanitizer does not support this configuration: {0}")]
    SanitizerConfigUnsupported(String),

    /// Unexpected adapter failure. Maps to case outcome `error`.
    #[error("sanitizer adapter failed: {0}")]
    SanitizerAdapterError(String),

    /// Navigation or a probe did not complete inside the per-case budget.
    /// Not fatal: the caller classifies from whatever signals were
    /// collected before the deadline.
    #[error("page operation timed out after {budget_ms}ms")]
    PageTimeout {
        /// The budget that was exceeded, for diagnostics.
        budget_ms: u64,
    },

    /// The browser context backing a worker died mid-case. The scheduler
    /// recycles the context and re-enqueues the case once; a second crash
    /// on the same case is recorded as case outcome `error`.
    #[error("browser context crashed: {0}")]
    BrowserContextCrash(String),

    /// A harness-level invariant was violated (e.g. `expected_tags` set on
    /// a `js*` context, or an attribute name outside the shared allowlist).
    /// Always fatal at load time, before any case runs.
    #[error("harness invariant violated: {0}")]
    InvariantViolation(String),
}

impl HarnessError {
    /// Whether this error is fatal to the whole run (abort before any case
    /// executes) as opposed to scoped to a single case.
    #[must_use]
    pub const fn is_fatal_at_load(&self) -> bool {
        matches!(
            self,
            Self::VectorSchemaError(_) | Self::InvariantViolation(_)
        )
    }
}

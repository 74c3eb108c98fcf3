//! The distinguished noop adapter (§4.3): returns input unchanged. Its role
//! is to validate the harness itself — it must produce many `xss`/
//! `external` outcomes across the corpus and stay non-lossy for every
//! vector whose contract permits it. Weakening it to reduce its outcome
//! count would be a contract violation, not an improvement.

use xssbench_core::Policy;

use crate::{SanitizedOutput, SanitizerAdapter};

/// Identity sanitizer. Baseline for harness correctness (§8 invariant 4:
/// `noop`'s `lossy` flag is the ground truth the fidelity checker is
/// judged against).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAdapter;

impl SanitizerAdapter for NoopAdapter {
    fn id(&self) -> &str {
        "noop"
    }

    fn sanitize(&self, html: &str, _policy: &Policy) -> SanitizedOutput {
        SanitizedOutput::ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_returns_input_unchanged() {
        let adapter = NoopAdapter;
        let policy = Policy::permissive_default();
        let output = adapter.sanitize("<script>alert(1)</script>", &policy);
        assert_eq!(output.clean_html(), Some("<script>alert(1)</script>"));
    }
}

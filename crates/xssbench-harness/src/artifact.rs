//! Run artifact (§6): the serializable report the scheduler (C9) produces.
//! JSON shape fixed by the spec: `{engine, engine_version, started_at,
//! finished_at, totals_by_sanitizer, cases}`, extended per `SPEC_FULL.md`
//! with `harness_version` since §8 invariant 1 names harness version as
//! part of a case outcome's identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use xssbench_core::{CaseResult, Outcome};

/// Per-`(sanitizer, engine)` tally of outcome counts plus a lossy count,
/// per §4.8 "Aggregation".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub pass: u64,
    pub skip: u64,
    pub external: u64,
    pub xss: u64,
    pub error: u64,
    pub lossy: u64,
}

impl OutcomeTally {
    fn record(&mut self, outcome: Outcome, lossy: Option<bool>) {
        match outcome {
            Outcome::Pass => self.pass += 1,
            Outcome::Skip => self.skip += 1,
            Outcome::External => self.external += 1,
            Outcome::Xss => self.xss += 1,
            Outcome::Error => self.error += 1,
        }
        if lossy == Some(true) {
            self.lossy += 1;
        }
    }
}

/// The full JSON run report (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifact {
    pub engine: String,
    pub engine_version: String,
    pub harness_version: String,
    pub started_at: String,
    pub finished_at: String,
    pub totals_by_sanitizer: BTreeMap<String, OutcomeTally>,
    pub cases: Vec<CaseResult>,
}

impl RunArtifact {
    /// Builds the artifact from a finished case list, aggregating per
    /// sanitizer id (§4.8).
    #[must_use]
    pub fn build(
        engine: String,
        engine_version: String,
        started_at: String,
        finished_at: String,
        cases: Vec<CaseResult>,
    ) -> Self {
        let mut totals_by_sanitizer: BTreeMap<String, OutcomeTally> = BTreeMap::new();
        for case in &cases {
            totals_by_sanitizer
                .entry(case.case_input.sanitizer_id.clone())
                .or_default()
                .record(case.outcome, case.lossy);
        }
        Self {
            engine,
            engine_version,
            harness_version: env!("CARGO_PKG_VERSION").to_string(),
            started_at,
            finished_at,
            totals_by_sanitizer,
            cases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xssbench_core::outcome::AdapterStatus;
    use xssbench_core::vector::{CaseInput, PayloadContext};
    use xssbench_core::Signals;

    fn result(sanitizer_id: &str, outcome: Outcome, lossy: Option<bool>) -> CaseResult {
        CaseResult {
            case_input: CaseInput {
                vector_id: "v1".into(),
                context: PayloadContext::Html,
                sanitizer_id: sanitizer_id.into(),
            },
            outcome,
            lossy,
            signals: Signals { adapter_status: AdapterStatus::Ok, ..Signals::default() },
            duration_ms: 10,
        }
    }

    #[test]
    fn totals_aggregate_per_sanitizer() {
        let cases = vec![
            result("noop", Outcome::Xss, Some(true)),
            result("noop", Outcome::Pass, Some(false)),
            result("strict-stub", Outcome::Pass, Some(false)),
        ];
        let artifact = RunArtifact::build(
            "chromium".into(),
            "1.0".into(),
            "t0".into(),
            "t1".into(),
            cases,
        );
        let noop = &artifact.totals_by_sanitizer["noop"];
        assert_eq!(noop.xss, 1);
        assert_eq!(noop.pass, 1);
        assert_eq!(noop.lossy, 1);
        let strict = &artifact.totals_by_sanitizer["strict-stub"];
        assert_eq!(strict.pass, 1);
    }
}

//! The result side of the data model (§3): signals collected during a page
//! run, the ranked outcome enum, and the case result the scheduler
//! aggregates into a run artifact.

use serde::{Deserialize, Serialize};

use crate::vector::CaseInput;

/// One observed dangerous-URL hit from P1: the element tag, the attribute
/// it was found on, and the raw (pre-normalization) value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerousUrlHit {
    pub tag: String,
    pub attr: String,
    pub raw_value: String,
}

/// The bag of observations collected during one page run (§3). Built up
/// incrementally by the Page Controller, Network Guard, and probes, then
/// handed whole to the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub dialog_fired: bool,
    pub dialog_details: Option<String>,
    pub external_script_attempted: bool,
    pub external_script_url: Option<String>,
    pub non_script_external_attempt: bool,
    pub non_script_url: Option<String>,
    pub dangerous_url_hits: Vec<DangerousUrlHit>,
    pub navigation_occurred: bool,
    pub adapter_status: AdapterStatus,
}

/// Mirrors `SanitizedOutput::adapter_status` (C3) so the classifier can
/// read it directly off the signals bag without threading a second value
/// through the Page Controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    #[default]
    Ok,
    UnsupportedConfig,
    AdapterError,
}

/// The single terminal classification of a case, ranked highest to lowest
/// per §3/§4.7. `Ord` follows that ranking so aggregation code can compare
/// outcomes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Skip,
    External,
    Xss,
    Error,
}

impl Outcome {
    /// All outcomes, from lowest to highest precedence — useful for
    /// building a zeroed tally.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::Pass, Self::Skip, Self::External, Self::Xss, Self::Error]
    }
}

/// The result of running one `CaseInput` to completion: the outcome, the
/// orthogonal `lossy` flag, the signals that produced the outcome, and the
/// wall-clock duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_input: CaseInput,
    pub outcome: Outcome,
    pub lossy: Option<bool>,
    pub signals: Signals,
    pub duration_ms: u64,
}

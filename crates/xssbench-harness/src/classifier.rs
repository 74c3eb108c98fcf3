//! Execution Classifier (C8): fuses a finished `Signals` bag into the single
//! terminal `Outcome`, following the ranked precedence of §4.7. Pure and
//! total — the same signals always classify the same way (§8 invariant 1,
//! "`classify(signals) = classify(signals)`").

use xssbench_core::outcome::AdapterStatus;
use xssbench_core::{Outcome, Signals};

/// Classifies one case's collected signals into an outcome, per the §4.7
/// precedence: adapter failure, then adapter-unsupported, then `xss`, then
/// `external`, then `pass`.
///
/// A plain navigation is never `xss` by itself (§4.7 critical non-rule):
/// `navigation_occurred` never appears in this function's conditions.
/// Navigation only matters through the signals it can *cause* — a dangerous
/// URL hit from P1, or a script fetch the Network Guard recorded.
#[must_use]
pub fn classify(signals: &Signals) -> Outcome {
    if signals.adapter_status == AdapterStatus::AdapterError {
        return Outcome::Error;
    }
    if signals.adapter_status == AdapterStatus::UnsupportedConfig {
        return Outcome::Skip;
    }
    if is_xss(signals) {
        return Outcome::Xss;
    }
    if signals.non_script_external_attempt {
        return Outcome::External;
    }
    Outcome::Pass
}

/// §4.7 step 3 ORs three conditions together. The fourth clause named in the
/// spec ("a dangerous `javascript:` navigation was detected") is not a
/// distinct signal: clicking a `javascript:` URL never produces a real
/// navigation in a modern browser, it runs in place, so P1's re-run after
/// the event synthesizer already reports it as a `dangerous_url_hits` entry.
/// `navigation_occurred` itself never participates here — see the critical
/// non-rule below.
fn is_xss(signals: &Signals) -> bool {
    signals.dialog_fired || !signals.dangerous_url_hits.is_empty() || signals.external_script_attempted
}

#[cfg(test)]
mod tests {
    use super::*;
    use xssbench_core::outcome::DangerousUrlHit;

    fn benign() -> Signals {
        Signals::default()
    }

    #[test]
    fn adapter_error_outranks_everything() {
        let mut signals = benign();
        signals.adapter_status = AdapterStatus::AdapterError;
        signals.dialog_fired = true;
        assert_eq!(classify(&signals), Outcome::Error);
    }

    #[test]
    fn unsupported_config_yields_skip() {
        let mut signals = benign();
        signals.adapter_status = AdapterStatus::UnsupportedConfig;
        assert_eq!(classify(&signals), Outcome::Skip);
    }

    #[test]
    fn dialog_fired_yields_xss() {
        let mut signals = benign();
        signals.dialog_fired = true;
        assert_eq!(classify(&signals), Outcome::Xss);
    }

    #[test]
    fn dangerous_url_hit_yields_xss() {
        let mut signals = benign();
        signals.dangerous_url_hits.push(DangerousUrlHit {
            tag: "a".into(),
            attr: "href".into(),
            raw_value: "javascript:alert(1)".into(),
        });
        assert_eq!(classify(&signals), Outcome::Xss);
    }

    #[test]
    fn script_attempt_yields_xss() {
        let mut signals = benign();
        signals.external_script_attempted = true;
        assert_eq!(classify(&signals), Outcome::Xss);
    }

    #[test]
    fn plain_navigation_alone_is_not_xss() {
        let mut signals = benign();
        signals.navigation_occurred = true;
        assert_eq!(classify(&signals), Outcome::Pass);
    }

    #[test]
    fn non_script_external_attempt_without_xss_signals_yields_external() {
        let mut signals = benign();
        signals.non_script_external_attempt = true;
        assert_eq!(classify(&signals), Outcome::External);
    }

    #[test]
    fn xss_signal_outranks_external() {
        let mut signals = benign();
        signals.non_script_external_attempt = true;
        signals.dialog_fired = true;
        assert_eq!(classify(&signals), Outcome::Xss);
    }

    #[test]
    fn no_signals_is_pass() {
        assert_eq!(classify(&benign()), Outcome::Pass);
    }
}

use serde_json::Value;

use super::super::domain::EstimationRule;

/// Parse a catalog-authored estimation payload. Like rule definitions, the
/// catalog stores these as a JSON object or a JSON-encoded string, and a
/// malformed entry degrades to "no estimation".
pub(crate) fn parse_estimation(raw: Option<&Value>) -> Option<EstimationRule> {
    let raw = raw?;
    match raw {
        Value::String(text) => serde_json::from_str(text).ok(),
        other => serde_json::from_value(other.clone()).ok(),
    }
}

/// Compute the estimated amount window for a verdict.
///
/// An ineligible verdict or an absent rule yields `(None, None)`
/// unconditionally. The formula variant returns its base amount for both
/// bounds: the bonus/cap/floor/income-modifier fields are declared in the
/// schema but deliberately not applied here.
pub(crate) fn estimate(
    rule: Option<&EstimationRule>,
    is_eligible: bool,
) -> (Option<f64>, Option<f64>) {
    if !is_eligible {
        return (None, None);
    }

    match rule {
        None => (None, None),
        Some(EstimationRule::Fixed { amount, .. }) => (Some(*amount), Some(*amount)),
        Some(EstimationRule::Range { min, max, .. }) => (Some(*min), Some(*max)),
        Some(EstimationRule::Formula { base_amount, .. }) => {
            (Some(*base_amount), Some(*base_amount))
        }
    }
}

//! Case-specific variation axis sets: fixed, documented domains.

use evalforge_model::{AxisValue, Case};
use serde_json::json;

/// One variation axis: a name plus its enumerated domain of values, in the
/// "default first" order the non-default heuristic relies on.
#[derive(Debug, Clone)]
pub struct Axis {
    pub name: &'static str,
    pub values: Vec<AxisValue>,
}

impl Axis {
    fn strings(name: &'static str, values: &[&'static str]) -> Self {
        Self {
            name,
            values: values.iter().map(|v| json!(v)).collect(),
        }
    }

    fn bools(name: &'static str) -> Self {
        Self {
            name,
            values: vec![json!(false), json!(true)],
        }
    }

    /// Whether `value` is this axis's default ("non-interesting") value:
    /// `{none, neutral, false, no, ru}`.
    #[must_use]
    pub fn is_default_value(value: &AxisValue) -> bool {
        matches!(
            value.as_str(),
            Some("none") | Some("neutral") | Some("no") | Some("ru")
        ) || value.as_bool() == Some(false)
    }
}

/// The full axis set for `case`, in a fixed, deterministic order.
#[must_use]
pub fn axes_for_case(case: Case) -> Vec<Axis> {
    match case {
        Case::SupportBot | Case::DoctorBooking => vec![
            Axis::strings("tone", &["neutral", "negative", "aggressive"]),
            Axis::bools("has_order_id"),
            Axis::bools("requires_account_access"),
            Axis::strings("language", &["ru", "en"]),
            Axis::strings("adversarial", &["none", "profanity", "injection", "garbage"]),
        ],
        Case::OperatorQuality => vec![
            Axis::strings("phrase_length", &["short", "medium", "long"]),
            Axis::strings("punctuation_errors", &["none", "minor", "severe"]),
            Axis::strings("slang_profanity_emoji", &["none", "moderate", "excessive"]),
            Axis::strings("medical_terms", &["none", "present"]),
            Axis::strings("user_aggression", &["neutral", "frustrated", "angry"]),
            Axis::strings("escalation_needed", &["no", "yes"]),
        ],
    }
}

//! Enumerated domains: [`Case`], [`Format`], [`PolicyType`], [`Role`], and
//! the support-bot-only [`Source`] classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level domain classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    SupportBot,
    OperatorQuality,
    DoctorBooking,
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SupportBot => write!(f, "support_bot"),
            Self::OperatorQuality => write!(f, "operator_quality"),
            Self::DoctorBooking => write!(f, "doctor_booking"),
        }
    }
}

impl Case {
    /// Formats that auto-detection always pairs with this case. For
    /// `operator_quality` this is both correction formats, always together.
    #[must_use]
    pub fn default_formats(self) -> Vec<Format> {
        match self {
            Self::SupportBot | Self::DoctorBooking => vec![Format::SingleTurnQa],
            Self::OperatorQuality => vec![
                Format::SingleUtteranceCorrection,
                Format::DialogLastTurnCorrection,
            ],
        }
    }
}

/// Output schema variant of a [`crate::DatasetExample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    SingleTurnQa,
    SingleUtteranceCorrection,
    DialogLastTurnCorrection,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleTurnQa => write!(f, "single_turn_qa"),
            Self::SingleUtteranceCorrection => write!(f, "single_utterance_correction"),
            Self::DialogLastTurnCorrection => write!(f, "dialog_last_turn_correction"),
        }
    }
}

/// Policy classification, in decision-tree precedence order: more specific
/// variants are checked before the catch-all `Must`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Must,
    MustNot,
    Escalate,
    Style,
    Format,
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Must => write!(f, "must"),
            Self::MustNot => write!(f, "must_not"),
            Self::Escalate => write!(f, "escalate"),
            Self::Style => write!(f, "style"),
            Self::Format => write!(f, "format"),
        }
    }
}

/// Speaking role of a [`crate::Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Operator,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Operator => write!(f, "operator"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Support-bot-only provenance sub-classification of a generated example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Tickets,
    FaqParaphrase,
    Corner,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tickets => write!(f, "tickets"),
            Self::FaqParaphrase => write!(f, "faq_paraphrase"),
            Self::Corner => write!(f, "corner"),
        }
    }
}

impl Source {
    #[must_use]
    pub fn all() -> [Self; 3] {
        [Self::Tickets, Self::FaqParaphrase, Self::Corner]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_quality_always_pairs_both_formats() {
        let formats = Case::OperatorQuality.default_formats();
        assert!(formats.contains(&Format::SingleUtteranceCorrection));
        assert!(formats.contains(&Format::DialogLastTurnCorrection));
    }

    #[test]
    fn case_display_matches_json_rename() {
        assert_eq!(Case::SupportBot.to_string(), "support_bot");
        assert_eq!(Format::DialogLastTurnCorrection.to_string(), "dialog_last_turn_correction");
    }
}

//! Validation verdicts attached to candidate items.

use serde::{Deserialize, Serialize};

/// Minimum source support for an item to be considered valid.
pub const MIN_SOURCE_SUPPORT: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// What kind of problem a validation issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Contradiction,
    UnclearAction,
    UnclearDecision,
    TooShort,
    Truncated,
    MissingOwner,
    UnsupportedQuantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

/// A name checked against the transcript's speakers and text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCheck {
    pub name: String,
    pub found_as_speaker: bool,
    pub mentioned_in_text: bool,
    /// Closest speaker name when the name itself was not found
    pub close_match: Option<String>,
}

impl NameCheck {
    pub fn is_found(&self) -> bool {
        self.found_as_speaker || self.mentioned_in_text
    }
}

/// Dates and numbers an item mentions, split by whether the source
/// text contains them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantityCheck {
    pub validated: Vec<String>,
    pub unsupported: Vec<String>,
}

impl QuantityCheck {
    pub fn is_supported(&self) -> bool {
        self.unsupported.is_empty()
    }
}

/// Informational per-kind checks. These never change `is_valid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationDetails {
    /// Decision participants
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<NameCheck>,

    /// Action owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<NameCheck>,

    /// Whether the action due date is in a recognized format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date_recognized: Option<bool>,

    /// Dates and numbers checked against the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantities: Option<QuantityCheck>,
}

/// Outcome of validating one item against its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub source_support: f32,
    pub word_overlap: f32,
    pub issues: Vec<ValidationIssue>,
    #[serde(default)]
    pub details: ValidationDetails,
}

impl ValidationVerdict {
    /// Build a verdict, deriving `is_valid` from support and issues.
    pub fn new(source_support: f32, word_overlap: f32, issues: Vec<ValidationIssue>) -> Self {
        let source_support = source_support.clamp(0.0, 1.0);
        let is_valid = source_support > MIN_SOURCE_SUPPORT
            && !issues.iter().any(|i| i.severity == Severity::High);

        Self {
            is_valid,
            source_support,
            word_overlap: word_overlap.clamp(0.0, 1.0),
            issues,
            details: ValidationDetails::default(),
        }
    }

    pub fn with_details(mut self, details: ValidationDetails) -> Self {
        self.details = details;
        self
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    /// Low support suggests the item was not said in the meeting.
    pub fn is_potential_hallucination(&self) -> bool {
        self.source_support < MIN_SOURCE_SUPPORT
    }
}

//! Candidate items proposed by the extractors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::provenance::ProvenanceRecord;
use crate::types::validation::ValidationVerdict;

/// Which artifact an extractor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Decision,
    Action,
    Risk,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Decision => "decision",
            ItemKind::Action => "action",
            ItemKind::Risk => "risk",
        }
    }

    /// Component name used by evaluation rubrics.
    pub fn component(&self) -> &'static str {
        match self {
            ItemKind::Decision => "decisions",
            ItemKind::Action => "action_items",
            ItemKind::Risk => "risks",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Parse a priority label, defaulting to medium for anything unknown.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

/// Risk categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Timeline,
    Technical,
    Resource,
    Regulatory,
    Business,
    #[default]
    Other,
}

impl RiskCategory {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "timeline" => RiskCategory::Timeline,
            "technical" => RiskCategory::Technical,
            "resource" => RiskCategory::Resource,
            "regulatory" => RiskCategory::Regulatory,
            "business" => RiskCategory::Business,
            _ => RiskCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Timeline => "Timeline",
            RiskCategory::Technical => "Technical",
            RiskCategory::Resource => "Resource",
            RiskCategory::Regulatory => "Regulatory",
            RiskCategory::Business => "Business",
            RiskCategory::Other => "Other",
        }
    }
}

/// Thematic category of a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionCategory {
    Timeline,
    Features,
    Budget,
    Security,
    Communication,
    Resources,
    Process,
    #[default]
    Other,
}

impl DecisionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionCategory::Timeline => "timeline",
            DecisionCategory::Features => "features",
            DecisionCategory::Budget => "budget",
            DecisionCategory::Security => "security",
            DecisionCategory::Communication => "communication",
            DecisionCategory::Resources => "resources",
            DecisionCategory::Process => "process",
            DecisionCategory::Other => "other",
        }
    }
}

/// Dates, numbers and before/after changes mentioned in an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantitativeData {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub changes: Vec<String>,
}

impl QuantitativeData {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.numbers.is_empty() && self.changes.is_empty()
    }
}

/// How a candidate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Structured generation collaborator
    Generated,
    /// Deterministic pattern rules
    Pattern,
}

/// Kind-specific fields of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemDetails {
    Decision {
        rationale: Option<String>,
        participants: Vec<String>,
        category: DecisionCategory,
    },
    Action {
        owner: String,
        due_date: Option<String>,
        priority: Priority,
    },
    Risk {
        category: RiskCategory,
        mentioned_by: Option<String>,
    },
}

/// An unvalidated decision, action or risk proposed by an extractor.
///
/// Created by an extractor, then enriched in place by the provenance
/// resolver, the validator and the calibrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// The decision/action/risk statement
    pub text: String,

    #[serde(flatten)]
    pub details: ItemDetails,

    /// Current confidence (calibrated once the pipeline has run)
    pub confidence: f32,

    /// Confidence as reported by the extractor, before calibration
    pub extractor_confidence: f32,

    pub method: ExtractionMethod,

    /// Segment the pattern rule fired on, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<usize>,

    #[serde(default)]
    pub quantitative: QuantitativeData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ProvenanceRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationVerdict>,
}

impl CandidateItem {
    fn new(text: impl Into<String>, details: ItemDetails, confidence: f32, method: ExtractionMethod) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            text: text.into(),
            details,
            confidence,
            extractor_confidence: confidence,
            method,
            segment_index: None,
            quantitative: QuantitativeData::default(),
            provenance: None,
            validation: None,
        }
    }

    pub fn decision(
        text: impl Into<String>,
        rationale: Option<String>,
        participants: Vec<String>,
        category: DecisionCategory,
        confidence: f32,
        method: ExtractionMethod,
    ) -> Self {
        Self::new(
            text,
            ItemDetails::Decision {
                rationale,
                participants,
                category,
            },
            confidence,
            method,
        )
    }

    pub fn action(
        text: impl Into<String>,
        owner: impl Into<String>,
        due_date: Option<String>,
        priority: Priority,
        confidence: f32,
        method: ExtractionMethod,
    ) -> Self {
        Self::new(
            text,
            ItemDetails::Action {
                owner: owner.into(),
                due_date,
                priority,
            },
            confidence,
            method,
        )
    }

    pub fn risk(
        text: impl Into<String>,
        category: RiskCategory,
        mentioned_by: Option<String>,
        confidence: f32,
        method: ExtractionMethod,
    ) -> Self {
        Self::new(
            text,
            ItemDetails::Risk {
                category,
                mentioned_by,
            },
            confidence,
            method,
        )
    }

    pub fn with_segment(mut self, index: usize) -> Self {
        self.segment_index = Some(index);
        self
    }

    pub fn with_quantitative(mut self, quantitative: QuantitativeData) -> Self {
        self.quantitative = quantitative;
        self
    }

    pub fn kind(&self) -> ItemKind {
        match self.details {
            ItemDetails::Decision { .. } => ItemKind::Decision,
            ItemDetails::Action { .. } => ItemKind::Action,
            ItemDetails::Risk { .. } => ItemKind::Risk,
        }
    }

    /// Category label regardless of kind (actions report their priority).
    pub fn category(&self) -> &'static str {
        match &self.details {
            ItemDetails::Decision { category, .. } => category.as_str(),
            ItemDetails::Action { priority, .. } => match priority {
                Priority::High => "high",
                Priority::Medium => "medium",
                Priority::Low => "low",
            },
            ItemDetails::Risk { category, .. } => category.as_str(),
        }
    }

    /// People attached to the item: decision participants, action owner,
    /// or whoever raised the risk.
    pub fn people(&self) -> Vec<&str> {
        match &self.details {
            ItemDetails::Decision { participants, .. } => {
                participants.iter().map(String::as_str).collect()
            }
            ItemDetails::Action { owner, .. } => vec![owner.as_str()],
            ItemDetails::Risk { mentioned_by, .. } => mentioned_by.as_deref().into_iter().collect(),
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match &self.details {
            ItemDetails::Action { owner, .. } => Some(owner.as_str()),
            _ => None,
        }
    }

    pub fn due_date(&self) -> Option<&str> {
        match &self.details {
            ItemDetails::Action { due_date, .. } => due_date.as_deref(),
            _ => None,
        }
    }

    pub fn rationale(&self) -> Option<&str> {
        match &self.details {
            ItemDetails::Decision { rationale, .. } => rationale.as_deref(),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation.as_ref().map(|v| v.is_valid).unwrap_or(false)
    }
}

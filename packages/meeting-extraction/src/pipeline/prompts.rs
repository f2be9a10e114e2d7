//! Generation prompts for extraction and judging.
//!
//! Each extraction template carries a rubric, positive and negative
//! examples and the exact output schema. The library is the only parser
//! of the generator's output, so the schema here must match
//! `pipeline::generation`.

use sha2::{Digest, Sha256};

use crate::types::candidate::ItemKind;
use crate::types::config::ComponentRubric;
use crate::types::segment::{Intent, IntentTag};

/// Maximum flagged statements appended to an extraction prompt.
pub const MAX_FLAGGED_STATEMENTS: usize = 20;

/// Prompt for extracting decisions.
pub const DECISION_PROMPT: &str = r#"You are reviewing a meeting transcript. List every DECISION the participants made.

A decision is recorded when the group:
- agrees on a course of action ("we decided to ...")
- picks one option over others ("we're going with ...")
- approves a proposal ("the plan was approved")
- closes an open question ("we concluded that ...")
- commits to a direction ("we will ...")

Good examples:
- "We decided to push the launch date from October 15th to October 29th"
- "We agreed to drop the custom branding feature"
- "The team approved the security audit"
- "Let's make October 29th the new launch date"

Not decisions (discussion only):
- "What do you think about the timeline?"
- "We should think about the risks"
- "Let me check with legal first"

Transcript:
{context}
{flagged_section}
Respond with JSON only, in exactly this shape:
{"decisions": [
  {
    "decision": "what was decided",
    "rationale": "why, if stated (otherwise null)",
    "participants": ["people involved"],
    "confidence": 0.9
  }
]}"#;

/// Prompt for extracting action items.
pub const ACTION_PROMPT: &str = r#"You are reviewing a meeting transcript. List every ACTION ITEM that was assigned or volunteered.

An action item is a concrete task with a person responsible for it:
- direct requests ("Sarah, can you send the deck?")
- commitments ("I'll update the roadmap")
- assignments ("Marcus will own the migration")
- delegation ("let's have Priya review it")

Good examples:
- "Sarah, can you contact the Salesforce manager by end of day tomorrow?"
- "I'll send the revised budget by Friday"
- "Marcus needs to finish the API review this week"

Not action items:
- "Someone should look at this eventually"
- "It would be nice if the docs were better"
- general discussion without an owner

Use the speaker's name when a speaker says "I" or "I'll". Use "Unclear" when no owner can be identified.

Transcript:
{context}
{flagged_section}
Respond with JSON only, in exactly this shape:
{"action_items": [
  {
    "action": "the task",
    "owner": "person responsible",
    "due_date": "deadline if stated (otherwise null)",
    "priority": "high | medium | low",
    "confidence": 0.9
  }
]}"#;

/// Prompt for extracting risks.
pub const RISK_PROMPT: &str = r#"You are reviewing a meeting transcript. List every RISK, concern or blocker that was raised.

A risk is something that could hurt the project if it happens:
- explicit risks ("the risk is that the vendor slips")
- concerns ("I'm worried about the audit")
- blockers and dependencies ("we're blocked on the API keys")
- conditional threats ("if we don't get approval, we miss the date")

Good examples:
- "The risk is that the integration won't be ready before launch"
- "I'm concerned the compliance review takes longer than planned"

Not risks:
- tasks that are simply being worked on
- questions without a stated downside

Categories: Timeline, Technical, Resource, Regulatory, Business.

Transcript:
{context}
{flagged_section}
Respond with JSON only, in exactly this shape:
{"risks": [
  {
    "risk": "what could go wrong",
    "category": "Timeline | Technical | Resource | Regulatory | Business",
    "mentioned_by": "who raised it",
    "confidence": 0.9
  }
]}"#;

/// Prompt for judging one component against a rubric.
pub const JUDGE_PROMPT: &str = r#"You are grading the output of a meeting-notes extraction system.

Component under review: {component}

Grade each criterion from 0 (unusable) to 10 (perfect):
{criteria}

Meeting transcript:
{transcript}

Extracted {component}:
{extracted}

Respond with JSON only, in exactly this shape:
{"scores": {"<criterion>": 7.5}, "explanations": {"<criterion>": "one sentence"}}"#;

/// Which template an extractor kind uses.
pub fn template_for(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Decision => DECISION_PROMPT,
        ItemKind::Action => ACTION_PROMPT,
        ItemKind::Risk => RISK_PROMPT,
    }
}

/// Intent that feeds a kind's "flagged statements" section.
pub fn intent_for(kind: ItemKind) -> Intent {
    match kind {
        ItemKind::Decision => Intent::Decision,
        ItemKind::Action => Intent::Action,
        ItemKind::Risk => Intent::Risk,
    }
}

/// Render up to [`MAX_FLAGGED_STATEMENTS`] sentences tagged with `intent`.
fn flagged_section(tags: &[IntentTag], intent: Intent) -> String {
    let lines: Vec<String> = tags
        .iter()
        .filter(|t| t.has(intent))
        .take(MAX_FLAGGED_STATEMENTS)
        .map(|t| match &t.speaker {
            Some(speaker) => format!("- {}: {}", speaker, t.sentence),
            None => format!("- {}", t.sentence),
        })
        .collect();

    if lines.is_empty() {
        return String::new();
    }

    format!(
        "\nStatements flagged as likely {}s (check these first):\n{}\n",
        intent,
        lines.join("\n")
    )
}

/// Format the extraction prompt for a kind.
pub fn format_extraction_prompt(kind: ItemKind, context: &str, tags: &[IntentTag]) -> String {
    template_for(kind)
        .replace("{context}", context)
        .replace("{flagged_section}", &flagged_section(tags, intent_for(kind)))
}

/// Format the judge prompt for one component.
pub fn format_judge_prompt(
    component: &str,
    rubric: &ComponentRubric,
    transcript: &str,
    extracted: &str,
) -> String {
    let criteria = rubric
        .criteria
        .iter()
        .map(|c| match rubric.descriptions.get(c) {
            Some(d) => format!("- {}: {}", c, d),
            None => format!("- {}", c),
        })
        .collect::<Vec<_>>()
        .join("\n");

    JUDGE_PROMPT
        .replace("{criteria}", &criteria)
        .replace("{transcript}", transcript)
        .replace("{extracted}", extracted)
        .replace("{component}", component)
}

/// Hash of all extraction templates, recorded with each report so results
/// from different template revisions can be told apart.
pub fn templates_hash() -> String {
    let mut hasher = Sha256::new();
    for template in [DECISION_PROMPT, ACTION_PROMPT, RISK_PROMPT] {
        hasher.update(template.as_bytes());
    }
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::segment::Segment;

    #[test]
    fn test_each_prompt_names_only_its_own_schema() {
        for kind in [ItemKind::Decision, ItemKind::Action, ItemKind::Risk] {
            let prompt = format_extraction_prompt(kind, "Ana: hi", &[]);
            for other in [ItemKind::Decision, ItemKind::Action, ItemKind::Risk] {
                let needle = format!("{{\"{}\"", other.component());
                assert_eq!(prompt.contains(&needle), kind == other, "{:?} in {:?}", other, kind);
            }
            assert!(prompt.contains("Ana: hi"));
            assert!(!prompt.contains("{context}"));
        }
    }

    #[test]
    fn test_flagged_section_is_bounded_and_filtered() {
        let seg = Segment::new(0, "x").with_speaker("Ana");
        let mut tags: Vec<IntentTag> = (0..30)
            .map(|i| IntentTag::new(format!("risk number {}", i), &seg, [Intent::Risk], 0.6))
            .collect();
        tags.push(IntentTag::new("we decided it", &seg, [Intent::Decision], 0.6));

        let prompt = format_extraction_prompt(ItemKind::Risk, "ctx", &tags);
        assert_eq!(prompt.matches("- Ana: risk number").count(), MAX_FLAGGED_STATEMENTS);
        assert!(!prompt.contains("we decided it"));
    }

    #[test]
    fn test_judge_prompt_lists_criteria() {
        let rubric = crate::types::config::EvaluationRubric::default();
        let decisions = rubric.component("decisions").unwrap();
        let prompt = format_judge_prompt("decisions", decisions, "Ana: hi", "[]");

        assert!(prompt.contains("- specificity:"));
        assert!(prompt.contains("Component under review: decisions"));
        assert!(!prompt.contains("{\"decisions\""));
    }

    #[test]
    fn test_templates_hash_is_stable() {
        assert_eq!(templates_hash(), templates_hash());
        assert_eq!(templates_hash().len(), 16);
    }
}

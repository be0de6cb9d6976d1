//! Fallback row factory: deterministic placeholder and audit rows.

use crate::error::sanitize_message;
use crate::record::{IdeaRecord, OutputRow, RowStatus};

/// Note prefix for a whole-batch mock written because the backend refused service.
pub const QUOTA_MOCK_NOTE_PREFIX: &str = "fallback_mock_due_to_quota";

/// Audit-row note when no error detail was captured.
pub const DEFAULT_BLOCKED_NOTE: &str = "generation failed";

/// Errors quoted in the blocked audit row.
pub const MAX_BLOCKED_ERRORS: usize = 3;

/// Placeholder idea for slot `index` (0-based). Cycles reels, carousel and stories.
pub fn archetype(index: usize) -> IdeaRecord {
    let fields: [&str; 10] = match index % 3 {
        0 => [
            "education",
            "reels",
            "MOCK: the benefit review in 15 seconds",
            "Was your benefit cut without explanation?",
            "You may be entitled to a recalculation.",
            "Script (MOCK): 1) The most common mistake. 2) Who qualifies. 3) CTA to free triage.",
            "Cut without warning? It may be wrong.",
            "Caption (MOCK): free triage and a quick explanation.",
            "Free triage via the link in bio.",
            "Assets: simple card and icons",
        ],
        1 => [
            "social_proof",
            "carousel",
            "MOCK: before and after the recalculation",
            "Before vs after",
            "One mistake can shrink the amount a lot.",
            "Script (MOCK): 5 slides: promise, context, mistake, argument, CTA.",
            "BEFORE vs AFTER",
            "Caption (MOCK): tell the case and invite to triage.",
            "Book a consultation.",
            "Assets: simple chart",
        ],
        _ => [
            "triage",
            "stories",
            "MOCK: free triage in 30 seconds",
            "Want to know if your case is strong?",
            "Answer six questions.",
            "Script (MOCK): 3 stories with a CTA.",
            "Free triage",
            "Caption (MOCK): triage, documents, consultation.",
            "Message us directly.",
            "Assets: 3 cards",
        ],
    };
    let [pillar, format, idea_title, hook, hook_alt, script, on_screen_text, caption, cta, assets_needed] =
        fields.map(str::to_string);
    IdeaRecord {
        pillar,
        format,
        idea_title,
        hook,
        hook_alt,
        script,
        on_screen_text,
        caption,
        cta,
        assets_needed,
    }
}

/// Mock row standing in for one failed slot.
pub fn slot_placeholder(timestamp: &str, objective: &str, index: usize, note: &str) -> OutputRow {
    OutputRow::new(
        timestamp,
        objective,
        archetype(index),
        RowStatus::Mock,
        sanitize_message(note),
    )
}

/// `slots` mock rows cycling the archetypes, all tagged with the quota error.
pub fn quota_batch(timestamp: &str, objective: &str, slots: usize, error: &str) -> Vec<OutputRow> {
    let note = format!("{}: {}", QUOTA_MOCK_NOTE_PREFIX, error);
    (0..slots)
        .map(|index| slot_placeholder(timestamp, objective, index, &note))
        .collect()
}

/// Join up to three sanitized errors with ` | `.
pub fn blocked_note(errors: &[String]) -> String {
    let joined = errors
        .iter()
        .take(MAX_BLOCKED_ERRORS)
        .map(|e| sanitize_message(e))
        .collect::<Vec<_>>()
        .join(" | ");
    if joined.is_empty() {
        DEFAULT_BLOCKED_NOTE.to_string()
    } else {
        joined
    }
}

/// System-authored audit row recording that no genuine draft was produced today.
pub fn blocked_row(timestamp: &str, objective: &str, errors: &[String]) -> OutputRow {
    let note = blocked_note(errors);
    let record = IdeaRecord {
        pillar: "system".to_string(),
        format: "n/a".to_string(),
        idea_title: "Generation unavailable today".to_string(),
        hook: "-".to_string(),
        hook_alt: "-".to_string(),
        script: format!("Failed to generate content. Reason: {}", note),
        on_screen_text: "-".to_string(),
        caption: "No content generated today.".to_string(),
        cta: "Try again later.".to_string(),
        assets_needed: "None".to_string(),
    };
    OutputRow::new(timestamp, objective, record, RowStatus::Blocked, note)
}

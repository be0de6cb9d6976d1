//! Prompt assembly: master prompt from objective, brief and recent context, plus the
//! per-slot format template and revision instructions.

use crate::context::ContextRows;
use crate::provider::OutputFormat;
use crate::record::FIELDS;

/// Rows of each context sheet quoted in the master prompt.
pub const CONTEXT_SAMPLE_ROWS: usize = 12;

/// Hard cap on the master prompt before templates are appended.
pub const DEFAULT_PROMPT_CHAR_LIMIT: usize = 6500;

pub const DEFAULT_BRIEF: &str = "You are a social media manager producing short-form content \
for a small professional service. Write in plain language, make no promises of results, and \
always close with a call to action that invites the reader to a free triage by direct message.";

/// Extra instruction attached to a regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision<'a> {
    /// First attempt for the slot.
    Fresh,
    /// The previous output could not be used; `reason` says why.
    Corrective { reason: &'a str },
    /// The previous output repeated an accepted idea.
    MoreDifferent { avoid_titles: &'a [String] },
}

/// Builds the prompt text for every slot of a run.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    objective: String,
    brief: String,
    char_limit: usize,
    format: OutputFormat,
}

impl PromptBuilder {
    pub fn new(objective: &str, brief: &str, char_limit: usize, format: OutputFormat) -> Self {
        Self {
            objective: objective.to_string(),
            brief: brief.to_string(),
            char_limit,
            format,
        }
    }

    /// Master prompt, cut to the configured character limit.
    pub fn base_prompt(&self, context: &ContextRows) -> String {
        let mut prompt = String::new();
        prompt.push_str(self.brief.trim());
        prompt.push_str("\n\nOBJECTIVE: ");
        prompt.push_str(&self.objective);
        prompt.push_str(
            "\nIf the objective is balanced, mix reach, authority and conversion across the ideas.\n",
        );
        prompt.push_str("\nCONTEXT (samples):\n");
        prompt.push_str("- Recently planned or published items (do not repeat): ");
        prompt.push_str(&sample(&context.calendar));
        prompt.push_str("\n- Swipe file (patterns that work): ");
        prompt.push_str(&sample(&context.swipe));
        prompt.push_str("\n- Recent performance (favor what drives leads and profile visits): ");
        prompt.push_str(&sample(&context.performance));
        prompt.push_str(
            "\n\nTASK: produce one new content idea per request. Across the day cover one reels \
             (20-40s, strong hook, one idea), one carousel (7-9 slides, saveable) and one stories \
             sequence (3-5 stories with a poll and a direct CTA).\n\
             Fields: pillar (pain|proof|explanation|objection|cta), format (reels|carousel|stories), \
             idea_title, hook, hook_alt, script, on_screen_text, caption, cta, assets_needed.\n\
             Review for clarity, avoid jargon and avoid promises before answering.\n",
        );
        truncate_chars(&prompt, self.char_limit)
    }

    /// Full prompt for slot `slot` of `total` (1-based).
    pub fn slot_prompt(&self, base: &str, slot: usize, total: usize, revision: Revision<'_>) -> String {
        let mut prompt = String::with_capacity(base.len() + 512);
        prompt.push_str(base);
        prompt.push_str(&self.format_template());
        match revision {
            Revision::Fresh => {}
            Revision::Corrective { reason } => {
                prompt.push_str("\nYour previous answer could not be used (");
                prompt.push_str(reason);
                prompt.push_str("). Follow the output format exactly and fill every field.\n");
            }
            Revision::MoreDifferent { avoid_titles } => {
                prompt.push_str(
                    "\nYour previous idea was too similar to one already chosen today. \
                     Be clearly different in topic, angle and hook. Do not reuse these ideas:\n",
                );
                for title in avoid_titles {
                    prompt.push_str("- ");
                    prompt.push_str(title);
                    prompt.push('\n');
                }
            }
        }
        prompt.push_str(&format!("\nGenerate idea {}/{} now.", slot, total));
        prompt
    }

    fn format_template(&self) -> String {
        let keys = FIELDS.join(", ");
        match self.format {
            OutputFormat::Kv => format!(
                "\n\nReturn EXACTLY 10 lines in key=value format, no markdown, no extra text.\n\
                 The keys are EXACTLY:\n{}\n\
                 Rules: script <= 400 characters; caption <= 350; other fields short.\n\
                 No quotes needed; just key=value.\n",
                keys
            ),
            OutputFormat::Json => format!(
                "\n\nReturn ONLY one valid JSON object with exactly these string keys:\n{}\n\
                 No markdown, no code fences, no text outside the JSON.\n",
                keys
            ),
        }
    }
}

fn sample(rows: &[Vec<String>]) -> String {
    let start = rows.len().saturating_sub(CONTEXT_SAMPLE_ROWS);
    serde_json::to_string(&rows[start..]).unwrap_or_else(|_| "[]".to_string())
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

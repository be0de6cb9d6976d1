//! Idea records and the calendar row layout they are written as.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The ten generated fields, in calendar column order.
pub const FIELDS: [&str; 10] = [
    "pillar",
    "format",
    "idea_title",
    "hook",
    "hook_alt",
    "script",
    "on_screen_text",
    "caption",
    "cta",
    "assets_needed",
];

/// Zero-based position of the status cell in a calendar row.
pub const STATUS_COLUMN: usize = 12;

/// Number of cells in a calendar row.
pub const ROW_WIDTH: usize = 14;

/// One generated content idea. Every field defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaRecord {
    #[serde(default)]
    pub pillar: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub idea_title: String,
    #[serde(default)]
    pub hook: String,
    #[serde(default)]
    pub hook_alt: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub on_screen_text: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub assets_needed: String,
}

impl IdeaRecord {
    /// Mutable access by field name; `None` for names outside [`FIELDS`].
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "pillar" => Some(&mut self.pillar),
            "format" => Some(&mut self.format),
            "idea_title" => Some(&mut self.idea_title),
            "hook" => Some(&mut self.hook),
            "hook_alt" => Some(&mut self.hook_alt),
            "script" => Some(&mut self.script),
            "on_screen_text" => Some(&mut self.on_screen_text),
            "caption" => Some(&mut self.caption),
            "cta" => Some(&mut self.cta),
            "assets_needed" => Some(&mut self.assets_needed),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "pillar" => &self.pillar,
            "format" => &self.format,
            "idea_title" => &self.idea_title,
            "hook" => &self.hook,
            "hook_alt" => &self.hook_alt,
            "script" => &self.script,
            "on_screen_text" => &self.on_screen_text,
            "caption" => &self.caption,
            "cta" => &self.cta,
            "assets_needed" => &self.assets_needed,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Field values in column order.
    pub fn values(&self) -> [&str; 10] {
        [
            self.pillar.as_str(),
            self.format.as_str(),
            self.idea_title.as_str(),
            self.hook.as_str(),
            self.hook_alt.as_str(),
            self.script.as_str(),
            self.on_screen_text.as_str(),
            self.caption.as_str(),
            self.cta.as_str(),
            self.assets_needed.as_str(),
        ]
    }

    /// Number of non-blank fields.
    pub fn filled_count(&self) -> usize {
        self.values()
            .iter()
            .filter(|value| !value.trim().is_empty())
            .count()
    }
}

/// Status tag stored in the calendar status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Draft,
    Mock,
    Blocked,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RowStatus::Draft => "draft",
            RowStatus::Mock => "mock",
            RowStatus::Blocked => "blocked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "draft" => Some(RowStatus::Draft),
            "mock" => Some(RowStatus::Mock),
            "blocked" => Some(RowStatus::Blocked),
            _ => None,
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row ready to be appended to the calendar sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub timestamp: String,
    pub objective: String,
    pub record: IdeaRecord,
    pub status: RowStatus,
    pub notes: String,
}

impl OutputRow {
    pub fn new(
        timestamp: &str,
        objective: &str,
        record: IdeaRecord,
        status: RowStatus,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            objective: objective.to_string(),
            record,
            status,
            notes: notes.into(),
        }
    }

    /// Flatten into the 14 calendar cells.
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(ROW_WIDTH);
        cells.push(self.timestamp.clone());
        cells.push(self.objective.clone());
        cells.extend(self.record.values().iter().map(|value| value.to_string()));
        cells.push(self.status.as_str().to_string());
        cells.push(self.notes.clone());
        cells
    }
}

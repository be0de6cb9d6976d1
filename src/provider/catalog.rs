//! Model catalog: eligibility filtering and preference ranking of listed models.

use crate::error::{DraftError, GenerationError};
use crate::provider::{GenerativeBackend, ListedModel};
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info};

/// Operation name a model must declare to be usable for generation.
pub const GENERATE_METHOD: &str = "generateContent";

/// Default most-to-least preferred models.
pub const DEFAULT_PREFERRED_MODELS: [&str; 5] = [
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-pro",
];

pub const DEFAULT_ALLOW_PATTERN: &str = r"^gemini-";

pub const DEFAULT_DENY_PATTERNS: [&str; 11] = [
    "embedding",
    "aqa",
    "imagen",
    "image",
    "vision",
    "tts",
    "audio",
    "live",
    "veo",
    "learnlm",
    "robotics",
];

/// Default number of non-preferred models tried after the preference list.
pub const DEFAULT_EXTRA_MODEL_CAP: usize = 3;

/// A listed model with its capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelDescriptor {
    /// Model id without the `models/` prefix.
    pub id: String,
    pub supports_generation: bool,
    pub is_text_model: bool,
}

impl ModelDescriptor {
    pub fn is_eligible(&self) -> bool {
        self.supports_generation && self.is_text_model
    }
}

/// Models in the order they should be attempted. Never contains duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedModelList {
    models: Vec<ModelDescriptor>,
}

impl RankedModelList {
    pub fn iter(&self) -> std::slice::Iter<'_, ModelDescriptor> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a RankedModelList {
    type Item = &'a ModelDescriptor;
    type IntoIter = std::slice::Iter<'a, ModelDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

/// Discovers and orders candidate models.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    preferred: Vec<String>,
    allow: Regex,
    deny: Vec<Regex>,
    extra_cap: usize,
}

impl ModelCatalog {
    pub fn new(
        preferred: Vec<String>,
        allow_pattern: &str,
        deny_patterns: &[String],
        extra_cap: usize,
    ) -> Result<Self, DraftError> {
        let allow = Regex::new(allow_pattern).map_err(|e| {
            DraftError::ConfigError(format!("Invalid model allow pattern '{}': {}", allow_pattern, e))
        })?;
        let deny = deny_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    DraftError::ConfigError(format!("Invalid model deny pattern '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            preferred,
            allow,
            deny,
            extra_cap,
        })
    }

    /// Catalog with the built-in preference list and filters.
    pub fn with_defaults() -> Self {
        let deny: Vec<String> = DEFAULT_DENY_PATTERNS.iter().map(|s| s.to_string()).collect();
        Self::new(
            DEFAULT_PREFERRED_MODELS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_ALLOW_PATTERN,
            &deny,
            DEFAULT_EXTRA_MODEL_CAP,
        )
        .expect("built-in model patterns are valid")
    }

    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }

    pub fn extra_cap(&self) -> usize {
        self.extra_cap
    }

    /// Compute capability flags for one listing entry.
    pub fn describe(&self, listed: &ListedModel) -> ModelDescriptor {
        let id = listed
            .name
            .strip_prefix("models/")
            .unwrap_or(&listed.name)
            .to_string();
        let supports_generation = listed
            .supported_methods
            .iter()
            .any(|method| method == GENERATE_METHOD);
        let is_text_model =
            self.allow.is_match(&id) && !self.deny.iter().any(|pattern| pattern.is_match(&id));
        ModelDescriptor {
            id,
            supports_generation,
            is_text_model,
        }
    }

    /// List the backend's models and keep the eligible ones, in discovery order.
    pub async fn list_eligible_models(
        &self,
        backend: &dyn GenerativeBackend,
    ) -> Result<Vec<ModelDescriptor>, GenerationError> {
        let listed = backend.list_models().await?;
        let total = listed.len();
        let eligible: Vec<ModelDescriptor> = listed
            .iter()
            .map(|model| self.describe(model))
            .filter(ModelDescriptor::is_eligible)
            .collect();
        debug!(
            backend = backend.backend_name(),
            listed = total,
            eligible = eligible.len(),
            "Model listing filtered"
        );
        Ok(eligible)
    }

    /// Preferred models present in `available` (preference order), then the remaining
    /// available models in discovery order, at most `extra_cap` of them.
    pub fn rank(&self, available: &[ModelDescriptor]) -> RankedModelList {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut models = Vec::new();

        for preferred in &self.preferred {
            if let Some(model) = available.iter().find(|m| &m.id == preferred) {
                if seen.insert(model.id.as_str()) {
                    models.push(model.clone());
                }
            }
        }

        let mut extras = 0usize;
        for model in available {
            if extras >= self.extra_cap {
                break;
            }
            if self.preferred.iter().any(|p| p == &model.id) {
                continue;
            }
            if seen.insert(model.id.as_str()) {
                models.push(model.clone());
                extras += 1;
            }
        }

        RankedModelList { models }
    }

    /// List, filter and rank. An empty result is a run-fatal `NoEligibleModels`.
    pub async fn ranked_models(
        &self,
        backend: &dyn GenerativeBackend,
    ) -> Result<RankedModelList, GenerationError> {
        let eligible = self.list_eligible_models(backend).await?;
        let ranked = self.rank(&eligible);
        if ranked.is_empty() {
            return Err(GenerationError::no_eligible_models());
        }
        info!(models = ?ranked.ids(), "Ranked candidate models");
        Ok(ranked)
    }
}

//! Invariants that must hold for any input

use dailydraft::daily::{DailyState, RerunPolicy};
use dailydraft::generation::diversity::jaccard;
use dailydraft::generation::parse::{parse_json, parse_kv};
use dailydraft::generation::RetryPolicy;
use dailydraft::provider::{ModelCatalog, ModelDescriptor};
use dailydraft::record::{IdeaRecord, FIELDS};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::time::Duration;

fn descriptor(id: &str) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        supports_generation: true,
        is_text_model: true,
    }
}

fn model_id() -> impl Strategy<Value = String> {
    "m[a-f]"
}

fn field_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,10}( [A-Za-z0-9.,!?']{1,10}){0,3}"
}

fn record() -> impl Strategy<Value = IdeaRecord> {
    prop::collection::vec(field_value(), 10).prop_map(|values| {
        let mut record = IdeaRecord::default();
        for (name, value) in FIELDS.iter().zip(values) {
            if let Some(slot) = record.field_mut(name) {
                *slot = value;
            }
        }
        record
    })
}

fn to_kv(record: &IdeaRecord) -> String {
    FIELDS
        .iter()
        .map(|name| format!("{}={}", name, record.field(name).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ranking never repeats a model, keeps preference order and respects the extra cap
#[test]
fn test_ranking_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(model_id(), 0..6),
                prop::collection::vec(model_id(), 0..12),
                0usize..4,
            ),
            |(preferred, available, cap)| {
                let catalog = ModelCatalog::new(preferred.clone(), ".*", &[], cap).unwrap();
                let available: Vec<ModelDescriptor> =
                    available.iter().map(|id| descriptor(id)).collect();
                let ranked = catalog.rank(&available);
                let ids = ranked.ids();

                let unique: HashSet<&str> = ids.iter().copied().collect();
                prop_assert_eq!(unique.len(), ids.len());

                let mut expected_head: Vec<&str> = Vec::new();
                for id in &preferred {
                    if available.iter().any(|m| &m.id == id) && !expected_head.contains(&id.as_str()) {
                        expected_head.push(id.as_str());
                    }
                }
                prop_assert_eq!(&ids[..expected_head.len()], &expected_head[..]);

                let extras = &ids[expected_head.len()..];
                prop_assert!(extras.len() <= cap);
                for id in extras {
                    prop_assert!(!preferred.iter().any(|p| p == id));
                    prop_assert!(available.iter().any(|m| &m.id == id));
                }
                Ok(())
            },
        )
        .unwrap();
}

proptest! {
    /// A JSON object wrapped in brace-free prose comes back unchanged
    #[test]
    fn test_json_in_prose_round_trips(
        record in record(),
        before in "[A-Za-z .:!\n]{0,40}",
        after in "[A-Za-z .:!\n]{0,40}",
    ) {
        let json = serde_json::to_string(&record).unwrap();
        let text = format!("{before}{json}{after}");
        let parsed = parse_json(&text).unwrap();
        prop_assert_eq!(parsed, record);
    }

    /// Cutting a kv reply anywhere keeps complete lines intact and never invents text
    #[test]
    fn test_kv_prefix_keeps_complete_lines(record in record(), cut in 0usize..400) {
        let full = to_kv(&record);
        let cut = cut.min(full.len());
        let prefix = &full[..cut];
        let parsed = parse_kv(prefix);

        let complete_lines = prefix.matches('\n').count();
        for (index, name) in FIELDS.iter().enumerate() {
            let original = record.field(name).unwrap_or_default();
            let value = parsed.field(name).unwrap_or_default();
            if index < complete_lines {
                prop_assert_eq!(value, original);
            } else {
                prop_assert!(original.starts_with(value));
            }
        }
    }

    /// Similarity is symmetric and bounded
    #[test]
    fn test_jaccard_symmetric_and_bounded(
        a in prop::collection::hash_set("[a-z]{1,4}", 0..10),
        b in prop::collection::hash_set("[a-z]{1,4}", 0..10),
    ) {
        let ab = jaccard(&a, &b);
        prop_assert_eq!(ab, jaccard(&b, &a));
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(jaccard(&a, &a), 1.0);
    }

    /// Token sets with nothing in common score zero
    #[test]
    fn test_jaccard_disjoint_is_zero(
        a in prop::collection::hash_set("x[a-z]{0,4}", 1..8),
        b in prop::collection::hash_set("y[a-z]{0,4}", 1..8),
    ) {
        prop_assert_eq!(jaccard(&a, &b), 0.0);
    }

    /// Backoff stays within the capped delay plus jitter
    #[test]
    fn test_backoff_is_bounded(attempt in 0u32..40, seed in any::<u64>()) {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let wait = policy.backoff(attempt, &mut rng);
        let floor = policy
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
            .min(policy.max_delay);
        prop_assert!(wait >= floor);
        prop_assert!(wait <= policy.max_delay.mul_f64(1.0 + policy.jitter_ratio) + Duration::from_millis(1));
    }

    /// Skip runs only when a draft exists; allow always runs
    #[test]
    fn test_gate_decision(draft in any::<bool>(), mock in any::<bool>(), blocked in any::<bool>()) {
        let state = DailyState {
            has_draft_today: draft,
            has_mock_today: mock,
            has_blocked_today: blocked,
        };
        prop_assert_eq!(state.should_generate(RerunPolicy::Skip), !draft);
        prop_assert!(state.should_generate(RerunPolicy::Allow));
    }
}

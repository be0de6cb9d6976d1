//! Property-based tests for ranking, parsing and similarity

mod invariants;

//! SOUL Engine Benchmark Suite.
//!
//! Informal performance targets for real-time narrative use:
//!   interaction_single .......... < 5μs
//!   trigger_scan_long_text ...... < 50μs
//!   full_turn_keyword_eval ...... < 100μs

use std::collections::HashMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use soul_core::{
    Belief, Character, KeywordEvaluator, Personality, Registry,
};

fn make_character() -> Character {
    let registry = Arc::new(Registry::builder().build());
    Character::builder(registry, Personality::Worrier)
        .with_history()
        .with_presentation()
        .with_triggers(HashMap::new())
        .with_beliefs(vec![
            Belief::new("The village is safe", 0.8, 0.5, vec!["safety".to_string()]),
            Belief::new("My family loves me", 0.9, 0.7, vec!["family".to_string()]),
            Belief::new("The law protects everyone", 0.6, 0.4, vec!["order".to_string()]),
        ])
        .evaluator(Box::new(KeywordEvaluator::default()))
        .build()
}

/// Benchmark: one full interaction through the cascade pipeline.
fn bench_interaction(c: &mut Criterion) {
    let mut character = make_character();
    c.bench_function("interaction_single", |b| {
        b.iter(|| {
            let applied = character
                .apply_interaction(black_box("threat"), black_box(0.01))
                .expect("catalogued");
            black_box(applied);
        });
    });
}

/// Benchmark: trigger scan over a paragraph of text.
fn bench_trigger_scan(c: &mut Criterion) {
    let mut character = make_character();
    let text = "The grandfather clock struck nine while they spoke of the \
                harvest, the roads, the weather in the hills, and the long \
                dadaism exhibition that nobody had understood at all";
    c.bench_function("trigger_scan_long_text", |b| {
        b.iter(|| {
            character.advance_turn().expect("triggers enabled");
            let fired = character.process_text(black_box(text)).expect("triggers");
            black_box(fired);
        });
    });
}

/// Benchmark: a full conversation turn with the keyword evaluator.
fn bench_full_turn(c: &mut Criterion) {
    let mut character = make_character();
    c.bench_function("full_turn_keyword_eval", |b| {
        b.iter(|| {
            let report = character
                .process_turn(
                    black_box("A quiet market morning"),
                    black_box("They say the roads are guarded again"),
                )
                .expect("turn");
            black_box(report);
        });
    });
}

criterion_group!(benches, bench_interaction, bench_trigger_scan, bench_full_turn);
criterion_main!(benches);

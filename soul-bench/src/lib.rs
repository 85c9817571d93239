//! Benchmark-only crate; see `benches/soul_engine.rs`.

//! Shared test utilities
//!
//! - `TestNats`: NATS container with JetStream and automatic cleanup (feature: "nats")
//! - `TestDataBuilder`: deterministic job keys and resource names (always available)
//!
//! Add the feature to your dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["nats"] }
//! ```
//!
//! Container-backed tests need Docker and are marked `#[ignore]`; run them
//! with `cargo test -- --ignored`.

#[cfg(feature = "nats")]
mod nats;

#[cfg(feature = "nats")]
pub use nats::TestNats;

/// Builder for test data with deterministic values
///
/// Tests sharing one broker use it to avoid stream and consumer name clashes.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (seed = hash of the name)
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// A non-negative job key derived from the seed
    pub fn job_key(&self, offset: u32) -> i64 {
        let base = (self.seed >> 16) as i64 & 0x0000_7fff_ffff_0000;
        base + i64::from(offset)
    }

    /// A unique, subject-safe name: `test-<prefix>-<seed>-<suffix>`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// A unique stream name (JetStream stream names cannot contain dots)
    pub fn stream_name(&self, prefix: &str) -> String {
        format!("{}_{}", prefix.to_ascii_uppercase(), self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.job_key(1), builder2.job_key(1));
        assert_eq!(builder1.name("topic", "a"), builder2.name("topic", "a"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.name("topic", "a"), builder2.name("topic", "a"));
    }

    #[test]
    fn test_job_keys_are_non_negative() {
        let builder = TestDataBuilder::new(u64::MAX);
        assert!(builder.job_key(0) >= 0);
        assert!(builder.job_key(u32::MAX) >= 0);
    }
}

//! Emberfall Content — seed content loaded from YAML.
//!
//! Ships the equipment catalog and starting locations (with their loot
//! descriptors) used for world setup and for the loot stage's AI-failure
//! fallback.

pub mod seeds;

pub use seeds::{SeedContent, load_seed_content};

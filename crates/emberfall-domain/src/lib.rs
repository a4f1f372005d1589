//! Emberfall Domain — the data model shared by every stage.
//!
//! Characters, equipment, validated actions, outcome tiers, scenes, diary
//! records, and the immutable `NarrativeContext` snapshot built once per
//! round. Everything here is plain data plus invariant-preserving methods;
//! external calls and persistence live in other crates.

pub mod action;
pub mod character;
pub mod context;
pub mod diary;
pub mod equipment;
pub mod outcome;
pub mod scene;

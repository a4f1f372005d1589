//! Emberfall Core — shared engine abstractions.
//!
//! This crate defines the traits and error taxonomy every other crate
//! depends on. It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod rng;
pub mod store;

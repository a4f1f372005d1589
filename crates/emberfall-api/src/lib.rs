//! Emberfall API — HTTP surface over the turn queue.
//!
//! Exposes the round surface (submit actions, submit roll, close round),
//! character management, and the diary. All engine errors map to JSON
//! error bodies with stable machine-readable codes.

pub mod error;
pub mod routes;
pub mod state;

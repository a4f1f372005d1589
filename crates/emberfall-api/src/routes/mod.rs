//! Route modules.

pub mod character;
pub mod diary;
pub mod health;
pub mod round;

//! Turnstile Domain Types
//!
//! This crate defines the domain types for the Turnstile access-tiering
//! engine: cohort markers, inbound events, operation outcomes, form
//! submissions, and configuration.
//!
//! This is a pure types crate with no runtime dependencies. All types
//! implement `Clone`, `Debug`, `Serialize`, `Deserialize`. IDs use the
//! newtype pattern and implement `Display`.

#![deny(unsafe_code)]

mod cohort;
mod config;
mod event;
mod form;
mod ids;
mod outcome;

pub use cohort::*;
pub use config::*;
pub use event::*;
pub use form::*;
pub use ids::*;
pub use outcome::*;

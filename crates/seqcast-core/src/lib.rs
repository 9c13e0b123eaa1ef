//! # seqcast-core
//!
//! Core types, entry classification, and error handling for the Seqcast
//! sequential audio/podcast player.

pub mod classify;
pub mod error;
pub mod types;

pub use classify::{classify, looks_like_audio};
pub use error::{Error, HttpError, Result};
pub use types::*;

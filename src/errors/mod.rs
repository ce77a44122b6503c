//! # Error Handling
//!
//! Error handling for the secret mirror. Background refresh failures never leave
//! the poller; everything else surfaces as a [`MirrorError`].

pub mod types;

pub use types::{MirrorError, Result};

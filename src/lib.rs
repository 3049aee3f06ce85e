//! Tharsis CLI Library
//!
//! Command line client for the Tharsis API: option parsing, resource
//! identifier handling, validation, and the commands built on them.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::core::trn::{ResourceIdentifier, ResourceType};
pub use crate::domain::error::{ApiError, TharsisError, TharsisResult};
pub use crate::domain::settings::{Profile, Settings};

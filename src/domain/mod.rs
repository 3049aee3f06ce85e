// Domain module - Shared types, settings and errors
pub mod error;
pub mod model;
pub mod settings;

// Core module - Identifier handling, validation and upload sequencing
pub mod labels;
pub mod provider_upload;
pub mod trn;
pub mod validate;

use crate::domain::error::{TharsisError, TharsisResult};
use crate::domain::model::Label;
use std::collections::BTreeMap;

/// A single edit requested by `workspace label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOperation {
    /// `key=value`
    Set { key: String, value: String },
    /// `key-`
    Remove { key: String },
}

impl LabelOperation {
    pub fn key(&self) -> &str {
        match self {
            LabelOperation::Set { key, .. } | LabelOperation::Remove { key } => key,
        }
    }
}

/// Parse `key=value` and `key-` tokens.
///
/// Removals are rejected when `overwrite` is set since the label set is
/// rebuilt from scratch.
pub fn parse_label_operations(
    tokens: &[String],
    overwrite: bool,
) -> TharsisResult<Vec<LabelOperation>> {
    tokens
        .iter()
        .map(|token| parse_label_operation(token, overwrite))
        .collect()
}

fn parse_label_operation(token: &str, overwrite: bool) -> TharsisResult<LabelOperation> {
    if let Some((key, value)) = token.split_once('=') {
        if key.is_empty() {
            return Err(bad_label(token, "label key cannot be empty"));
        }
        if value.is_empty() {
            return Err(bad_label(token, "label value cannot be empty"));
        }
        return Ok(LabelOperation::Set {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    if let Some(key) = token.strip_suffix('-') {
        if overwrite {
            return Err(bad_label(token, "label removal cannot be combined with --overwrite"));
        }
        if key.is_empty() {
            return Err(bad_label(token, "label key cannot be empty"));
        }
        return Ok(LabelOperation::Remove {
            key: key.to_string(),
        });
    }

    Err(bad_label(token, "expected key=value or key-"))
}

/// Apply `operations` in order to `current` (or to nothing with `overwrite`).
///
/// The result is sorted by key.
pub fn apply_label_operations(
    current: &[Label],
    operations: &[LabelOperation],
    overwrite: bool,
) -> Vec<Label> {
    let mut labels: BTreeMap<String, String> = if overwrite {
        BTreeMap::new()
    } else {
        current
            .iter()
            .map(|label| (label.key.clone(), label.value.clone()))
            .collect()
    };

    for operation in operations {
        match operation {
            LabelOperation::Set { key, value } => {
                labels.insert(key.clone(), value.clone());
            }
            LabelOperation::Remove { key } => {
                labels.remove(key);
            }
        }
    }

    labels
        .into_iter()
        .map(|(key, value)| Label { key, value })
        .collect()
}

fn bad_label(token: &str, reason: &str) -> TharsisError {
    TharsisError::Argument(format!("invalid label '{}': {}", token, reason))
}

//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::CmsError;

/// Map domain/service errors to a string for CLI output. Validation errors
/// list one message per line.
pub fn map_error(e: &CmsError) -> String {
    match e {
        CmsError::Validation(v) => format!("Validation failed:\n  {}", v.messages.join("\n  ")),
        other => other.to_string(),
    }
}

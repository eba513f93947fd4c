pub mod auth;
pub mod entries;
pub mod tags;

use std::collections::HashMap;

use validator::ValidationErrors;

/// Flatten validator output into one message per field, as the forms show it.
pub(crate) fn field_errors(errors: &ValidationErrors) -> HashMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field.to_string(), message)
        })
        .collect()
}

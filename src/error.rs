use serde::{Deserialize, Serialize};

/// Every failure a public operation of this crate can report.
///
/// Parse failures (`MalformedPayload`, `SchemaMismatch`) are terminal for the result view,
/// while `CaptureUnavailable` and `SinkFailure` only abort the export that triggered them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ResumeError {
    /// The payload is not valid JSON, carries the message of the JSON parser.
    MalformedPayload(String),
    /// The payload is valid JSON but does not have the shape of a resume.
    SchemaMismatch {
        /// Path of the offending field, such as `experience[1].bullets[0]`.
        field: String,
        reason: String,
    },
    /// There is no surface with a drawable area to snapshot.
    CaptureUnavailable(String),
    /// The clipboard or the download sink rejected the write.
    SinkFailure(String),
    /// The configuration (or a resource it points to) could not be loaded.
    Configuration(String),
}

impl std::fmt::Display for ResumeError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResumeError::MalformedPayload(message) => {
                write!(formatter, "Malformed payload: {}", message)
            }
            ResumeError::SchemaMismatch { field, reason } => {
                write!(formatter, "Schema mismatch at `{}`: {}", field, reason)
            }
            ResumeError::CaptureUnavailable(message) => {
                write!(formatter, "Capture unavailable: {}", message)
            }
            ResumeError::SinkFailure(message) => write!(formatter, "Sink failure: {}", message),
            ResumeError::Configuration(message) => {
                write!(formatter, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for ResumeError {}

impl ResumeError {
    /// Create a new `SchemaMismatch` for the given field path.
    pub fn schema_mismatch<F: Into<String>, R: Into<String>>(field: F, reason: R) -> ResumeError {
        ResumeError::SchemaMismatch {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new `SinkFailure` with the given context and source error.
    pub fn sink<S: Into<String>>(context: S, error: &dyn std::error::Error) -> ResumeError {
        ResumeError::SinkFailure(with_source(context, error))
    }

    /// Create a new `CaptureUnavailable` with the given context and source error.
    pub fn capture<S: Into<String>>(context: S, error: &dyn std::error::Error) -> ResumeError {
        ResumeError::CaptureUnavailable(with_source(context, error))
    }

    /// Create a new `Configuration` error with the given context and source error.
    pub fn configuration<S: Into<String>>(
        context: S,
        error: &dyn std::error::Error,
    ) -> ResumeError {
        ResumeError::Configuration(with_source(context, error))
    }

    /// Whether the error leaves the result view without a resume to show.
    pub fn is_terminal_for_view(&self) -> bool {
        matches!(
            self,
            ResumeError::MalformedPayload(_) | ResumeError::SchemaMismatch { .. }
        )
    }
}

/// Joins a context sentence with the message of the error it wraps.
fn with_source<S: Into<String>>(context: S, error: &dyn std::error::Error) -> String {
    format!(
        "{}: {}",
        context.into(),
        minimize_first_letter(error.to_string())
    )
}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_message_is_appended_in_lowercase() {
        let error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let sink_error = ResumeError::sink("Failed to write the clipboard", &error);

        assert_eq!(
            sink_error,
            ResumeError::SinkFailure("Failed to write the clipboard: access denied".into())
        );
        assert_eq!(
            sink_error.to_string(),
            "Sink failure: Failed to write the clipboard: access denied"
        );
    }

    #[test]
    fn only_parse_failures_are_terminal_for_the_view() {
        assert!(ResumeError::MalformedPayload("eof".into()).is_terminal_for_view());
        assert!(ResumeError::schema_mismatch("name", "missing").is_terminal_for_view());
        assert!(!ResumeError::CaptureUnavailable("no surface".into()).is_terminal_for_view());
        assert!(!ResumeError::SinkFailure("denied".into()).is_terminal_for_view());
    }
}

use serde::{Deserialize, Serialize};

use crate::configuration::ExportConfiguration;
use crate::error::ResumeError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Formal,
    Confident,
    Creative,
}

/// The career profile the user fills in. Every field travels as a string.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub name: String,
    pub job_title: String,
    pub experience: String,
    pub skills: String,
    pub achievements: String,
    pub education: String,
    pub tone: Tone,
    pub email: String,
    pub phone: String,
}

/// The response envelope: the resume arrives as a JSON document serialized inside a string.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub resume: String,
}

impl GenerationResponse {
    /// Unwraps the envelope, returning the payload to hand to the parser.
    pub fn decode(response_body: &str) -> Result<String, ResumeError> {
        let value: serde_json::Value = serde_json::from_str(response_body)
            .map_err(|error| ResumeError::MalformedPayload(error.to_string()))?;

        match value.get("resume") {
            Some(serde_json::Value::String(resume)) => Ok(resume.clone()),
            Some(_) => Err(ResumeError::schema_mismatch("resume", "expected a string")),
            None => Err(ResumeError::schema_mismatch(
                "resume",
                "missing from the response",
            )),
        }
    }
}

/// The URL the profile form is posted to.
pub fn generate_endpoint(configuration: &ExportConfiguration) -> String {
    format!(
        "{}/api/generate",
        configuration.api_base_url.trim_end_matches('/')
    )
}

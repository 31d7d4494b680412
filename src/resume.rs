use serde::{Deserialize, Serialize};

/// A generated resume, exactly as the renderers and exporters consume it.
///
/// Values of this type only come out of the payload parser (or are built by hand in code), so
/// every field is always present: sequences may be empty but are never missing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Free-form text, line breaks are significant.
    pub summary: String,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceItem>,
    pub education: String,
    pub achievements: Vec<String>,
}

/// One position held, owned by the resume that lists it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceItem {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub duration: String,
    pub bullets: Vec<String>,
}

impl ExperienceItem {
    /// The single-line heading used by the plain-text export.
    pub fn heading(&self) -> String {
        format!(
            "{} at {}, {} ({})",
            self.job_title, self.company, self.location, self.duration
        )
    }

    /// The secondary line shown under the job title on screen.
    pub fn details(&self) -> String {
        format!("{}, {} | {}", self.company, self.location, self.duration)
    }
}

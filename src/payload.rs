use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ResumeError;
use crate::resume::{ExperienceItem, Resume};

/// How the parser treats a payload that is valid JSON but not shaped like a resume.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Reject with `SchemaMismatch`, naming the offending field.
    #[default]
    Strict,
    /// Substitute empty strings and empty sequences, logging every substitution.
    Lenient,
}

/// Turns raw payloads into resumes under a fixed validation policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadParser {
    policy: ValidationPolicy,
}

/// Parses a payload with the strict policy.
pub fn parse(raw_payload: &str) -> Result<Resume, ResumeError> {
    PayloadParser::default().parse(raw_payload)
}

impl PayloadParser {
    pub fn new(policy: ValidationPolicy) -> Self {
        PayloadParser { policy }
    }

    /// Decodes the payload and validates it field by field. Extra fields are ignored.
    pub fn parse(&self, raw_payload: &str) -> Result<Resume, ResumeError> {
        let value: Value = serde_json::from_str(raw_payload)
            .map_err(|error| ResumeError::MalformedPayload(error.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            ResumeError::schema_mismatch("$", format!("expected an object, found {}", kind(&value)))
        })?;

        let fields = Fields {
            object,
            path: String::new(),
            policy: self.policy,
        };
        fields.log_unknown_keys(RESUME_KEYS);

        let name = fields.string("name")?;
        if name.trim().is_empty() && self.policy == ValidationPolicy::Strict {
            return Err(ResumeError::schema_mismatch("name", "must not be empty"));
        }

        Ok(Resume {
            name,
            email: fields.string("email")?,
            phone: fields.string("phone")?,
            summary: fields.string("summary")?,
            skills: fields.strings("skills")?,
            experience: fields.sequence("experience", |item| {
                item.log_unknown_keys(EXPERIENCE_KEYS);
                Ok(ExperienceItem {
                    job_title: item.string("jobTitle")?,
                    company: item.string("company")?,
                    location: item.string("location")?,
                    duration: item.string("duration")?,
                    bullets: item.strings("bullets")?,
                })
            })?,
            education: fields.string("education")?,
            achievements: fields.strings("achievements")?,
        })
    }
}

const RESUME_KEYS: &[&str] = &[
    "name",
    "email",
    "phone",
    "summary",
    "skills",
    "experience",
    "education",
    "achievements",
];

const EXPERIENCE_KEYS: &[&str] = &["jobTitle", "company", "location", "duration", "bullets"];

/// A JSON object being validated, together with its path from the payload root.
struct Fields<'a> {
    object: &'a Map<String, Value>,
    path: String,
    policy: ValidationPolicy,
}

impl<'a> Fields<'a> {
    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn log_unknown_keys(&self, known_keys: &[&str]) {
        for key in self.object.keys() {
            if !known_keys.contains(&key.as_str()) {
                log::debug!("Ignoring unknown field {:?}", self.field_path(key));
            }
        }
    }

    /// Reports a shape problem: fails under the strict policy, logs under the lenient one.
    fn mismatch(&self, field: String, reason: String) -> Result<(), ResumeError> {
        match self.policy {
            ValidationPolicy::Strict => Err(ResumeError::SchemaMismatch { field, reason }),
            ValidationPolicy::Lenient => {
                log::warn!("Substituting a default for `{}`: {}", field, reason);
                Ok(())
            }
        }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|value| !value.is_null())
    }

    fn string(&self, key: &str) -> Result<String, ResumeError> {
        match self.present(key) {
            Some(Value::String(string)) => Ok(string.clone()),
            Some(other) => {
                self.mismatch(
                    self.field_path(key),
                    format!("expected a string, found {}", kind(other)),
                )?;
                Ok(String::new())
            }
            None => {
                self.mismatch(self.field_path(key), "missing string field".into())?;
                Ok(String::new())
            }
        }
    }

    fn strings(&self, key: &str) -> Result<Vec<String>, ResumeError> {
        let path = self.field_path(key);
        self.elements(key, |element, index| match element {
            Value::String(string) => Ok(Some(string.clone())),
            other => {
                self.mismatch(
                    format!("{}[{}]", path, index),
                    format!("expected a string, found {}", kind(other)),
                )?;
                Ok(None)
            }
        })
    }

    fn sequence<T>(
        &self,
        key: &str,
        mut item: impl FnMut(&Fields<'a>) -> Result<T, ResumeError>,
    ) -> Result<Vec<T>, ResumeError> {
        let path = self.field_path(key);
        self.elements(key, |element, index| {
            let element_path = format!("{}[{}]", path, index);
            match element {
                Value::Object(object) => {
                    let fields = Fields {
                        object,
                        path: element_path,
                        policy: self.policy,
                    };
                    item(&fields).map(Some)
                }
                other => {
                    self.mismatch(
                        element_path,
                        format!("expected an object, found {}", kind(other)),
                    )?;
                    Ok(None)
                }
            }
        })
    }

    /// Walks the array stored under `key`, keeping the elements the closure accepts.
    fn elements<T>(
        &self,
        key: &str,
        mut element: impl FnMut(&'a Value, usize) -> Result<Option<T>, ResumeError>,
    ) -> Result<Vec<T>, ResumeError> {
        let array = match self.present(key) {
            Some(Value::Array(array)) => array,
            Some(other) => {
                self.mismatch(
                    self.field_path(key),
                    format!("expected an array, found {}", kind(other)),
                )?;
                return Ok(Vec::new());
            }
            None => {
                self.mismatch(self.field_path(key), "missing array field".into())?;
                return Ok(Vec::new());
            }
        };

        let mut collected = Vec::with_capacity(array.len());
        for (index, value) in array.iter().enumerate() {
            if let Some(value) = element(value, index)? {
                collected.push(value);
            }
        }

        Ok(collected)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

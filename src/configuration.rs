use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ResumeError;
use crate::payload::ValidationPolicy;
use crate::raster::{BlockPainter, FontPainter, GlyphPainter};
use crate::snapshot::DEFAULT_CAPTURE_SCALE;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfiguration {
    /// Base URL of the generation service, without the `/api/generate` path.
    pub api_base_url: String,
    #[serde(default = "default_capture_scale")]
    pub capture_scale: f32,
    #[serde(default = "default_acknowledgment_millis")]
    pub acknowledgment_millis: u64,
    #[serde(default)]
    pub capture_timeout_millis: Option<u64>,
    #[serde(default)]
    pub validation_policy: ValidationPolicy,
    #[serde(default)]
    pub font_associations: Vec<FontAssociation>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FontAssociation {
    /// Either `regular` or `bold`.
    pub font_family: String,
    pub font_file_path: PathBuf,
}

fn default_capture_scale() -> f32 {
    DEFAULT_CAPTURE_SCALE
}

fn default_acknowledgment_millis() -> u64 {
    2000
}

impl Default for ExportConfiguration {
    fn default() -> Self {
        ExportConfiguration {
            api_base_url: "http://localhost:8000".into(),
            capture_scale: default_capture_scale(),
            acknowledgment_millis: default_acknowledgment_millis(),
            capture_timeout_millis: None,
            validation_policy: ValidationPolicy::default(),
            font_associations: Vec::new(),
        }
    }
}

impl ExportConfiguration {
    pub fn from_path(configuration_file_path: &Path) -> Result<Self, ResumeError> {
        let configuration_file_contents = std::fs::read_to_string(configuration_file_path)
            .map_err(|error| {
                ResumeError::configuration(
                    format!(
                        "Failed to read the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;

        ExportConfiguration::from_json(&configuration_file_contents)
    }

    pub fn from_json(configuration_json: &str) -> Result<Self, ResumeError> {
        let configuration: ExportConfiguration = serde_json::from_str(configuration_json)
            .map_err(|error| {
                ResumeError::configuration("Failed to parse the configuration file", &error)
            })?;
        if !(configuration.capture_scale.is_finite() && configuration.capture_scale > 0.0) {
            return Err(ResumeError::Configuration(format!(
                "The capture scale must be a positive number, found {}",
                configuration.capture_scale
            )));
        }

        Ok(configuration)
    }

    pub fn get_font_path(&self, font_family: &str) -> Option<&Path> {
        self.font_associations
            .iter()
            .find(|font_association| font_association.font_family == font_family)
            .map(|font_association| font_association.font_file_path.as_path())
    }

    pub fn acknowledgment_duration(&self) -> Duration {
        Duration::from_millis(self.acknowledgment_millis)
    }

    pub fn capture_timeout(&self) -> Option<Duration> {
        self.capture_timeout_millis.map(Duration::from_millis)
    }

    /// The painter for the configured fonts, or block glyphs when no regular font is set.
    pub fn glyph_painter(&self) -> Result<Arc<dyn GlyphPainter>, ResumeError> {
        match self.get_font_path("regular") {
            Some(regular) => {
                let painter = FontPainter::from_paths(regular, self.get_font_path("bold"))?;
                Ok(Arc::new(painter))
            }
            None => {
                log::warn!("No regular font is configured, text will be drawn as blocks");
                Ok(Arc::new(BlockPainter))
            }
        }
    }
}

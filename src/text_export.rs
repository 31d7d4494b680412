use std::time::{Duration, Instant};

use crate::error::ResumeError;
use crate::layout::SectionKind;
use crate::resume::Resume;

/// Renders the resume as the canonical plain-text block used for the clipboard.
///
/// The sections appear in the same fixed order as on screen, each separated by a blank line.
/// The output only depends on the resume, never on the locale or the clock.
pub fn to_plain_text(resume: &Resume) -> String {
    let mut sections = Vec::with_capacity(SectionKind::ORDER.len());
    for kind in SectionKind::ORDER {
        let body = match kind {
            SectionKind::Header => format!(
                "{}\nEmail: {} | Phone: {}",
                resume.name, resume.email, resume.phone
            ),
            SectionKind::Summary => resume.summary.clone(),
            SectionKind::Skills => resume.skills.join(", "),
            SectionKind::Experience => resume
                .experience
                .iter()
                .map(|item| {
                    let mut lines = vec![item.heading()];
                    lines.extend(item.bullets.iter().map(|bullet| format!("- {}", bullet)));
                    lines.join("\n")
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            SectionKind::Education => resume.education.clone(),
            SectionKind::Achievements => resume.achievements.join("\n"),
        };
        match kind.title() {
            Some(title) => sections.push(format!("{}\n{}", title, body)),
            None => sections.push(body),
        }
    }

    sections.join("\n\n").trim().to_string()
}

/// Destination of the plain-text export.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ResumeError>;
}

/// A clipboard that keeps the last written text in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub writes: usize,
}

impl ClipboardSink for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ResumeError> {
        self.contents = Some(text.to_string());
        self.writes += 1;
        Ok(())
    }
}

pub const COPY_ACKNOWLEDGMENT_MESSAGE: &str = "Copied to clipboard!";

/// The transient "copied" indicator. Arming it again while it is shown pushes its deadline
/// out instead of adding a second indicator.
#[derive(Debug, Clone)]
pub struct CopyAcknowledgment {
    duration: Duration,
    expires_at: Option<Instant>,
}

impl CopyAcknowledgment {
    pub fn new(duration: Duration) -> Self {
        CopyAcknowledgment {
            duration,
            expires_at: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.expires_at = Some(now + self.duration);
    }

    /// The message to show at `now`, if any.
    pub fn message(&self, now: Instant) -> Option<&'static str> {
        match self.expires_at {
            Some(expires_at) if now < expires_at => Some(COPY_ACKNOWLEDGMENT_MESSAGE),
            _ => None,
        }
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }
}

/// Writes the plain-text projection to a clipboard sink and acknowledges it.
#[derive(Debug, Clone)]
pub struct ClipboardExporter {
    acknowledgment: CopyAcknowledgment,
}

impl ClipboardExporter {
    pub fn new(acknowledgment_duration: Duration) -> Self {
        ClipboardExporter {
            acknowledgment: CopyAcknowledgment::new(acknowledgment_duration),
        }
    }

    pub fn copy(
        &mut self,
        resume: &Resume,
        sink: &mut dyn ClipboardSink,
        now: Instant,
    ) -> Result<(), ResumeError> {
        let text = to_plain_text(resume);
        sink.write_text(&text).map_err(|error| {
            log::error!("Unable to copy the resume to the clipboard: {}", error);
            error
        })?;
        log::debug!("Copied {} bytes to the clipboard", text.len());
        self.acknowledgment.arm(now);

        Ok(())
    }

    pub fn acknowledgment(&self) -> &CopyAcknowledgment {
        &self.acknowledgment
    }
}

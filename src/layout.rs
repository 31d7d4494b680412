use serde::Serialize;

use crate::resume::Resume;

/// The sections of a rendered resume. Their order is fixed and does not depend on the data.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    Summary,
    Skills,
    Experience,
    Education,
    Achievements,
}

impl SectionKind {
    /// Every section, in display order.
    pub const ORDER: [SectionKind; 6] = [
        SectionKind::Header,
        SectionKind::Summary,
        SectionKind::Skills,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Achievements,
    ];

    /// The heading shown above the section, the header has none.
    pub fn title(&self) -> Option<&'static str> {
        match self {
            SectionKind::Header => None,
            SectionKind::Summary => Some("Summary"),
            SectionKind::Skills => Some("Skills"),
            SectionKind::Experience => Some("Experience"),
            SectionKind::Education => Some("Education"),
            SectionKind::Achievements => Some("Achievements"),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum Block {
    /// The name at the top of the document.
    Title(String),
    Contact { email: String, phone: String },
    /// Text shown with its line breaks preserved.
    Paragraph(String),
    /// Short labels laid out as wrapping chips.
    Tags(Vec<String>),
    /// One experience item: job title, `company, location | duration`, then the bullets.
    Entry {
        title: String,
        details: String,
        bullets: Vec<String>,
    },
    List(Vec<String>),
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub blocks: Vec<Block>,
}

impl Section {
    /// Number of displayed items, used to check empty sections are kept rather than dropped.
    pub fn item_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Tags(items) | Block::List(items) => items.len(),
                _ => 1,
            })
            .sum()
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    CopyToClipboard,
    DownloadDocument,
    GenerateAnother,
    GoBack,
}

impl ControlKind {
    pub fn label(&self) -> &'static str {
        match self {
            ControlKind::CopyToClipboard => "Copy to Clipboard",
            ControlKind::DownloadDocument => "Download PDF",
            ControlKind::GenerateAnother => "Generate Another",
            ControlKind::GoBack => "Go Back",
        }
    }

    /// Primary controls are drawn in the accent color, secondary ones in grey.
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            ControlKind::CopyToClipboard | ControlKind::DownloadDocument
        )
    }
}

/// An interactive control shown next to the document but never part of an export.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub kind: ControlKind,
    pub visible: bool,
    pub enabled: bool,
}

impl Control {
    pub fn new(kind: ControlKind) -> Self {
        Control {
            kind,
            visible: true,
            enabled: true,
        }
    }
}

/// The structured on-screen layout of one resume.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct LayoutTree {
    pub sections: Vec<Section>,
    pub controls: Vec<Control>,
}

impl LayoutTree {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }
}

/// Which exporters are composed onto the rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportCapabilities {
    pub clipboard: bool,
    pub document: bool,
}

impl Default for ExportCapabilities {
    fn default() -> Self {
        ExportCapabilities {
            clipboard: true,
            document: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    capabilities: ExportCapabilities,
}

/// Renders a resume with every export capability enabled.
pub fn render(resume: &Resume) -> LayoutTree {
    Renderer::default().render(resume)
}

impl Renderer {
    pub fn with_capabilities(capabilities: ExportCapabilities) -> Self {
        Renderer { capabilities }
    }

    pub fn capabilities(&self) -> ExportCapabilities {
        self.capabilities
    }

    pub fn render(&self, resume: &Resume) -> LayoutTree {
        let sections = SectionKind::ORDER
            .iter()
            .map(|kind| Section {
                kind: *kind,
                blocks: section_blocks(*kind, resume),
            })
            .collect();

        let mut controls = Vec::new();
        if self.capabilities.clipboard {
            controls.push(Control::new(ControlKind::CopyToClipboard));
        }
        if self.capabilities.document {
            controls.push(Control::new(ControlKind::DownloadDocument));
        }
        controls.push(Control::new(ControlKind::GenerateAnother));

        LayoutTree { sections, controls }
    }
}

fn section_blocks(kind: SectionKind, resume: &Resume) -> Vec<Block> {
    match kind {
        SectionKind::Header => vec![
            Block::Title(resume.name.clone()),
            Block::Contact {
                email: resume.email.clone(),
                phone: resume.phone.clone(),
            },
        ],
        SectionKind::Summary => vec![Block::Paragraph(resume.summary.clone())],
        SectionKind::Skills => vec![Block::Tags(resume.skills.clone())],
        SectionKind::Experience => resume
            .experience
            .iter()
            .map(|item| Block::Entry {
                title: item.job_title.clone(),
                details: item.details(),
                bullets: item.bullets.clone(),
            })
            .collect(),
        SectionKind::Education => vec![Block::Paragraph(resume.education.clone())],
        SectionKind::Achievements => vec![Block::List(resume.achievements.clone())],
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::configuration::ExportConfiguration;
use crate::error::ResumeError;
use crate::layout::{Control, ControlKind, Renderer};
use crate::payload::PayloadParser;
use crate::raster::GlyphPainter;
use crate::resume::Resume;
use crate::snapshot::{DocumentExporter, DownloadSink, ExportOutcome, RenderedView};
use crate::text_export::{ClipboardExporter, ClipboardSink};

pub const NO_RESUME_MESSAGE: &str = "No resume data found.";
pub const LOADING_MESSAGE: &str = "Loading resume...";
pub const LOAD_FAILED_MESSAGE: &str = "Could not load resume.";

/// Anything able to turn the handed-over payload into a resume.
pub trait ResumeParser {
    fn parse(&self, raw_payload: &str) -> Result<Resume, ResumeError>;
}

impl ResumeParser for PayloadParser {
    fn parse(&self, raw_payload: &str) -> Result<Resume, ResumeError> {
        PayloadParser::parse(self, raw_payload)
    }
}

/// What the result page shows.
#[derive(Debug)]
pub enum ResultView {
    /// Nothing was handed over, only a way back is offered.
    NoResume { controls: Vec<Control> },
    /// A payload was handed over but not parsed yet.
    Loading { payload: String },
    /// The payload could not be turned into a resume.
    LoadFailed {
        error: ResumeError,
        controls: Vec<Control>,
    },
    Ready {
        resume: Resume,
        view: RenderedView,
    },
}

impl ResultView {
    /// The status line shown instead of a document, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ResultView::NoResume { .. } => Some(NO_RESUME_MESSAGE),
            ResultView::Loading { .. } => Some(LOADING_MESSAGE),
            ResultView::LoadFailed { .. } => Some(LOAD_FAILED_MESSAGE),
            ResultView::Ready { .. } => None,
        }
    }

    pub fn controls(&self) -> &[Control] {
        match self {
            ResultView::NoResume { controls } | ResultView::LoadFailed { controls, .. } => {
                controls
            }
            ResultView::Loading { .. } => &[],
            ResultView::Ready { view, .. } => &view.layout().controls,
        }
    }

    /// Why the payload could not be loaded, if it could not.
    pub fn error(&self) -> Option<&ResumeError> {
        match self {
            ResultView::LoadFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn resume(&self) -> Option<&Resume> {
        match self {
            ResultView::Ready { resume, .. } => Some(resume),
            _ => None,
        }
    }

    pub fn rendered_view(&self) -> Option<&RenderedView> {
        match self {
            ResultView::Ready { view, .. } => Some(view),
            _ => None,
        }
    }
}

/// One result-page session: the view state and the exporters composed onto it.
pub struct ResultPage<P: ResumeParser = PayloadParser> {
    view: ResultView,
    parser: P,
    renderer: Renderer,
    painter: Arc<dyn GlyphPainter>,
    clipboard: ClipboardExporter,
    document: DocumentExporter,
}

impl ResultPage<PayloadParser> {
    /// Opens the page with the parser, painter and exporters described by the configuration.
    pub fn from_configuration(
        handoff: Option<String>,
        configuration: &ExportConfiguration,
    ) -> Result<Self, ResumeError> {
        let mut page = ResultPage::new(
            handoff,
            PayloadParser::new(configuration.validation_policy),
            configuration.glyph_painter()?,
        )
        .with_clipboard_exporter(ClipboardExporter::new(
            configuration.acknowledgment_duration(),
        ))
        .with_document_exporter(DocumentExporter::new(
            configuration.capture_scale,
            configuration.capture_timeout(),
        ));
        page.load();

        Ok(page)
    }
}

impl<P: ResumeParser> ResultPage<P> {
    /// Creates the page without parsing anything yet.
    pub fn new(handoff: Option<String>, parser: P, painter: Arc<dyn GlyphPainter>) -> Self {
        let view = match handoff {
            Some(payload) => ResultView::Loading { payload },
            None => ResultView::NoResume {
                controls: vec![Control::new(ControlKind::GoBack)],
            },
        };

        ResultPage {
            view,
            parser,
            renderer: Renderer::default(),
            painter,
            clipboard: ClipboardExporter::new(Duration::from_millis(2000)),
            document: DocumentExporter::default(),
        }
    }

    /// Creates the page and parses the handed-over payload right away.
    pub fn open(handoff: Option<String>, parser: P, painter: Arc<dyn GlyphPainter>) -> Self {
        let mut page = ResultPage::new(handoff, parser, painter);
        page.load();
        page
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_clipboard_exporter(mut self, clipboard: ClipboardExporter) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_document_exporter(mut self, document: DocumentExporter) -> Self {
        self.document = document;
        self
    }

    /// Parses a pending payload. Any other state is left as it is.
    pub fn load(&mut self) {
        let ResultView::Loading { payload } = &self.view else {
            return;
        };

        self.view = match self.parser.parse(payload) {
            Ok(resume) => {
                log::info!("Loaded the resume of {:?}", resume.name);
                let layout = self.renderer.render(&resume);
                ResultView::Ready {
                    view: RenderedView::new(layout, Arc::clone(&self.painter)),
                    resume,
                }
            }
            Err(error) => {
                log::error!("Failed to load the resume payload: {}", error);
                ResultView::LoadFailed {
                    error,
                    controls: vec![Control::new(ControlKind::GoBack)],
                }
            }
        };
    }

    pub fn view(&self) -> &ResultView {
        &self.view
    }

    /// Copies the plain-text projection. `None` when there is no resume to copy or the
    /// clipboard export is not part of the page.
    pub fn copy_to_clipboard(
        &mut self,
        sink: &mut dyn ClipboardSink,
        now: Instant,
    ) -> Option<Result<(), ResumeError>> {
        if !self.renderer.capabilities().clipboard {
            return None;
        }
        let resume = self.view.resume()?;

        Some(self.clipboard.copy(resume, sink, now))
    }

    pub fn copy_acknowledgment(&self, now: Instant) -> Option<&'static str> {
        self.clipboard.acknowledgment().message(now)
    }

    /// Exports the rendered view as a PDF download. `None` when there is no resume to export
    /// or the document export is not part of the page.
    pub async fn export_document(
        &mut self,
        sink: &mut dyn DownloadSink,
    ) -> Option<Result<ExportOutcome, ResumeError>> {
        if !self.renderer.capabilities().document {
            return None;
        }
        let ResultView::Ready { resume, view } = &mut self.view else {
            return None;
        };

        Some(self.document.export(Some(view), resume, sink).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ExportCapabilities;
    use crate::raster::BlockPainter;
    use crate::text_export::MemoryClipboard;
    use std::cell::Cell;

    struct CountingParser {
        calls: Cell<usize>,
    }

    impl ResumeParser for CountingParser {
        fn parse(&self, raw_payload: &str) -> Result<Resume, ResumeError> {
            self.calls.set(self.calls.get() + 1);
            crate::payload::parse(raw_payload)
        }
    }

    const PAYLOAD: &str = r#"{
        "name": "Jane Doe", "email": "jane@x.com", "phone": "555-0100",
        "summary": "Engineer.", "skills": [], "experience": [],
        "education": "BS CS", "achievements": []
    }"#;

    #[test]
    fn missing_handoff_shows_the_no_resume_state_without_parsing() {
        let page = ResultPage::open(
            None,
            CountingParser {
                calls: Cell::new(0),
            },
            Arc::new(BlockPainter),
        );

        assert_eq!(page.view().message(), Some(NO_RESUME_MESSAGE));
        assert_eq!(page.view().controls(), &[Control::new(ControlKind::GoBack)]);
        assert_eq!(page.parser.calls.get(), 0);
    }

    #[test]
    fn pending_payloads_show_the_loading_state_until_loaded() {
        let mut page = ResultPage::new(
            Some(PAYLOAD.to_string()),
            PayloadParser::default(),
            Arc::new(BlockPainter),
        );
        assert_eq!(page.view().message(), Some(LOADING_MESSAGE));

        page.load();
        assert_eq!(page.view().message(), None);
        assert_eq!(page.view().resume().unwrap().name, "Jane Doe");
        assert!(page.view().error().is_none());
    }

    #[test]
    fn malformed_payloads_show_the_load_failed_state() {
        let page = ResultPage::open(
            Some("{not json".to_string()),
            PayloadParser::default(),
            Arc::new(BlockPainter),
        );

        assert_eq!(page.view().message(), Some(LOAD_FAILED_MESSAGE));
        assert!(matches!(
            page.view(),
            ResultView::LoadFailed {
                error: ResumeError::MalformedPayload(_),
                ..
            }
        ));
        assert!(page.view().rendered_view().is_none());
        assert!(matches!(
            page.view().error(),
            Some(ResumeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn exports_are_unavailable_without_a_resume() {
        let mut page = ResultPage::open(None, PayloadParser::default(), Arc::new(BlockPainter));
        let mut clipboard = MemoryClipboard::default();

        assert!(page.copy_to_clipboard(&mut clipboard, Instant::now()).is_none());
        assert_eq!(clipboard.writes, 0);
    }

    #[test]
    fn clipboard_export_follows_the_renderer_capabilities() {
        let mut page = ResultPage::new(
            Some(PAYLOAD.to_string()),
            PayloadParser::default(),
            Arc::new(BlockPainter),
        )
        .with_renderer(Renderer::with_capabilities(ExportCapabilities {
            clipboard: false,
            document: true,
        }));
        page.load();
        let mut clipboard = MemoryClipboard::default();

        assert!(page.copy_to_clipboard(&mut clipboard, Instant::now()).is_none());
        assert!(!page
            .view()
            .controls()
            .iter()
            .any(|control| control.kind == ControlKind::CopyToClipboard));
    }
}

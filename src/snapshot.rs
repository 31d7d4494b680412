use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use time::OffsetDateTime;

use crate::error::ResumeError;
use crate::layout::{Control, ControlKind, LayoutTree};
use crate::pdf::{self, PdfMetadata};
use crate::raster::{self, GlyphPainter};
use crate::resume::Resume;
use crate::text_export::to_plain_text;

/// Upscaling applied to the rendered view when it is captured.
pub const DEFAULT_CAPTURE_SCALE: f32 = 2.0;

/// A rendered, on-screen document that can be rasterized.
#[async_trait]
pub trait VisualSurface: Send + Sync {
    /// Logical size of the surface, before any upscaling.
    fn dimensions(&self) -> (u32, u32);
    fn controls_mut(&mut self) -> &mut [Control];
    /// Rasterizes the surface as it currently looks, upscaled by `scale`.
    async fn capture(&self, scale: f32) -> Result<RgbaImage, ResumeError>;
}

/// The layout tree of a resume together with the painter that draws its text.
#[derive(Clone)]
pub struct RenderedView {
    layout: LayoutTree,
    painter: Arc<dyn GlyphPainter>,
}

impl RenderedView {
    pub fn new(layout: LayoutTree, painter: Arc<dyn GlyphPainter>) -> Self {
        RenderedView { layout, painter }
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.layout
    }
}

impl std::fmt::Debug for RenderedView {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RenderedView")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VisualSurface for RenderedView {
    fn dimensions(&self) -> (u32, u32) {
        let plan = raster::plan(&self.layout, self.painter.as_ref(), 1.0);
        (plan.width.ceil() as u32, plan.height.ceil() as u32)
    }

    fn controls_mut(&mut self) -> &mut [Control] {
        &mut self.layout.controls
    }

    async fn capture(&self, scale: f32) -> Result<RgbaImage, ResumeError> {
        let layout = self.layout.clone();
        let painter = Arc::clone(&self.painter);
        tokio::task::spawn_blocking(move || {
            let plan = raster::plan(&layout, painter.as_ref(), scale);
            raster::rasterize(&plan, painter.as_ref())
        })
        .await
        .map_err(|error| ResumeError::capture("The rasterization task failed", &error))
    }
}

/// Hides every control of a surface for as long as it lives, and disables the download
/// control. Dropping it restores each control exactly as it was.
pub struct HiddenControls<'a, S: VisualSurface + ?Sized> {
    surface: &'a mut S,
    saved: Vec<Control>,
}

impl<'a, S: VisualSurface + ?Sized> HiddenControls<'a, S> {
    pub fn hide(surface: &'a mut S) -> Self {
        let saved = surface.controls_mut().to_vec();
        for control in surface.controls_mut() {
            control.visible = false;
            if control.kind == ControlKind::DownloadDocument {
                control.enabled = false;
            }
        }
        HiddenControls { surface, saved }
    }
}

impl<S: VisualSurface + ?Sized> Deref for HiddenControls<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.surface
    }
}

impl<S: VisualSurface + ?Sized> DerefMut for HiddenControls<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.surface
    }
}

impl<S: VisualSurface + ?Sized> Drop for HiddenControls<'_, S> {
    fn drop(&mut self) {
        for (control, saved) in self.surface.controls_mut().iter_mut().zip(&self.saved) {
            *control = *saved;
        }
    }
}

/// A generated file ready to be handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDownload {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Page size in points, equal to the captured pixel dimensions.
    pub page_size: (u32, u32),
}

/// Destination of the exported documents.
pub trait DownloadSink {
    fn save(&mut self, download: &FileDownload) -> Result<(), ResumeError>;
}

/// Saves downloads as files inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    pub directory: PathBuf,
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, download: &FileDownload) -> Result<(), ResumeError> {
        let file_path = self.directory.join(&download.filename);
        std::fs::write(&file_path, &download.bytes).map_err(|error| {
            ResumeError::sink(format!("Unable to save the document {:?}", file_path), &error)
        })?;
        log::info!("Saved {} bytes to {:?}", download.bytes.len(), file_path);

        Ok(())
    }
}

/// Keeps every download in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryDownloads {
    pub downloads: Vec<FileDownload>,
}

impl DownloadSink for MemoryDownloads {
    fn save(&mut self, download: &FileDownload) -> Result<(), ResumeError> {
        self.downloads.push(download.clone());
        Ok(())
    }
}

/// The name under which a resume's document is downloaded, e.g. `Jane_Doe_Resume.pdf`.
pub fn document_filename(name: &str) -> String {
    let stem = name
        .split_whitespace()
        .map(|word| {
            word.chars()
                .map(|character| match character {
                    '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                    character => character,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_");

    if stem.is_empty() {
        "Resume.pdf".to_string()
    } else {
        format!("{}_Resume.pdf", stem)
    }
}

/// A 32 characters-long identifier: the MD5 digest of the resume's plain text, in hexadecimal.
fn document_identifier(resume: &Resume) -> String {
    format!("{:x}", md5::compute(to_plain_text(resume)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Downloaded(FileDownload),
    /// Another export was still running, nothing was done.
    AlreadyInFlight,
}

/// Clears the in-flight flag when the export settles, whichever way it settles.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Captures a rendered view and packages it as a single-page PDF download.
#[derive(Debug)]
pub struct DocumentExporter {
    scale: f32,
    timeout: Option<Duration>,
    in_flight: AtomicBool,
}

impl Default for DocumentExporter {
    fn default() -> Self {
        DocumentExporter::new(DEFAULT_CAPTURE_SCALE, None)
    }
}

impl DocumentExporter {
    pub fn new(scale: f32, timeout: Option<Duration>) -> Self {
        DocumentExporter {
            scale,
            timeout,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn export<S: VisualSurface + ?Sized>(
        &self,
        surface: Option<&mut S>,
        resume: &Resume,
        sink: &mut dyn DownloadSink,
    ) -> Result<ExportOutcome, ResumeError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            log::warn!("Ignoring a document export while another one is in flight");
            return Ok(ExportOutcome::AlreadyInFlight);
        }
        let _in_flight = InFlight(&self.in_flight);

        let surface = surface.ok_or_else(|| {
            ResumeError::CaptureUnavailable("There is no rendered view to capture".into())
        })?;
        let raster = {
            let hidden = HiddenControls::hide(surface);
            self.capture(&*hidden).await?
        };

        let filename = document_filename(&resume.name);
        let metadata = PdfMetadata {
            title: resume.name.clone(),
            creation_date: OffsetDateTime::now_utc(),
        };
        let bytes = pdf::raster_to_pdf(&raster, document_identifier(resume), metadata)?;
        let download = FileDownload {
            filename,
            bytes,
            page_size: raster.dimensions(),
        };
        sink.save(&download).map_err(|error| {
            log::error!("Unable to save {:?}: {}", download.filename, error);
            error
        })?;
        log::info!(
            "Exported {:?} ({}x{} pixels)",
            download.filename,
            download.page_size.0,
            download.page_size.1
        );

        Ok(ExportOutcome::Downloaded(download))
    }

    async fn capture<S: VisualSurface + ?Sized>(
        &self,
        surface: &S,
    ) -> Result<RgbaImage, ResumeError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(ResumeError::CaptureUnavailable(format!(
                "The rendered view has no area ({}x{})",
                width, height
            )));
        }

        let raster = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, surface.capture(self.scale))
                .await
                .map_err(|_| {
                    ResumeError::CaptureUnavailable(format!(
                        "The capture did not finish within {:?}",
                        timeout
                    ))
                })??,
            None => surface.capture(self.scale).await?,
        };
        if raster.width() == 0 || raster.height() == 0 {
            return Err(ResumeError::CaptureUnavailable(
                "The capture produced an empty raster".into(),
            ));
        }

        Ok(raster)
    }
}

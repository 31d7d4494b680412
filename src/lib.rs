//! Vitae turns the JSON payload returned by a resume generation service into the three
//! projections a user takes away from it: an on-screen layout, a plain-text rendition meant
//! for the clipboard and a single-page PDF snapshot of the rendered layout.
//!
//! Every projection is derived from the same `Resume` value, which is only ever produced by
//! the payload parser. The entry point for an application is the `ResultPage` struct in the
//! `view` module, which owns one resume for the lifetime of a result view and composes the
//! exporters onto it.

/// This module contains the `ResumeError` type which is the error type used throughout this library.
///
/// Errors carry a human-readable explanation of what went wrong, and when they originate from a
/// third-party crate the explanation of the underlying error is appended to the context.
pub mod error;

/// The resume schema, shared by every renderer and exporter.
pub mod resume;

/// The module where raw payloads are parsed and validated into a `Resume`.
///
/// # Validation policies
///
/// Malformed JSON is always rejected. A payload that is valid JSON but does not have the shape of
/// a resume is either rejected, naming the offending field with its full path (the strict policy,
/// which is the default), or repaired by substituting empty values (the lenient policy).
pub mod payload;

/// The screen layout: six sections in a fixed order followed by the export controls.
pub mod layout;

/// The state machine of the result page, from the handed-over payload to the rendered resume.
pub mod view;

/// The plain-text projection, the clipboard sink it is written to and the acknowledgment shown
/// after a successful copy.
pub mod text_export;

/// The module where a layout is drawn into an RGBA raster.
///
/// Text is drawn either with the configured TrueType fonts or, when none are configured,
/// with solid blocks of the same advance, so that the geometry of the page never depends on the
/// fonts being available.
pub mod raster;

/// The module were the `PdfDocument` interface for working with PDF documents is presented.
///
/// # Disclaimer
///
/// This work was partially adapted from the one of [fschutt](https://github.com/fschutt) for the crate [printpdf](https://github.com/fschutt/printpdf).
/// Documents are assembled without any random parameter, so that the same raster and the
/// same metadata always produce the same bytes.
pub mod pdf;

/// The document snapshot export: the controls are hidden, the view is captured at twice its
/// size and the capture is packaged as a PDF download named after the resume.
pub mod snapshot;

/// The configuration of the exporters and of the generation service endpoint.
pub mod configuration;

/// The request and response shapes exchanged with the generation service. The transport itself
/// is left to the caller: this module only shapes the request and unwraps the response.
pub mod generation;

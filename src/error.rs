//! Error types for the cv-export library.
//!
//! Every failure of an export run is fatal: the pipeline has no partial
//! output to salvage, so all stages report through a single
//! [`ExportError`]. Remediation stages (image paths, placeholder avatar,
//! style probe, debug screenshots) never produce one; they log a warning
//! and let the run continue.
//!
//! Failures while releasing browser resources are not represented here at
//! all. Teardown logs them and carries on so the error that actually ended
//! the run is the one the caller sees.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the cv-export library.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The built site entry page does not exist.
    ///
    /// `entries` lists what the containing directory does hold (empty when
    /// the directory itself is missing) so the operator can see whether the
    /// site build ran at all.
    #[error("Main page not found at: '{path}'\nRun the site build first. {}", describe_entries(entries))]
    MissingInput { path: PathBuf, entries: Vec<String> },

    /// The entry page exists but could not be read.
    #[error("Failed to read main page '{path}': {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The entry page is implausibly small to be a rendered site.
    #[error("Main page '{path}' appears to be empty or corrupted ({chars} characters)\nContent preview: {preview}")]
    CorruptInput {
        path: PathBuf,
        chars: usize,
        preview: String,
    },

    // ── Browser errors ────────────────────────────────────────────────────
    /// Browser process, browsing context, or page could not be created.
    #[error("Failed to acquire {resource}: {detail}")]
    ResourceAcquisition {
        resource: &'static str,
        detail: String,
    },

    /// Navigation failed or produced no response.
    #[error("Failed to load page '{url}': {detail}")]
    NavigationFailed { url: String, detail: String },

    /// A script evaluation, screenshot, or print call failed on a gating stage.
    #[error("Browser {operation} failed: {detail}")]
    Browser {
        operation: &'static str,
        detail: String,
    },

    /// The rendered page has no visible text.
    #[error("Page body is empty\nHTML content preview: {excerpt}")]
    RenderedEmpty { excerpt: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory or write the PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The written PDF is below the minimum plausible size.
    #[error("Generated PDF '{path}' is too small ({bytes} bytes, expected at least {min}), likely corrupted")]
    OutputTooSmall { path: PathBuf, bytes: u64, min: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_entries(entries: &[String]) -> String {
    if entries.is_empty() {
        "The directory is empty or missing.".to_string()
    } else {
        format!("Directory contents: {}", entries.join(", "))
    }
}

impl ExportError {
    /// Short, stable name of the failure kind.
    ///
    /// Printed by the CLI next to the message so scripts grepping CI logs
    /// do not depend on message wording.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::MissingInput { .. } => "missing-input",
            ExportError::InputRead { .. } => "input-read",
            ExportError::CorruptInput { .. } => "corrupt-input",
            ExportError::ResourceAcquisition { .. } => "resource-acquisition",
            ExportError::NavigationFailed { .. } => "navigation-failed",
            ExportError::Browser { .. } => "browser",
            ExportError::RenderedEmpty { .. } => "rendered-empty",
            ExportError::OutputWriteFailed { .. } => "output-write",
            ExportError::OutputTooSmall { .. } => "output-too-small",
            ExportError::InvalidConfig(_) => "invalid-config",
            ExportError::Internal(_) => "internal",
        }
    }

    pub(crate) fn browser(operation: &'static str, detail: impl std::fmt::Display) -> Self {
        ExportError::Browser {
            operation,
            detail: detail.to_string(),
        }
    }
}

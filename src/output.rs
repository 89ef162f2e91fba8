//! Result types returned by a successful export.

use crate::pipeline::probe::{ProfileImageStatus, StylesheetStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of a completed export.
///
/// Everything here was also logged as the run progressed; the report exists
/// so callers (and `cv2pdf --json`) can act on it without scraping logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// Size of the PDF on disk.
    pub pdf_bytes: u64,
    /// Character count of the entry page.
    pub input_chars: usize,
    /// `document.title` of the rendered page.
    pub title: String,
    /// Character count of the rendered body text.
    pub body_chars: usize,
    pub images_inspected: usize,
    pub images_rewritten: usize,
    pub profile_image: ProfileImageStatus,
    /// Whether site CSS applied before print styles were injected.
    pub styles_detected: Option<bool>,
    /// Stylesheet links found when site CSS did not apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stylesheets: Vec<StylesheetStatus>,
    pub debug_screenshots: Vec<PathBuf>,
    /// Problems worked around by best-effort stages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

//! Debug snapshots of the page as the browser sees it.
//!
//! Two full-page PNGs are written: one straight after the print styles are
//! injected, one after the style settle delay. Comparing them shows whether
//! late-loading fonts or images shifted the layout. Nothing here can fail
//! the run; each snapshot is attempted independently.

use crate::browser::PageHandle;
use crate::error::ExportError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Snapshot paths that were written and problems with those that were not.
#[derive(Debug, Default)]
pub struct CaptureReport {
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

fn snapshot(page: &dyn PageHandle, path: &Path) -> Result<usize, ExportError> {
    let png = page.screenshot_full_page()?;
    std::fs::write(path, &png).map_err(|source| ExportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(png.len())
}

/// Take the before/after snapshots, sleeping `settle` in between.
pub fn capture(
    page: &dyn PageHandle,
    before: &Path,
    styled: &Path,
    settle: Duration,
) -> CaptureReport {
    let mut report = CaptureReport::default();

    let take = |path: &Path, report: &mut CaptureReport| match snapshot(page, path) {
        Ok(bytes) => {
            info!("Debug screenshot saved: {} ({bytes} bytes)", path.display());
            report.written.push(path.to_path_buf());
        }
        Err(e) => {
            warn!("Debug screenshot {} skipped: {e}", path.display());
            report.warnings.push(e.to_string());
        }
    };

    take(before, &mut report);
    if !settle.is_zero() {
        std::thread::sleep(settle);
    }
    take(styled, &mut report);

    report
}

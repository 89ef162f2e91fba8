//! # cv-export
//!
//! Render a statically built résumé site to a print-ready A4 PDF with a
//! headless Chromium.
//!
//! ## Why a browser?
//!
//! The site's look (grid layout, web fonts, accent colours) only exists once
//! a browser has applied its CSS. Printing from the browser keeps the PDF
//! identical to what visitors see, minus the on-screen chrome removed by an
//! injected print stylesheet.
//!
//! ## Pipeline Overview
//!
//! ```text
//! _site/index.html
//!  │
//!  ├─  1. Preflight      entry page exists (else list its directory)
//!  ├─  2. Content check  at least 100 characters
//!  ├─  3. Acquire        browser → context → page (1200×800)
//!  ├─  4. Load           file:// navigation, 60 s timeout
//!  ├─  5. Assets         rebase /assets/images/ sources      (best-effort)
//!  ├─  6. Avatar         placeholder for a broken picture    (best-effort)
//!  ├─  7. Style probe    did site CSS apply?                 (diagnostic)
//!  ├─  8. Print styles   inject the print stylesheet
//!  ├─  9. Debug capture  two full-page PNGs                  (best-effort)
//!  ├─ 10. Body check     rendered text is non-empty
//!  ├─ 11. Export         A4, 0.4in margins, scale 0.75
//!  ├─ 12. Persist        write + size check (≥ 1000 bytes)
//!  └─ 13. Teardown       page, context, browser; always runs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cv_export::{export, ExportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExportConfig::default();
//!     let report = export(&config).await?;
//!     eprintln!("{} bytes, profile image: {:?}", report.pdf_bytes, report.profile_image);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cv2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `fetch` | off     | Let headless_chrome download a Chromium build when none is installed |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cv-export = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod browser;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use browser::{BrowserLauncher, ChromeLauncher};
pub use config::{
    BrowserSettings, ExportConfig, ExportConfigBuilder, PaperSize, PdfLayout, PlaceholderStyle,
    Viewport, DEFAULT_PRINT_STYLESHEET,
};
pub use error::ExportError;
pub use export::{export, export_sync, export_with, run_pipeline};
pub use output::ExportReport;
pub use pipeline::probe::{ProfileImageStatus, StylesheetStatus};
pub use pipeline::Stage;
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback};

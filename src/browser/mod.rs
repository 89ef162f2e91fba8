//! Browser driver seam.
//!
//! The pipeline talks to the browser only through the four traits here, in
//! the same nesting Chromium uses: a launched **browser** process owns
//! isolated **contexts**, which own **pages**. Each level is released
//! explicitly with `close`, innermost first, so teardown order is visible in
//! [`crate::export`] instead of hidden in `Drop` impls.
//!
//! [`chrome`] is the production driver. Tests drive the pipeline with a
//! scripted fake that answers [`Script`]s by their [`ScriptKind`].

pub mod chrome;

use crate::config::{BrowserSettings, PdfLayout, Viewport};
use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use chrome::ChromeLauncher;

/// Starts browser processes.
pub trait BrowserLauncher: Send + Sync {
    /// Launch an isolated browser whose window matches `viewport`.
    fn launch(
        &self,
        settings: &BrowserSettings,
        viewport: &Viewport,
    ) -> Result<Box<dyn BrowserHandle>, ExportError>;
}

/// A running browser process.
pub trait BrowserHandle {
    /// Create an isolated browsing context (no shared cookies or cache).
    fn new_context(&self) -> Result<Box<dyn ContextHandle>, ExportError>;

    /// Terminate the process.
    fn close(self: Box<Self>) -> Result<(), ExportError>;
}

/// An isolated browsing context.
pub trait ContextHandle {
    fn new_page(&self) -> Result<Box<dyn PageHandle>, ExportError>;

    fn close(self: Box<Self>) -> Result<(), ExportError>;
}

/// A single page (tab).
pub trait PageHandle {
    /// Navigate and wait for the load to settle or `timeout` to elapse.
    ///
    /// `Ok(None)` means the browser reported no document for the
    /// navigation; the pipeline treats that as a load failure.
    fn navigate(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<NavigationResponse>, ExportError>;

    /// Run a script in the page and return its JSON result.
    fn evaluate(&self, script: &Script) -> Result<serde_json::Value, ExportError>;

    /// PNG of the whole scrollable page.
    fn screenshot_full_page(&self) -> Result<Vec<u8>, ExportError>;

    fn print_to_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>, ExportError>;

    fn close(self: Box<Self>) -> Result<(), ExportError>;
}

/// What a successful navigation reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationResponse {
    /// Final document URL.
    pub url: String,
    /// `document.readyState` once navigation returned.
    pub ready_state: String,
}

/// Identifies what a [`Script`] does, independent of its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    ImageSources,
    RewriteImages,
    AvatarProbe,
    ReplaceAvatar,
    StyleProbe,
    ListStylesheets,
    InjectStyles,
    BodyText,
    HtmlExcerpt,
}

/// A script evaluated in the page.
///
/// `source` is the body of a function; its `return` value must be
/// JSON-serialisable. Drivers wrap it as
/// `JSON.stringify((() => { <source> })())` so complex values survive the
/// DevTools round trip intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    kind: ScriptKind,
    source: String,
}

impl Script {
    pub fn new(kind: ScriptKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The self-invoking, JSON-returning expression drivers evaluate.
    pub fn expression(&self) -> String {
        format!("JSON.stringify((() => {{\n{}\n}})() ?? null)", self.source)
    }
}

/// Print parameters handed to the driver, all lengths in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub scale: f64,
    pub landscape: bool,
    pub print_background: bool,
    pub display_header_footer: bool,
    pub prefer_css_page_size: bool,
}

impl From<&PdfLayout> for PdfOptions {
    fn from(layout: &PdfLayout) -> Self {
        let (paper_width, paper_height) = layout.paper.dimensions_inches();
        let m = layout.margin_inches;
        Self {
            paper_width,
            paper_height,
            margin_top: m,
            margin_right: m,
            margin_bottom: m,
            margin_left: m,
            scale: layout.scale,
            landscape: false,
            print_background: layout.print_background,
            display_header_footer: layout.display_header_footer,
            prefer_css_page_size: layout.prefer_css_page_size,
        }
    }
}

/// Serialise a Rust string as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaperSize;

    #[test]
    fn expression_wraps_source_in_json_stringify() {
        let script = Script::new(ScriptKind::BodyText, "return 1;");
        let expr = script.expression();
        assert!(expr.starts_with("JSON.stringify((() => {"));
        assert!(expr.contains("return 1;"));
        assert_eq!(script.kind(), ScriptKind::BodyText);
    }

    #[test]
    fn pdf_options_from_default_layout() {
        let opts = PdfOptions::from(&PdfLayout::default());
        assert_eq!(opts.paper_width, 8.27);
        assert_eq!(opts.paper_height, 11.69);
        assert_eq!(opts.margin_top, 0.4);
        assert_eq!(opts.margin_left, 0.4);
        assert_eq!(opts.scale, 0.75);
        assert!(opts.print_background);
        assert!(!opts.display_header_footer);
        assert!(!opts.landscape);
    }

    #[test]
    fn pdf_options_letter() {
        let layout = PdfLayout {
            paper: PaperSize::Letter,
            ..PdfLayout::default()
        };
        let opts = PdfOptions::from(&layout);
        assert_eq!((opts.paper_width, opts.paper_height), (8.5, 11.0));
    }

    #[test]
    fn js_string_escapes_quotes_and_newlines() {
        assert_eq!(js_string("a\"b\nc"), r#""a\"b\nc""#);
    }
}

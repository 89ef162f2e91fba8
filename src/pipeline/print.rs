//! Body check and PDF rendering.

use crate::browser::{PageHandle, PdfOptions, Script, ScriptKind};
use crate::config::PdfLayout;
use crate::error::ExportError;
use crate::pipeline::input::preview;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Characters of raw HTML shown when the body turns out empty.
const EXCERPT_CHARS: usize = 500;

/// Text of the rendered page body.
///
/// `textContent`, not `innerText`: elements the print stylesheet hides
/// still count as content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BodyContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl BodyContent {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

const BODY_TEXT_SCRIPT: &str = r#"
return {
  title: document.title || '',
  text: document.body ? document.body.textContent || '' : ''
};
"#;

const HTML_EXCERPT_SCRIPT: &str = r#"
return document.documentElement ? document.documentElement.outerHTML : '';
"#;

/// Fail with [`ExportError::RenderedEmpty`] when the body has no text.
pub fn check_body(page: &dyn PageHandle) -> Result<BodyContent, ExportError> {
    let value = page.evaluate(&Script::new(ScriptKind::BodyText, BODY_TEXT_SCRIPT))?;
    let body: BodyContent =
        serde_json::from_value(value).map_err(|e| ExportError::browser("body text", e))?;
    info!("Page title: {}", body.title);
    debug!("Body text length: {}", body.text.chars().count());

    if body.is_blank() {
        let html = page
            .evaluate(&Script::new(ScriptKind::HtmlExcerpt, HTML_EXCERPT_SCRIPT))?
            .as_str()
            .unwrap_or_default()
            .to_string();
        let excerpt = preview(&html, EXCERPT_CHARS);
        warn!("Page body is empty. HTML content: {excerpt}");
        return Err(ExportError::RenderedEmpty { excerpt });
    }

    Ok(body)
}

/// Print the page with `layout`.
pub fn render_pdf(page: &dyn PageHandle, layout: &PdfLayout) -> Result<Vec<u8>, ExportError> {
    let options = PdfOptions::from(layout);
    debug!(
        "Printing {:?} at scale {} with {}in margins",
        layout.paper, options.scale, layout.margin_inches
    );
    let pdf = page.print_to_pdf(&options)?;
    info!("PDF rendered ({} bytes)", pdf.len());
    Ok(pdf)
}
